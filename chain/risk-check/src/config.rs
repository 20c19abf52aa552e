//! Program configuration
//!
//! Loaded from JSON; every field has a default so a partial file (or `{}`)
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use types::ids::Address;

use crate::errors::ConfigError;

/// Default program id (hex of the 32-byte address).
pub const DEFAULT_PROGRAM_ID: Address = Address::new([
    0x77, 0x6f, 0x0e, 0x30, 0x9a, 0x3e, 0x12, 0x55, 0x4b, 0x0c, 0x1d, 0x8f, 0x6a, 0x21, 0x93, 0x47,
    0xe2, 0x5d, 0x0b, 0x64, 0xc8, 0x1f, 0x7a, 0x39, 0x50, 0xd6, 0x2e, 0x84, 0x1b, 0xa7, 0x3c, 0x92,
]);

/// Account overhead charged on top of the data length.
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Storage reserve parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentConfig {
    pub lamports_per_byte_year: u64,
    pub exemption_threshold_years: u64,
}

impl Default for RentConfig {
    fn default() -> Self {
        Self {
            lamports_per_byte_year: 3_480,
            exemption_threshold_years: 2,
        }
    }
}

impl RentConfig {
    /// Reserve required to keep `data_len` bytes alive indefinitely.
    pub fn minimum_balance(&self, data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD + data_len as u64)
            .saturating_mul(self.lamports_per_byte_year)
            .saturating_mul(self.exemption_threshold_years)
    }
}

/// Risk-check program configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Program id mixed into every derived record address
    pub program_id: Address,
    pub rent: RentConfig,
    /// Orders cancelled per venue call during remediation
    pub cancel_limit: u8,
    /// Reject batches where anything follows `check_risk`
    pub require_check_risk_last: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            rent: RentConfig::default(),
            cancel_limit: 20,
            require_check_risk_last: false,
        }
    }
}

impl ProgramConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cancel_limit == 0 {
            return Err(ConfigError::Invalid {
                reason: "cancel_limit must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ProgramConfig::default();
        assert_eq!(config.cancel_limit, 20);
        assert!(!config.require_check_risk_last);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimum_balance() {
        let rent = RentConfig::default();
        assert_eq!(rent.minimum_balance(0), 128 * 3_480 * 2);
        assert_eq!(rent.minimum_balance(59), 187 * 3_480 * 2);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ProgramConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ProgramConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let json = format!(
            r#"{{"program_id": "{}", "require_check_risk_last": true, "rent": {{"lamports_per_byte_year": 1}}}}"#,
            "11".repeat(32)
        );
        let config = ProgramConfig::from_json_str(&json).unwrap();
        assert_eq!(config.program_id, Address::new([0x11; 32]));
        assert!(config.require_check_risk_last);
        assert_eq!(config.rent.lamports_per_byte_year, 1);
        assert_eq!(config.rent.exemption_threshold_years, 2);
        assert_eq!(config.cancel_limit, 20);
    }

    #[test]
    fn test_zero_cancel_limit_rejected() {
        let result = ProgramConfig::from_json_str(r#"{"cancel_limit": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = ProgramConfig::from_json_str(r#"{"program_id": "nothex"}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cancel_limit": 5}}"#).unwrap();
        let config = ProgramConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cancel_limit, 5);
    }

    #[test]
    fn test_from_missing_file() {
        let result = ProgramConfig::from_file("/nonexistent/risk-check.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
