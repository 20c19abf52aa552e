//! Program error types
//!
//! Error taxonomy for risk-record lifecycle, limit enforcement, batch
//! execution, and configuration loading.

use thiserror::Error;
use types::errors::OrderError;
use types::ids::Address;

use crate::exposure::Limit;

/// Base of the program's numeric error codes.
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// Errors raised by the risk-check instruction handlers.
///
/// Measured and configured values are carried as `i128` so both the
/// unsigned order-count ceiling and the signed exposure ceilings fit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskCheckError {
    #[error("{limit} {current} exceeds requested risk limit {requested}")]
    SetterBelowCurrent {
        limit: Limit,
        current: i128,
        requested: i128,
    },

    #[error("{limit} {current} exceeds risk limit {max}")]
    LimitExceeded { limit: Limit, current: i128, max: i128 },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Risk params account already exists: {address}")]
    AlreadyExists { address: Address },

    #[error("Risk params account not found: {address}")]
    NotFound { address: Address },

    #[error("Unauthorized: signer is not the record authority")]
    Unauthorized,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Arithmetic overflow in exposure calculation")]
    ArithmeticOverflow,

    #[error("Venue rejected operation: {0}")]
    Venue(#[from] OrderError),
}

impl RiskCheckError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Stable numeric error code.
    ///
    /// Limit errors alternate setter/enforcement per limit: 6000/6001 open
    /// orders, 6002/6003 long exposure, 6004/6005 short exposure.
    pub fn code(&self) -> u32 {
        let offset = match self {
            Self::SetterBelowCurrent { limit, .. } => limit.ordinal() * 2,
            Self::LimitExceeded { limit, .. } => limit.ordinal() * 2 + 1,
            Self::InvalidArgument { .. } => 6,
            Self::AlreadyExists { .. } => 7,
            Self::NotFound { .. } => 8,
            Self::Unauthorized => 9,
            Self::InsufficientFunds { .. } => 10,
            Self::ArithmeticOverflow => 11,
            Self::Venue(_) => 12,
        };
        ERROR_CODE_OFFSET + offset
    }
}

/// Batch-level failures reported by the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Empty batch: no instructions to execute")]
    EmptyBatch,

    #[error("check_risk at index {index} is followed by {trailing} instruction(s)")]
    CheckRiskNotLast { index: usize, trailing: usize },

    #[error("Instruction {index} failed: {source}")]
    InstructionFailed {
        index: usize,
        #[source]
        source: RiskCheckError,
    },

    #[error("Balance overflow crediting {authority}")]
    BalanceOverflow { authority: String },
}

impl LedgerError {
    /// The instruction error that aborted the batch, if any.
    pub fn instruction_error(&self) -> Option<&RiskCheckError> {
        match self {
            Self::InstructionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {reason}")]
    Invalid { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_error_codes() {
        let setter = |limit| RiskCheckError::SetterBelowCurrent {
            limit,
            current: 2,
            requested: 1,
        };
        let exceeded = |limit| RiskCheckError::LimitExceeded {
            limit,
            current: 2,
            max: 1,
        };
        assert_eq!(setter(Limit::OpenOrders).code(), 6000);
        assert_eq!(exceeded(Limit::OpenOrders).code(), 6001);
        assert_eq!(setter(Limit::LongExposure).code(), 6002);
        assert_eq!(exceeded(Limit::LongExposure).code(), 6003);
        assert_eq!(setter(Limit::ShortExposure).code(), 6004);
        assert_eq!(exceeded(Limit::ShortExposure).code(), 6005);
        assert_eq!(RiskCheckError::invalid_argument("negative").code(), 6006);
    }

    #[test]
    fn test_limit_exceeded_display() {
        let err = RiskCheckError::LimitExceeded {
            limit: Limit::LongExposure,
            current: 101,
            max: 100,
        };
        assert_eq!(err.to_string(), "long exposure 101 exceeds risk limit 100");
    }

    #[test]
    fn test_venue_error_from_order_error() {
        let err: RiskCheckError = OrderError::InvalidQuantity(0).into();
        assert!(matches!(err, RiskCheckError::Venue(_)));
    }

    #[test]
    fn test_ledger_error_exposes_instruction_error() {
        let err = LedgerError::InstructionFailed {
            index: 2,
            source: RiskCheckError::Unauthorized,
        };
        assert_eq!(err.instruction_error(), Some(&RiskCheckError::Unauthorized));
        assert!(err.to_string().contains("Instruction 2 failed"));
        assert_eq!(LedgerError::EmptyBatch.instruction_error(), None);
    }
}
