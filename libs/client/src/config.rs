//! Client configuration
//!
//! Lists the program id and the perpetual markets the client can scale
//! quantities for.

use risk_check::config::DEFAULT_PROGRAM_ID;
use risk_check::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use types::ids::{Address, MarketIndex};
use types::numeric::MarketScale;

use crate::errors::ClientError;

/// One perpetual market's quantity scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpMarketConfig {
    pub market_index: MarketIndex,
    pub name: String,
    pub base_decimals: u32,
    pub base_lot_size: i64,
}

impl PerpMarketConfig {
    pub fn scale(&self) -> Result<MarketScale, ClientError> {
        Ok(MarketScale::new(self.base_decimals, self.base_lot_size)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub program_id: Address,
    pub markets: Vec<PerpMarketConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            markets: default_markets(),
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ClientError::Config(ConfigError::Parse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        Self::from_json_str(&json)
    }

    /// Every market must have a valid scale and a unique index.
    pub fn validate(&self) -> Result<(), ClientError> {
        for (i, market) in self.markets.iter().enumerate() {
            market.scale()?;
            if self.markets[..i]
                .iter()
                .any(|m| m.market_index == market.market_index)
            {
                return Err(ClientError::Config(ConfigError::Invalid {
                    reason: format!("duplicate market index {}", market.market_index),
                }));
            }
        }
        Ok(())
    }

    pub fn market(&self, market_index: MarketIndex) -> Result<&PerpMarketConfig, ClientError> {
        self.markets
            .iter()
            .find(|m| m.market_index == market_index)
            .ok_or(ClientError::UnknownMarket(market_index))
    }

    pub fn market_by_name(&self, name: &str) -> Option<&PerpMarketConfig> {
        self.markets.iter().find(|m| m.name == name)
    }
}

/// Markets known without a config file.
fn default_markets() -> Vec<PerpMarketConfig> {
    vec![PerpMarketConfig {
        market_index: MarketIndex::new(3),
        name: "SOL-PERP".to_string(),
        base_decimals: 9,
        base_lot_size: 10_000_000,
    }]
}
