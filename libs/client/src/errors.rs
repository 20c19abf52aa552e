//! Client error types

use risk_check::errors::{ConfigError, LedgerError, RiskCheckError};
use thiserror::Error;
use types::errors::ConversionError;
use types::ids::MarketIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("check_risk already added; the batch is closed")]
    CheckRiskAlreadyAdded,

    #[error("Unknown market: {0}")]
    UnknownMarket(MarketIndex),

    #[error("Unit conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Batch rejected: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Program error: {0}")]
    Program(#[from] RiskCheckError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unexpected instruction outcome: {0}")]
    UnexpectedOutcome(String),
}

impl ClientError {
    /// Program error code behind this failure, if it came from the program.
    pub fn program_code(&self) -> Option<u32> {
        match self {
            Self::Program(e) => Some(e.code()),
            Self::Ledger(e) => e.instruction_error().map(RiskCheckError::code),
            _ => None,
        }
    }
}
