//! Risk-Check Client: Composition Layer
//!
//! Builds risk-check instructions for a single owner:
//! - Cached record address lookup per market
//! - UI ↔ native quantity conversion per market scale
//! - Batch composition with a trailing `check_risk`
//! - Single-instruction send helpers against a ledger
//!
//! # Version
//! v1.0.0

pub mod batch;
pub mod client;
pub mod config;
pub mod errors;

pub use batch::BatchBuilder;
pub use client::RiskCheckClient;
pub use config::{ClientConfig, PerpMarketConfig};
pub use errors::ClientError;

/// Crate version constant
pub const CLIENT_VERSION: &str = "1.0.0";
