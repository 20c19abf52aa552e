//! Types library for the risk-check program
//!
//! Core type definitions shared by the on-chain risk guard and its client,
//! ensuring both sides agree on identities, addresses, and unit scaling.
//!
//! # Version
//! v1.0.0
//!
//! # Modules
//! - `ids`: Identifiers (Authority, MarketIndex, OrderId, Address)
//! - `numeric`: UI ↔ native quantity scaling per market
//! - `order`: Resting order types
//! - `account`: Trading account snapshot (positions + resting orders)
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod account;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::account::*;
    pub use crate::errors::*;
}
