//! Transactional Risk-Limit Guard
//!
//! On-chain program that lets a perpetuals trader cap open-order count and
//! projected long/short exposure per market. A `check_risk` instruction at
//! the end of a batch either passes, cancels every resting order and
//! re-checks, or aborts the batch, according to the record's policy.
//!
//! # Modules
//! - `address`: Deterministic record addresses (seed + bump search)
//! - `state`: `RiskParamsAccount` record and violation policy
//! - `exposure`: Open-order / exposure accounting and the limit predicate
//! - `venue`: Perpetuals venue boundary and in-process venue
//! - `remediation`: Cancel-all loop used by the `CancelAllOrders` policy
//! - `instruction`: Instructions and batches
//! - `program`: Instruction handlers
//! - `ledger`: Atomic batch execution, balances, event log
//! - `security`: Authority and seeds constraints
//! - `config`: Program configuration
//! - `events`: Risk events
//! - `errors`: Error types and numeric codes
//!
//! # Version
//! v0.1.0

pub mod address;
pub mod config;
pub mod errors;
pub mod events;
pub mod exposure;
pub mod instruction;
pub mod ledger;
pub mod program;
pub mod remediation;
pub mod security;
pub mod state;
pub mod venue;

/// Program ABI version, frozen after release
pub const PROGRAM_ABI_VERSION: &str = "1.0.0";
