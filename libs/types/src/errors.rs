//! Error types shared across the risk-check crates
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Failure to parse a hex-encoded [`Address`](crate::ids::Address)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Invalid hex address: {input}")]
    InvalidHex { input: String },

    #[error("Invalid address length: expected 32 bytes, got {len}")]
    InvalidLength { len: usize },
}

/// UI ↔ native unit conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid market scale: base_decimals {base_decimals}, base_lot_size {base_lot_size}")]
    InvalidScale { base_decimals: u32, base_lot_size: i64 },

    #[error("Quantity {value} does not fit in native units")]
    OutOfRange { value: String },
}

/// Trading account (venue-side) errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid price: {0}")]
    InvalidPrice(i64),

    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    #[error("Arithmetic overflow in position update")]
    Overflow,
}
