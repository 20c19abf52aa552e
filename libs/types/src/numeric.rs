//! Market-specific scaling between UI and native quantities
//!
//! A perpetual market quotes base quantities in lots. One native unit is
//! `base_lot_size / 10^base_decimals` of the base asset, so for SOL-PERP
//! (9 decimals, lot size 10_000_000) a UI quantity of `0.5` is `50` native
//! units. All limit comparisons happen in native units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ConversionError;

/// Largest supported decimal exponent (10^18 still fits in a u64).
const MAX_BASE_DECIMALS: u32 = 18;

/// Decimal scaling of a single market's base quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketScale {
    pub base_decimals: u32,
    pub base_lot_size: i64,
}

impl MarketScale {
    /// Create a validated scale.
    pub fn new(base_decimals: u32, base_lot_size: i64) -> Result<Self, ConversionError> {
        let scale = Self {
            base_decimals,
            base_lot_size,
        };
        scale.validate()?;
        Ok(scale)
    }

    /// Check decimals are in range and the lot size is positive.
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.base_decimals > MAX_BASE_DECIMALS || self.base_lot_size <= 0 {
            return Err(ConversionError::InvalidScale {
                base_decimals: self.base_decimals,
                base_lot_size: self.base_lot_size,
            });
        }
        Ok(())
    }

    fn base_unit(&self) -> Result<Decimal, ConversionError> {
        self.validate()?;
        Ok(Decimal::from(10u64.pow(self.base_decimals)))
    }

    /// Convert a UI quantity to native lots, rounding toward zero.
    ///
    /// `native = ui × 10^base_decimals / base_lot_size`
    pub fn ui_to_native(&self, ui: Decimal) -> Result<i64, ConversionError> {
        let out_of_range = || ConversionError::OutOfRange {
            value: ui.to_string(),
        };
        let native = ui
            .checked_mul(self.base_unit()?)
            .and_then(|v| v.checked_div(Decimal::from(self.base_lot_size)))
            .ok_or_else(out_of_range)?;
        native.trunc().to_i64().ok_or_else(out_of_range)
    }

    /// Convert native lots back to a UI quantity.
    ///
    /// `ui = native × base_lot_size / 10^base_decimals`
    pub fn native_to_ui(&self, native: i64) -> Result<Decimal, ConversionError> {
        let base_unit = self.base_unit()?;
        Decimal::from(native)
            .checked_mul(Decimal::from(self.base_lot_size))
            .and_then(|v| v.checked_div(base_unit))
            .ok_or_else(|| ConversionError::OutOfRange {
                value: native.to_string(),
            })
    }
}
