//! Risk-check client
//!
//! Builds risk-check instructions for one owner and submits them to a
//! [`Ledger`]. Record addresses are derived once per market and cached.

use dashmap::DashMap;
use risk_check::address::derive_risk_params_address;
use risk_check::instruction::{Batch, RiskCheckInstruction};
use risk_check::ledger::{BatchReceipt, Ledger};
use risk_check::program::InstructionOutcome;
use risk_check::state::{RiskParamsAccount, ViolationBehaviour};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;
use types::ids::{Address, Authority, MarketIndex};

use crate::batch::BatchBuilder;
use crate::config::PerpMarketConfig;
use crate::errors::ClientError;

/// Client bound to a single owner and program.
pub struct RiskCheckClient {
    owner: Authority,
    program_id: Address,
    risk_account_cache: DashMap<MarketIndex, Address>,
}

impl RiskCheckClient {
    pub fn new(owner: Authority, program_id: Address) -> Self {
        Self {
            owner,
            program_id,
            risk_account_cache: DashMap::new(),
        }
    }

    pub fn owner(&self) -> Authority {
        self.owner
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    // ───────────────────────── Addresses ─────────────────────────

    /// Derive the owner's record address and bump for a market.
    pub fn derive_risk_account_address(
        &self,
        market_index: MarketIndex,
    ) -> Result<(Address, u8), ClientError> {
        Ok(derive_risk_params_address(
            &self.program_id,
            market_index,
            &self.owner,
        )?)
    }

    /// Cached record address for a market.
    pub fn risk_account_address(&self, market: &PerpMarketConfig) -> Result<Address, ClientError> {
        if let Some(address) = self.risk_account_cache.get(&market.market_index) {
            return Ok(*address);
        }
        let (address, _) = self.derive_risk_account_address(market.market_index)?;
        debug!(
            market = %market.name,
            address = %address,
            "Cached risk account address"
        );
        self.risk_account_cache.insert(market.market_index, address);
        Ok(address)
    }

    // ───────────────────────── Unit Conversion ─────────────────────────

    /// UI quantity to native lots, rounded toward zero.
    pub fn ui_to_native_quantity(
        &self,
        market: &PerpMarketConfig,
        quantity: Decimal,
    ) -> Result<i64, ClientError> {
        Ok(market.scale()?.ui_to_native(quantity)?)
    }

    pub fn native_to_ui_quantity(
        &self,
        market: &PerpMarketConfig,
        quantity: i64,
    ) -> Result<Decimal, ClientError> {
        Ok(market.scale()?.native_to_ui(quantity)?)
    }

    // ───────────────────────── Instruction Builders ─────────────────────────

    pub fn make_initialize_instruction(&self, market: &PerpMarketConfig) -> RiskCheckInstruction {
        RiskCheckInstruction::Initialize {
            market_index: market.market_index,
        }
    }

    pub fn make_set_max_open_orders_instruction(
        &self,
        market: &PerpMarketConfig,
        max_open_orders: i64,
    ) -> Result<RiskCheckInstruction, ClientError> {
        let max_open_orders = u64::try_from(max_open_orders).map_err(|_| {
            ClientError::InvalidArgument(format!(
                "invalid maximum open orders: {max_open_orders}"
            ))
        })?;
        Ok(RiskCheckInstruction::SetMaxOpenOrders {
            risk_params_account: self.risk_account_address(market)?,
            max_open_orders,
        })
    }

    /// `value` is UI units unless `native_units` is set.
    pub fn make_set_max_long_exposure_instruction(
        &self,
        market: &PerpMarketConfig,
        value: Decimal,
        native_units: bool,
    ) -> Result<RiskCheckInstruction, ClientError> {
        let max_long_exposure = self.exposure_limit(market, value, native_units, "long")?;
        Ok(RiskCheckInstruction::SetMaxLongExposure {
            risk_params_account: self.risk_account_address(market)?,
            max_long_exposure,
        })
    }

    /// `value` is UI units unless `native_units` is set.
    pub fn make_set_max_short_exposure_instruction(
        &self,
        market: &PerpMarketConfig,
        value: Decimal,
        native_units: bool,
    ) -> Result<RiskCheckInstruction, ClientError> {
        let max_short_exposure = self.exposure_limit(market, value, native_units, "short")?;
        Ok(RiskCheckInstruction::SetMaxShortExposure {
            risk_params_account: self.risk_account_address(market)?,
            max_short_exposure,
        })
    }

    pub fn make_set_violation_behaviour_instruction(
        &self,
        market: &PerpMarketConfig,
        violation_behaviour: ViolationBehaviour,
    ) -> Result<RiskCheckInstruction, ClientError> {
        Ok(RiskCheckInstruction::SetViolationBehaviour {
            risk_params_account: self.risk_account_address(market)?,
            violation_behaviour,
        })
    }

    pub fn make_check_risk_instruction(
        &self,
        market: &PerpMarketConfig,
    ) -> Result<RiskCheckInstruction, ClientError> {
        Ok(RiskCheckInstruction::CheckRisk {
            risk_params_account: self.risk_account_address(market)?,
        })
    }

    pub fn make_close_risk_account_instruction(
        &self,
        market: &PerpMarketConfig,
    ) -> Result<RiskCheckInstruction, ClientError> {
        Ok(RiskCheckInstruction::Close {
            risk_params_account: self.risk_account_address(market)?,
        })
    }

    /// Start a batch whose last instruction will be `check_risk`.
    pub fn batch(&self) -> BatchBuilder<'_> {
        BatchBuilder::new(self)
    }

    // ───────────────────────── Send Helpers ─────────────────────────

    /// Submit a batch signed by the owner.
    pub fn send(&self, ledger: &mut Ledger, batch: &Batch) -> Result<BatchReceipt, ClientError> {
        if batch.signer != self.owner {
            return Err(ClientError::InvalidArgument(format!(
                "batch signer {} is not the client owner {}",
                batch.signer, self.owner
            )));
        }
        Ok(ledger.execute(batch)?)
    }

    pub fn initialize_risk_account(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
    ) -> Result<Address, ClientError> {
        let ix = self.make_initialize_instruction(market);
        match self.send_one(ledger, ix)? {
            InstructionOutcome::Initialized(address) => Ok(address),
            other => Err(ClientError::UnexpectedOutcome(format!("{other:?}"))),
        }
    }

    pub fn get_risk_account(
        &self,
        ledger: &Ledger,
        market: &PerpMarketConfig,
    ) -> Result<RiskParamsAccount, ClientError> {
        let address = self.risk_account_address(market)?;
        Ok(ledger.get_record(&address)?.clone())
    }

    pub fn set_max_open_orders(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
        max_open_orders: i64,
    ) -> Result<(), ClientError> {
        let ix = self.make_set_max_open_orders_instruction(market, max_open_orders)?;
        self.send_one(ledger, ix).map(|_| ())
    }

    pub fn set_max_long_exposure(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
        value: Decimal,
        native_units: bool,
    ) -> Result<(), ClientError> {
        let ix = self.make_set_max_long_exposure_instruction(market, value, native_units)?;
        self.send_one(ledger, ix).map(|_| ())
    }

    pub fn set_max_short_exposure(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
        value: Decimal,
        native_units: bool,
    ) -> Result<(), ClientError> {
        let ix = self.make_set_max_short_exposure_instruction(market, value, native_units)?;
        self.send_one(ledger, ix).map(|_| ())
    }

    pub fn set_violation_behaviour(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
        violation_behaviour: ViolationBehaviour,
    ) -> Result<(), ClientError> {
        let ix = self.make_set_violation_behaviour_instruction(market, violation_behaviour)?;
        self.send_one(ledger, ix).map(|_| ())
    }

    /// Close the record; returns the reserve credited back to the owner.
    pub fn close_risk_account(
        &self,
        ledger: &mut Ledger,
        market: &PerpMarketConfig,
    ) -> Result<u64, ClientError> {
        let ix = self.make_close_risk_account_instruction(market)?;
        match self.send_one(ledger, ix)? {
            InstructionOutcome::Closed { reserve_returned } => Ok(reserve_returned),
            other => Err(ClientError::UnexpectedOutcome(format!("{other:?}"))),
        }
    }

    // ───────────────────────── Internals ─────────────────────────

    fn send_one(
        &self,
        ledger: &mut Ledger,
        ix: RiskCheckInstruction,
    ) -> Result<InstructionOutcome, ClientError> {
        let receipt = self.send(ledger, &Batch::new(self.owner).with(ix))?;
        receipt
            .outcomes
            .first()
            .copied()
            .ok_or_else(|| ClientError::UnexpectedOutcome("empty receipt".to_string()))
    }

    fn exposure_limit(
        &self,
        market: &PerpMarketConfig,
        value: Decimal,
        native_units: bool,
        side: &str,
    ) -> Result<i64, ClientError> {
        if value < Decimal::ZERO {
            return Err(ClientError::InvalidArgument(format!(
                "invalid maximum {side} exposure: {value}"
            )));
        }
        if !native_units {
            return self.ui_to_native_quantity(market, value);
        }
        if !value.fract().is_zero() {
            return Err(ClientError::InvalidArgument(format!(
                "native {side} exposure must be a whole number, got {value}"
            )));
        }
        value.to_i64().ok_or_else(|| {
            ClientError::InvalidArgument(format!("{side} exposure {value} out of range"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sol_perp() -> PerpMarketConfig {
        PerpMarketConfig {
            market_index: MarketIndex::new(3),
            name: "SOL-PERP".to_string(),
            base_decimals: 9,
            base_lot_size: 10_000_000,
        }
    }

    fn client() -> RiskCheckClient {
        RiskCheckClient::new(Authority::new(), Address::new([5u8; 32]))
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_cached_address_matches_derivation() {
        let client = client();
        let market = sol_perp();
        let (derived, _) = client.derive_risk_account_address(market.market_index).unwrap();
        assert_eq!(client.risk_account_address(&market).unwrap(), derived);
        assert_eq!(client.risk_account_address(&market).unwrap(), derived);
        assert_eq!(client.risk_account_cache.len(), 1);
    }

    #[test]
    fn test_negative_open_orders_rejected() {
        let result = client().make_set_max_open_orders_instruction(&sol_perp(), -1);
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_long_exposure_ui_conversion() {
        let client = client();
        let ix = client
            .make_set_max_long_exposure_instruction(&sol_perp(), dec("0.5"), false)
            .unwrap();
        assert!(matches!(
            ix,
            RiskCheckInstruction::SetMaxLongExposure {
                max_long_exposure: 50,
                ..
            }
        ));
    }

    #[test]
    fn test_short_exposure_native_units() {
        let ix = client()
            .make_set_max_short_exposure_instruction(&sol_perp(), dec("120"), true)
            .unwrap();
        assert!(matches!(
            ix,
            RiskCheckInstruction::SetMaxShortExposure {
                max_short_exposure: 120,
                ..
            }
        ));
    }

    #[test]
    fn test_fractional_native_units_rejected() {
        let result =
            client().make_set_max_short_exposure_instruction(&sol_perp(), dec("1.5"), true);
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_exposure_rejected() {
        let result =
            client().make_set_max_long_exposure_instruction(&sol_perp(), dec("-0.01"), false);
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_round_trip_quantity_helpers() {
        let client = client();
        let market = sol_perp();
        assert_eq!(client.ui_to_native_quantity(&market, dec("2.25")).unwrap(), 225);
        assert_eq!(client.native_to_ui_quantity(&market, 225).unwrap(), dec("2.25"));
    }

    #[test]
    fn test_foreign_signer_refused() {
        let client = client();
        let mut ledger = Ledger::with_defaults();
        let batch = Batch::new(Authority::new()).with(client.make_initialize_instruction(&sol_perp()));
        assert!(matches!(
            client.send(&mut ledger, &batch),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whole native-unit limits reach the instruction unchanged.
            #[test]
            fn native_exposure_passes_through(n in 0i64..1_000_000_000_000i64) {
                let ix = client()
                    .make_set_max_long_exposure_instruction(&sol_perp(), Decimal::from(n), true)
                    .unwrap();
                let passed = matches!(
                    ix,
                    RiskCheckInstruction::SetMaxLongExposure { max_long_exposure, .. }
                        if max_long_exposure == n
                );
                prop_assert!(passed);
            }

            /// Lot-aligned UI quantities convert back to the same value.
            #[test]
            fn ui_quantity_round_trips(lots in 0i64..1_000_000_000i64) {
                let client = client();
                let market = sol_perp();
                let ui = client.native_to_ui_quantity(&market, lots).unwrap();
                prop_assert!(ui >= Decimal::ZERO);
                prop_assert_eq!(client.ui_to_native_quantity(&market, ui).unwrap(), lots);
            }
        }
    }
}
