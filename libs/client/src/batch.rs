//! Batch composition
//!
//! Collects the owner's venue and program instructions and closes the batch
//! with exactly one trailing `check_risk`. Once the check is added the
//! builder refuses further instructions.

use risk_check::instruction::{Batch, Instruction, VenueInstruction};
use rust_decimal::Decimal;
use types::ids::{MarketIndex, OrderId};
use types::order::{OrderType, Side};

use crate::client::RiskCheckClient;
use crate::config::PerpMarketConfig;
use crate::errors::ClientError;

pub struct BatchBuilder<'c> {
    client: &'c RiskCheckClient,
    batch: Batch,
    check_added: bool,
}

impl<'c> BatchBuilder<'c> {
    pub fn new(client: &'c RiskCheckClient) -> Self {
        Self {
            client,
            batch: Batch::new(client.owner()),
            check_added: false,
        }
    }

    /// Append any instruction. A `CheckRisk` closes the batch.
    pub fn add(&mut self, instruction: impl Into<Instruction>) -> Result<&mut Self, ClientError> {
        if self.check_added {
            return Err(ClientError::CheckRiskAlreadyAdded);
        }
        let instruction = instruction.into();
        self.check_added = instruction.is_check_risk();
        self.batch.push(instruction);
        Ok(self)
    }

    /// Place an order with quantity in native lots.
    pub fn place_perp_order(
        &mut self,
        market_index: MarketIndex,
        side: Side,
        price: i64,
        quantity: i64,
        order_type: OrderType,
    ) -> Result<&mut Self, ClientError> {
        self.add(VenueInstruction::PlacePerpOrder {
            market_index,
            side,
            price,
            quantity,
            order_type,
        })
    }

    /// Place an order with quantity in UI units.
    pub fn place_perp_order_ui(
        &mut self,
        market: &PerpMarketConfig,
        side: Side,
        price: i64,
        quantity: Decimal,
        order_type: OrderType,
    ) -> Result<&mut Self, ClientError> {
        let quantity = self.client.ui_to_native_quantity(market, quantity)?;
        self.place_perp_order(market.market_index, side, price, quantity, order_type)
    }

    pub fn cancel_perp_order(&mut self, order_id: OrderId) -> Result<&mut Self, ClientError> {
        self.add(VenueInstruction::CancelPerpOrder { order_id })
    }

    pub fn consume_events(&mut self, market_index: MarketIndex) -> Result<&mut Self, ClientError> {
        self.add(VenueInstruction::ConsumeEvents { market_index })
    }

    /// Append the trailing `check_risk` for `market`.
    pub fn check_risk(&mut self, market: &PerpMarketConfig) -> Result<&mut Self, ClientError> {
        let ix = self.client.make_check_risk_instruction(market)?;
        self.add(ix)
    }

    pub fn has_check_risk(&self) -> bool {
        self.check_added
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Finish the batch, adding the `check_risk` for `market` if missing.
    pub fn finish(mut self, market: &PerpMarketConfig) -> Result<Batch, ClientError> {
        if !self.check_added {
            self.check_risk(market)?;
        }
        Ok(self.batch)
    }

    /// Take the batch as built, without forcing a check.
    pub fn build(self) -> Batch {
        self.batch
    }
}
