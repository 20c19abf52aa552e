//! Trading account snapshot
//!
//! The state an external perpetuals venue keeps for one owner: a signed
//! position per market plus the set of resting orders. The risk guard only
//! reads this snapshot and asks the venue to cancel orders.

use crate::errors::OrderError;
use crate::ids::{Authority, MarketIndex, OrderId};
use crate::order::{RestingOrder, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-market position state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpAccount {
    /// Settled position in native base lots (negative = short)
    pub base_position: i64,
    /// Taker fills not yet consumed from the event queue
    pub taker_base: i64,
}

impl PerpAccount {
    /// Net position including unconsumed fills.
    pub fn net_position(&self) -> Option<i64> {
        self.base_position.checked_add(self.taker_base)
    }
}

/// An owner's trading account across all markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingAccount {
    pub owner: Authority,
    pub perp_accounts: BTreeMap<MarketIndex, PerpAccount>,
    /// Resting orders in placement order
    pub orders: Vec<RestingOrder>,
}

impl TradingAccount {
    /// Create an empty account
    pub fn new(owner: Authority) -> Self {
        Self {
            owner,
            perp_accounts: BTreeMap::new(),
            orders: Vec::new(),
        }
    }

    /// Position state for a market (flat if never traded)
    pub fn perp_account(&self, market_index: MarketIndex) -> PerpAccount {
        self.perp_accounts
            .get(&market_index)
            .copied()
            .unwrap_or_default()
    }

    /// Resting orders on a single market
    pub fn open_orders(&self, market_index: MarketIndex) -> impl Iterator<Item = &RestingOrder> {
        self.orders
            .iter()
            .filter(move |o| o.market_index == market_index)
    }

    /// Rest a limit order on the book.
    pub fn place_limit_order(
        &mut self,
        market_index: MarketIndex,
        side: Side,
        price: i64,
        quantity: i64,
    ) -> Result<OrderId, OrderError> {
        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity(quantity));
        }
        if price <= 0 {
            return Err(OrderError::InvalidPrice(price));
        }
        let order = RestingOrder::new(market_index, side, price, quantity);
        let order_id = order.order_id;
        self.orders.push(order);
        Ok(order_id)
    }

    /// Record an immediate taker fill. The fill is unconsumed until
    /// [`consume_events`](Self::consume_events) settles it.
    pub fn apply_taker_fill(
        &mut self,
        market_index: MarketIndex,
        side: Side,
        quantity: i64,
    ) -> Result<(), OrderError> {
        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity(quantity));
        }
        let delta = quantity.checked_mul(side.sign()).ok_or(OrderError::Overflow)?;
        let perp = self.perp_accounts.entry(market_index).or_default();
        perp.taker_base = perp
            .taker_base
            .checked_add(delta)
            .ok_or(OrderError::Overflow)?;
        Ok(())
    }

    /// Move unconsumed fills into the settled position.
    pub fn consume_events(&mut self, market_index: MarketIndex) -> Result<(), OrderError> {
        let perp = self.perp_accounts.entry(market_index).or_default();
        perp.base_position = perp.net_position().ok_or(OrderError::Overflow)?;
        perp.taker_base = 0;
        Ok(())
    }

    /// Cancel a single resting order by id.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<RestingOrder, OrderError> {
        let idx = self
            .orders
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or_else(|| OrderError::NotFound {
                order_id: order_id.to_string(),
            })?;
        Ok(self.orders.remove(idx))
    }

    /// Cancel up to `limit` resting orders on a market, oldest first.
    ///
    /// Returns the number of orders cancelled.
    pub fn cancel_all(&mut self, market_index: MarketIndex, limit: u8) -> usize {
        let mut remaining = limit as usize;
        let before = self.orders.len();
        self.orders.retain(|o| {
            if remaining > 0 && o.market_index == market_index {
                remaining -= 1;
                false
            } else {
                true
            }
        });
        before - self.orders.len()
    }
}
