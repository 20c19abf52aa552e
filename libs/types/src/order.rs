//! Order types for perpetual markets
//!
//! Prices and quantities are native lot counts (`i64`), matching the
//! integer units the risk guard compares limits in.

use crate::ids::{MarketIndex, OrderId};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Signed direction of a fill on this side (+1 buy, -1 sell)
    pub fn sign(&self) -> i64 {
        match self {
            Side::BUY => 1,
            Side::SELL => -1,
        }
    }
}

/// How a placed order interacts with the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Rests on the book until filled or cancelled
    Limit,
    /// Takes liquidity immediately; the fill lands in the unconsumed position
    Market,
}

/// An unfilled order sitting on a market's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub market_index: MarketIndex,
    pub side: Side,
    /// Limit price in native price lots
    pub price: i64,
    /// Remaining quantity in native base lots (always positive)
    pub quantity: i64,
}

impl RestingOrder {
    pub fn new(market_index: MarketIndex, side: Side, price: i64, quantity: i64) -> Self {
        Self {
            order_id: OrderId::new(),
            market_index,
            side,
            price,
            quantity,
        }
    }

    pub fn is_bid(&self) -> bool {
        self.side == Side::BUY
    }
}
