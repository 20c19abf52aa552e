//! Perpetuals venue boundary
//!
//! The risk guard reads trading accounts and asks the venue to cancel
//! orders; it never places orders itself. [`TradingVenue`] is that seam.
//! [`PerpVenue`] is the in-process venue the ledger executes against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::account::TradingAccount;
use types::errors::OrderError;
use types::ids::{Authority, MarketIndex};
use types::order::OrderType;

use crate::instruction::VenueInstruction;

/// Venue operations the risk guard depends on.
pub trait TradingVenue {
    /// Snapshot of an owner's account, if one exists.
    fn trading_account(&self, owner: &Authority) -> Option<&TradingAccount>;

    /// Cancel up to `limit` of the owner's resting orders on a market.
    /// Returns how many were cancelled.
    fn cancel_all_orders(
        &mut self,
        owner: &Authority,
        market_index: MarketIndex,
        limit: u8,
    ) -> Result<usize, OrderError>;
}

/// In-process perpetuals venue keyed by owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerpVenue {
    accounts: BTreeMap<Authority, TradingAccount>,
}

impl PerpVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `owner`, created empty on first use.
    pub fn account_mut(&mut self, owner: &Authority) -> &mut TradingAccount {
        self.accounts
            .entry(*owner)
            .or_insert_with(|| TradingAccount::new(*owner))
    }

    /// Apply a venue instruction on behalf of `owner`.
    pub fn execute(
        &mut self,
        owner: &Authority,
        instruction: &VenueInstruction,
    ) -> Result<(), OrderError> {
        let account = self.account_mut(owner);
        match instruction {
            VenueInstruction::PlacePerpOrder {
                market_index,
                side,
                price,
                quantity,
                order_type,
            } => match order_type {
                OrderType::Limit => {
                    account.place_limit_order(*market_index, *side, *price, *quantity)?;
                }
                OrderType::Market => {
                    if *price <= 0 {
                        return Err(OrderError::InvalidPrice(*price));
                    }
                    account.apply_taker_fill(*market_index, *side, *quantity)?;
                }
            },
            VenueInstruction::CancelPerpOrder { order_id } => {
                account.cancel_order(*order_id)?;
            }
            VenueInstruction::CancelAllPerpOrders {
                market_index,
                limit,
            } => {
                account.cancel_all(*market_index, *limit);
            }
            VenueInstruction::ConsumeEvents { market_index } => {
                account.consume_events(*market_index)?;
            }
        }
        Ok(())
    }
}

impl TradingVenue for PerpVenue {
    fn trading_account(&self, owner: &Authority) -> Option<&TradingAccount> {
        self.accounts.get(owner)
    }

    fn cancel_all_orders(
        &mut self,
        owner: &Authority,
        market_index: MarketIndex,
        limit: u8,
    ) -> Result<usize, OrderError> {
        Ok(self
            .accounts
            .get_mut(owner)
            .map(|account| account.cancel_all(market_index, limit))
            .unwrap_or(0))
    }
}
