//! Risk parameter record stored per (authority, market)

use serde::{Deserialize, Serialize};
use types::ids::{Authority, MarketIndex};

use crate::exposure::Limit;

/// What `check_risk` does when a limit is breached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ViolationBehaviour {
    /// Abort the whole batch
    #[default]
    RejectTransaction = 0,
    /// Cancel every resting order on the market, then re-check
    CancelAllOrders = 1,
}

/// Owner-configured limits for a single market.
///
/// Lives at the address derived from
/// `(RISK_PARAMS_ACCOUNT_SEED_PHRASE, market_index, authority)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParamsAccount {
    pub authority: Authority,
    pub bump: u8,
    pub market_index: MarketIndex,

    pub max_long_exposure: i64,
    pub max_short_exposure: i64,
    pub max_open_orders: u64,
    /// Stored for future use; no enforcement path reads it.
    pub max_capital_allocated: u64,

    pub violation_behaviour: ViolationBehaviour,
}

impl RiskParamsAccount {
    /// Storage footprint in bytes: discriminator, authority, bump,
    /// market index, four limits, behaviour tag.
    pub const SPACE: usize = 8 + 16 + 1 + 1 + 8 * 4 + 1;

    /// New record with the most permissive limits.
    pub fn new(authority: Authority, market_index: MarketIndex, bump: u8) -> Self {
        Self {
            authority,
            bump,
            market_index,
            max_long_exposure: i64::MAX,
            max_short_exposure: i64::MAX,
            max_open_orders: u64::MAX,
            max_capital_allocated: u64::MAX,
            violation_behaviour: ViolationBehaviour::RejectTransaction,
        }
    }

    /// Configured ceiling for a limit, widened to `i128`.
    pub fn ceiling(&self, limit: Limit) -> i128 {
        match limit {
            Limit::OpenOrders => i128::from(self.max_open_orders),
            Limit::LongExposure => i128::from(self.max_long_exposure),
            Limit::ShortExposure => i128::from(self.max_short_exposure),
        }
    }
}
