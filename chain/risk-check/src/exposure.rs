//! Exposure accounting and the shared limit predicate
//!
//! Derives open-order count and projected long/short exposure from a
//! trading account snapshot, all in native integer units:
//!
//! - `projected_long  = max(position, 0)  + Σ resting bid quantity`
//! - `projected_short = max(-position, 0) + Σ resting ask quantity`
//!
//! where `position` includes taker fills not yet consumed from the event
//! queue. Both sums are of non-negative terms, so exposures are never
//! negative.

use serde::{Deserialize, Serialize};
use std::fmt;
use types::account::TradingAccount;
use types::ids::MarketIndex;

use crate::errors::RiskCheckError;
use crate::state::RiskParamsAccount;

/// The three enforced limits, in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limit {
    OpenOrders,
    LongExposure,
    ShortExposure,
}

impl Limit {
    /// Fixed priority used when several limits are breached at once.
    pub const PRIORITY: [Limit; 3] = [Limit::OpenOrders, Limit::LongExposure, Limit::ShortExposure];

    pub fn ordinal(&self) -> u32 {
        match self {
            Limit::OpenOrders => 0,
            Limit::LongExposure => 1,
            Limit::ShortExposure => 2,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Limit::OpenOrders => "open orders",
            Limit::LongExposure => "long exposure",
            Limit::ShortExposure => "short exposure",
        };
        f.write_str(name)
    }
}

/// A measured value above its configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breach {
    pub limit: Limit,
    pub current: i128,
    pub max: i128,
}

impl Breach {
    /// Error raised by `check_risk`.
    pub fn into_limit_exceeded(self) -> RiskCheckError {
        RiskCheckError::LimitExceeded {
            limit: self.limit,
            current: self.current,
            max: self.max,
        }
    }

    /// Error raised by a setter whose new ceiling is already breached.
    pub fn into_setter_error(self) -> RiskCheckError {
        RiskCheckError::SetterBelowCurrent {
            limit: self.limit,
            current: self.current,
            requested: self.max,
        }
    }
}

/// Risk-relevant figures for one (account, market).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskValues {
    pub position: i64,
    pub unconsumed_position: i64,
    pub long_order_quantity: i64,
    pub short_order_quantity: i64,
    pub num_open_orders: u64,
    pub long_exposure: i64,
    pub short_exposure: i64,
}

impl RiskValues {
    /// Compute figures for a market. A missing account is flat with no
    /// orders.
    pub fn compute(
        account: Option<&TradingAccount>,
        market_index: MarketIndex,
    ) -> Result<Self, RiskCheckError> {
        let Some(account) = account else {
            return Ok(Self::default());
        };

        let perp = account.perp_account(market_index);
        let net = perp
            .net_position()
            .ok_or(RiskCheckError::ArithmeticOverflow)?;

        let mut num_open_orders: u64 = 0;
        let mut long_order_quantity: i64 = 0;
        let mut short_order_quantity: i64 = 0;
        for order in account.open_orders(market_index) {
            num_open_orders += 1;
            let side_total = if order.is_bid() {
                &mut long_order_quantity
            } else {
                &mut short_order_quantity
            };
            *side_total = side_total
                .checked_add(order.quantity)
                .ok_or(RiskCheckError::ArithmeticOverflow)?;
        }

        let long_position = net.max(0);
        let short_position = net
            .min(0)
            .checked_neg()
            .ok_or(RiskCheckError::ArithmeticOverflow)?;

        Ok(Self {
            position: perp.base_position,
            unconsumed_position: perp.taker_base,
            long_order_quantity,
            short_order_quantity,
            num_open_orders,
            long_exposure: long_position
                .checked_add(long_order_quantity)
                .ok_or(RiskCheckError::ArithmeticOverflow)?,
            short_exposure: short_position
                .checked_add(short_order_quantity)
                .ok_or(RiskCheckError::ArithmeticOverflow)?,
        })
    }

    /// Measured value for a limit, widened to `i128`.
    pub fn measured(&self, limit: Limit) -> i128 {
        match limit {
            Limit::OpenOrders => i128::from(self.num_open_orders),
            Limit::LongExposure => i128::from(self.long_exposure),
            Limit::ShortExposure => i128::from(self.short_exposure),
        }
    }

    /// The single limit predicate: `measured > ceiling`.
    ///
    /// Setters and `check_risk` both go through here.
    pub fn check(&self, limit: Limit, params: &RiskParamsAccount) -> Option<Breach> {
        let current = self.measured(limit);
        let max = params.ceiling(limit);
        (current > max).then_some(Breach {
            limit,
            current,
            max,
        })
    }

    /// First breached limit in [`Limit::PRIORITY`] order.
    pub fn first_breach(&self, params: &RiskParamsAccount) -> Option<Breach> {
        Limit::PRIORITY
            .iter()
            .find_map(|limit| self.check(*limit, params))
    }

    pub fn has_orders(&self) -> bool {
        self.num_open_orders > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Authority;
    use types::order::Side;

    const SOL: MarketIndex = MarketIndex::new(3);
    const BTC: MarketIndex = MarketIndex::new(1);

    fn account() -> TradingAccount {
        TradingAccount::new(Authority::new())
    }

    fn params(account: &TradingAccount) -> RiskParamsAccount {
        RiskParamsAccount::new(account.owner, SOL, 255)
    }

    #[test]
    fn test_missing_account_is_flat() {
        let values = RiskValues::compute(None, SOL).unwrap();
        assert_eq!(values, RiskValues::default());
    }

    #[test]
    fn test_long_exposure_position_plus_bids() {
        let mut acct = account();
        acct.apply_taker_fill(SOL, Side::BUY, 70).unwrap();
        acct.place_limit_order(SOL, Side::BUY, 2_000, 30).unwrap();
        acct.place_limit_order(SOL, Side::SELL, 2_200, 10).unwrap();

        let values = RiskValues::compute(Some(&acct), SOL).unwrap();
        assert_eq!(values.unconsumed_position, 70);
        assert_eq!(values.long_order_quantity, 30);
        assert_eq!(values.short_order_quantity, 10);
        assert_eq!(values.long_exposure, 100);
        // Long position does not offset resting asks
        assert_eq!(values.short_exposure, 10);
        assert_eq!(values.num_open_orders, 2);
    }

    #[test]
    fn test_short_exposure_position_plus_asks() {
        let mut acct = account();
        acct.apply_taker_fill(SOL, Side::SELL, 40).unwrap();
        acct.consume_events(SOL).unwrap();
        acct.place_limit_order(SOL, Side::SELL, 2_200, 25).unwrap();
        acct.place_limit_order(SOL, Side::BUY, 1_900, 5).unwrap();

        let values = RiskValues::compute(Some(&acct), SOL).unwrap();
        assert_eq!(values.position, -40);
        assert_eq!(values.short_exposure, 65);
        assert_eq!(values.long_exposure, 5);
    }

    #[test]
    fn test_other_markets_ignored() {
        let mut acct = account();
        acct.place_limit_order(BTC, Side::BUY, 30_000, 1_000).unwrap();
        let values = RiskValues::compute(Some(&acct), SOL).unwrap();
        assert_eq!(values.num_open_orders, 0);
        assert_eq!(values.long_exposure, 0);
    }

    #[test]
    fn test_overflow_reported() {
        let mut acct = account();
        acct.place_limit_order(SOL, Side::BUY, 1, i64::MAX).unwrap();
        acct.place_limit_order(SOL, Side::BUY, 1, 1).unwrap();
        assert_eq!(
            RiskValues::compute(Some(&acct), SOL),
            Err(RiskCheckError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_check_boundary() {
        let acct = account();
        let mut record = params(&acct);
        record.max_long_exposure = 100;

        let at_limit = RiskValues {
            long_exposure: 100,
            ..Default::default()
        };
        assert_eq!(at_limit.check(Limit::LongExposure, &record), None);

        let over = RiskValues {
            long_exposure: 101,
            ..Default::default()
        };
        assert_eq!(
            over.check(Limit::LongExposure, &record),
            Some(Breach {
                limit: Limit::LongExposure,
                current: 101,
                max: 100,
            })
        );
    }

    #[test]
    fn test_first_breach_priority() {
        let acct = account();
        let mut record = params(&acct);
        record.max_open_orders = 1;
        record.max_long_exposure = 10;
        record.max_short_exposure = 10;

        let values = RiskValues {
            num_open_orders: 2,
            long_exposure: 11,
            short_exposure: 11,
            ..Default::default()
        };
        assert_eq!(
            values.first_breach(&record).map(|b| b.limit),
            Some(Limit::OpenOrders)
        );

        let values = RiskValues {
            long_exposure: 11,
            short_exposure: 11,
            ..Default::default()
        };
        assert_eq!(
            values.first_breach(&record).map(|b| b.limit),
            Some(Limit::LongExposure)
        );
    }

    #[test]
    fn test_breach_error_conversion() {
        let breach = Breach {
            limit: Limit::ShortExposure,
            current: 110,
            max: 100,
        };
        assert_eq!(breach.into_limit_exceeded().code(), 6005);
        assert_eq!(breach.into_setter_error().code(), 6004);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn order_strategy() -> impl Strategy<Value = (bool, i64)> {
            (any::<bool>(), 1i64..1_000_000)
        }

        proptest! {
            /// Invariant: projected exposures are never negative.
            #[test]
            fn exposures_non_negative(
                position in -1_000_000_000i64..1_000_000_000i64,
                unconsumed in -1_000_000i64..1_000_000i64,
                orders in prop::collection::vec(order_strategy(), 0..20),
            ) {
                let mut acct = account();
                if position != 0 {
                    let side = if position > 0 { Side::BUY } else { Side::SELL };
                    acct.apply_taker_fill(SOL, side, position.abs()).unwrap();
                    acct.consume_events(SOL).unwrap();
                }
                if unconsumed != 0 {
                    let side = if unconsumed > 0 { Side::BUY } else { Side::SELL };
                    acct.apply_taker_fill(SOL, side, unconsumed.abs()).unwrap();
                }
                for (is_bid, qty) in &orders {
                    let side = if *is_bid { Side::BUY } else { Side::SELL };
                    acct.place_limit_order(SOL, side, 100, *qty).unwrap();
                }

                let values = RiskValues::compute(Some(&acct), SOL).unwrap();
                prop_assert!(values.long_exposure >= 0);
                prop_assert!(values.short_exposure >= 0);
                prop_assert_eq!(values.num_open_orders, orders.len() as u64);
            }
        }
    }
}
