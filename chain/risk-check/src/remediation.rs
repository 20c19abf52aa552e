//! Cancel-all remediation
//!
//! The venue cancels at most `cancel_limit` orders per call, so the guard
//! keeps calling until the market has no resting orders left.

use tracing::{debug, warn};
use types::ids::{Authority, MarketIndex};

use crate::errors::RiskCheckError;
use crate::venue::TradingVenue;

/// Cancel every resting order `owner` has on `market_index`.
///
/// Returns the total number cancelled.
pub fn cancel_all_orders<V: TradingVenue>(
    venue: &mut V,
    owner: &Authority,
    market_index: MarketIndex,
    cancel_limit: u8,
) -> Result<usize, RiskCheckError> {
    if cancel_limit == 0 {
        return Err(RiskCheckError::invalid_argument(
            "cancel limit must be positive",
        ));
    }

    let mut total = 0usize;
    while has_open_orders(venue, owner, market_index) {
        let cancelled = venue.cancel_all_orders(owner, market_index, cancel_limit)?;
        debug!(
            market_index = market_index.get(),
            cancelled, "Cancel-all round completed"
        );
        if cancelled == 0 {
            warn!(
                market_index = market_index.get(),
                "Venue cancelled nothing while orders remain"
            );
            break;
        }
        total += cancelled;
    }
    Ok(total)
}

fn has_open_orders<V: TradingVenue>(venue: &V, owner: &Authority, market_index: MarketIndex) -> bool {
    venue
        .trading_account(owner)
        .map(|account| account.open_orders(market_index).next().is_some())
        .unwrap_or(false)
}
