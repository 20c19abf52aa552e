//! Risk events
//!
//! Events are immutable records emitted by instruction handlers. They are
//! appended to the ledger's log only when the containing batch commits.

use serde::{Deserialize, Serialize};
use types::ids::{Address, Authority, MarketIndex};
use uuid::Uuid;

use crate::exposure::Limit;
use crate::state::ViolationBehaviour;

/// A single parameter change applied by a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskParamUpdate {
    MaxOpenOrders(u64),
    MaxLongExposure(i64),
    MaxShortExposure(i64),
    ViolationBehaviour(ViolationBehaviour),
}

/// Risk event type classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskEventType {
    /// Record created; `reserve` lamports parked for storage
    RiskAccountInitialized { reserve: u64 },
    /// A limit or the violation policy changed
    RiskParamsUpdated(RiskParamUpdate),
    /// `check_risk` found a limit breached
    RiskLimitBreached {
        limit: Limit,
        current: i128,
        max: i128,
        behaviour: ViolationBehaviour,
    },
    /// Remediation cancelled resting orders
    OrdersCancelled { count: usize },
    /// Record destroyed and its reserve returned
    RiskAccountClosed { reserve_returned: u64 },
}

/// Event emitted by the risk-check program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: Uuid,
    pub risk_params_account: Address,
    pub authority: Authority,
    pub market_index: MarketIndex,
    pub event_type: RiskEventType,
}

impl RiskEvent {
    pub fn new(
        risk_params_account: Address,
        authority: Authority,
        market_index: MarketIndex,
        event_type: RiskEventType,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            risk_params_account,
            authority,
            market_index,
            event_type,
        }
    }
}
