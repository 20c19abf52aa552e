//! Instructions and batches
//!
//! A batch is an ordered list of instructions submitted under one signer.
//! Risk-check instructions and venue instructions may be mixed freely; the
//! usual shape is venue actions followed by a trailing `CheckRisk`.

use serde::{Deserialize, Serialize};
use types::ids::{Address, Authority, MarketIndex, OrderId};
use types::order::{OrderType, Side};

use crate::state::ViolationBehaviour;

/// Instructions handled by the risk-check program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCheckInstruction {
    /// Create the signer's record for a market
    Initialize { market_index: MarketIndex },
    SetMaxOpenOrders {
        risk_params_account: Address,
        max_open_orders: u64,
    },
    SetMaxLongExposure {
        risk_params_account: Address,
        max_long_exposure: i64,
    },
    SetMaxShortExposure {
        risk_params_account: Address,
        max_short_exposure: i64,
    },
    SetViolationBehaviour {
        risk_params_account: Address,
        violation_behaviour: ViolationBehaviour,
    },
    /// Enforce the record's limits against the current venue state
    CheckRisk { risk_params_account: Address },
    /// Destroy the record and return its reserve to the authority
    Close { risk_params_account: Address },
}

impl RiskCheckInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::SetMaxOpenOrders { .. } => "set_max_open_orders",
            Self::SetMaxLongExposure { .. } => "set_max_long_exposure",
            Self::SetMaxShortExposure { .. } => "set_max_short_exposure",
            Self::SetViolationBehaviour { .. } => "set_violation_behaviour",
            Self::CheckRisk { .. } => "check_risk",
            Self::Close { .. } => "close",
        }
    }
}

/// Instructions forwarded to the perpetuals venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VenueInstruction {
    PlacePerpOrder {
        market_index: MarketIndex,
        side: Side,
        price: i64,
        quantity: i64,
        order_type: OrderType,
    },
    CancelPerpOrder { order_id: OrderId },
    CancelAllPerpOrders { market_index: MarketIndex, limit: u8 },
    /// Settle unconsumed taker fills into the position
    ConsumeEvents { market_index: MarketIndex },
}

/// Any instruction that may appear in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    RiskCheck(RiskCheckInstruction),
    Venue(VenueInstruction),
}

impl Instruction {
    pub fn is_check_risk(&self) -> bool {
        matches!(
            self,
            Instruction::RiskCheck(RiskCheckInstruction::CheckRisk { .. })
        )
    }
}

impl From<RiskCheckInstruction> for Instruction {
    fn from(ix: RiskCheckInstruction) -> Self {
        Instruction::RiskCheck(ix)
    }
}

impl From<VenueInstruction> for Instruction {
    fn from(ix: VenueInstruction) -> Self {
        Instruction::Venue(ix)
    }
}

/// Ordered instructions executed atomically under one signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub signer: Authority,
    pub instructions: Vec<Instruction>,
}

impl Batch {
    pub fn new(signer: Authority) -> Self {
        Self {
            signer,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instruction: impl Into<Instruction>) {
        self.instructions.push(instruction.into());
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, instruction: impl Into<Instruction>) -> Self {
        self.push(instruction);
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Index of the first `CheckRisk`, if any.
    pub fn first_check_risk(&self) -> Option<usize> {
        self.instructions.iter().position(Instruction::is_check_risk)
    }
}
