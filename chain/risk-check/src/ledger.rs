//! Atomic batch ledger
//!
//! Owns record storage, authority balances, the perpetuals venue, and the
//! event log. A batch runs against a staging copy of the state which is
//! swapped in only when every instruction succeeds, so a failed batch
//! leaves no trace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info};
use types::account::TradingAccount;
use types::ids::{Address, Authority};

use crate::config::ProgramConfig;
use crate::errors::{LedgerError, RiskCheckError};
use crate::events::RiskEvent;
use crate::instruction::Batch;
use crate::program::{self, Context, InstructionOutcome};
use crate::state::RiskParamsAccount;
use crate::venue::{PerpVenue, TradingVenue};

/// A record plus the reserve parked on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAccount {
    pub lamports: u64,
    pub data: RiskParamsAccount,
}

/// Everything a batch can touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub records: BTreeMap<Address, StoredAccount>,
    pub balances: BTreeMap<Authority, u64>,
    pub venue: PerpVenue,
    pub events: Vec<RiskEvent>,
}

impl LedgerState {
    pub fn balance(&self, authority: &Authority) -> u64 {
        self.balances.get(authority).copied().unwrap_or(0)
    }

    /// Add `amount` to an authority's balance.
    pub fn credit(&mut self, authority: &Authority, amount: u64) -> Result<(), RiskCheckError> {
        let balance = self.balances.entry(*authority).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(RiskCheckError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove `amount` from an authority's balance.
    pub fn debit(&mut self, authority: &Authority, amount: u64) -> Result<(), RiskCheckError> {
        let available = self.balance(authority);
        if available < amount {
            return Err(RiskCheckError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        self.balances.insert(*authority, available - amount);
        Ok(())
    }
}

/// Receipt for a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub slot: u64,
    pub outcomes: Vec<InstructionOutcome>,
    pub events: Vec<RiskEvent>,
}

/// Sequencer executing batches one at a time.
#[derive(Debug, Clone)]
pub struct Ledger {
    config: ProgramConfig,
    state: LedgerState,
    slot: u64,
}

impl Ledger {
    pub fn new(config: ProgramConfig) -> Self {
        info!(
            program_id = %config.program_id,
            cancel_limit = config.cancel_limit,
            require_check_risk_last = config.require_check_risk_last,
            "Ledger initialized"
        );
        Self {
            config,
            state: LedgerState::default(),
            slot: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ProgramConfig::default())
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Number of committed batches.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Fund an authority outside of any batch.
    pub fn airdrop(&mut self, authority: &Authority, amount: u64) -> Result<(), LedgerError> {
        self.state
            .credit(authority, amount)
            .map_err(|_| LedgerError::BalanceOverflow {
                authority: authority.to_string(),
            })
    }

    pub fn balance(&self, authority: &Authority) -> u64 {
        self.state.balance(authority)
    }

    /// Execute a batch atomically.
    ///
    /// On error the ledger is exactly as it was before the call.
    pub fn execute(&mut self, batch: &Batch) -> Result<BatchReceipt, LedgerError> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        if self.config.require_check_risk_last {
            if let Some(index) = batch.first_check_risk() {
                let trailing = batch.len() - index - 1;
                if trailing > 0 {
                    error!(index, trailing, "Rejecting batch: check_risk is not last");
                    return Err(LedgerError::CheckRiskNotLast { index, trailing });
                }
            }
        }

        let mut staging = self.state.clone();
        let first_new_event = staging.events.len();
        let mut outcomes = Vec::with_capacity(batch.len());

        for (index, instruction) in batch.instructions.iter().enumerate() {
            let mut ctx = Context {
                signer: batch.signer,
                config: &self.config,
                state: &mut staging,
            };
            match program::process_instruction(&mut ctx, instruction) {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => {
                    error!(
                        signer = %batch.signer,
                        index,
                        code = source.code(),
                        error = %source,
                        "Batch aborted"
                    );
                    return Err(LedgerError::InstructionFailed { index, source });
                }
            }
        }

        let events = staging.events[first_new_event..].to_vec();
        self.state = staging;
        self.slot += 1;
        debug!(
            slot = self.slot,
            instructions = batch.len(),
            events = events.len(),
            "Batch committed"
        );

        Ok(BatchReceipt {
            slot: self.slot,
            outcomes,
            events,
        })
    }

    /// Read a record without authorization.
    pub fn get_record(&self, address: &Address) -> Result<&RiskParamsAccount, RiskCheckError> {
        program::get_record(&self.state, address)
    }

    /// Reserve parked on a record, if it exists.
    pub fn record_reserve(&self, address: &Address) -> Option<u64> {
        self.state.records.get(address).map(|stored| stored.lamports)
    }

    pub fn venue(&self) -> &PerpVenue {
        &self.state.venue
    }

    pub fn trading_account(&self, owner: &Authority) -> Option<&TradingAccount> {
        self.state.venue.trading_account(owner)
    }

    /// Snapshot of the full committed state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn events(&self) -> &[RiskEvent] {
        &self.state.events
    }

    /// Take all committed events, clearing the log.
    pub fn drain_events(&mut self) -> Vec<RiskEvent> {
        std::mem::take(&mut self.state.events)
    }
}
