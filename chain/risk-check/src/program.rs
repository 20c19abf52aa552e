//! Instruction handlers
//!
//! Each handler runs against the ledger's staging state. Errors abort the
//! whole batch; the ledger discards staging so nothing a handler wrote
//! before failing survives.

use tracing::{debug, info, warn};
use types::ids::{Address, Authority, MarketIndex};

use crate::address::derive_risk_params_address;
use crate::config::ProgramConfig;
use crate::errors::RiskCheckError;
use crate::events::{RiskEvent, RiskEventType, RiskParamUpdate};
use crate::exposure::{Limit, RiskValues};
use crate::instruction::{Instruction, RiskCheckInstruction};
use crate::ledger::{LedgerState, StoredAccount};
use crate::remediation;
use crate::security::{require_authority, require_seeds};
use crate::state::{RiskParamsAccount, ViolationBehaviour};
use crate::venue::TradingVenue;

/// Execution context for a single instruction.
pub struct Context<'a> {
    pub signer: Authority,
    pub config: &'a ProgramConfig,
    pub state: &'a mut LedgerState,
}

/// Result of a passing `check_risk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// All limits held
    Pass,
    /// Limits held after cancelling `cancelled` orders
    Remediated { cancelled: usize },
}

/// What a successfully processed instruction produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionOutcome {
    Initialized(Address),
    Updated,
    Checked(CheckOutcome),
    Closed { reserve_returned: u64 },
    VenueApplied,
}

/// Dispatch one instruction.
pub fn process_instruction(
    ctx: &mut Context<'_>,
    instruction: &Instruction,
) -> Result<InstructionOutcome, RiskCheckError> {
    match instruction {
        Instruction::Venue(ix) => {
            ctx.state.venue.execute(&ctx.signer, ix)?;
            Ok(InstructionOutcome::VenueApplied)
        }
        Instruction::RiskCheck(ix) => process_risk_check(ctx, ix),
    }
}

fn process_risk_check(
    ctx: &mut Context<'_>,
    instruction: &RiskCheckInstruction,
) -> Result<InstructionOutcome, RiskCheckError> {
    use RiskCheckInstruction::*;
    match instruction {
        Initialize { market_index } => initialize(ctx, *market_index).map(InstructionOutcome::Initialized),
        SetMaxOpenOrders {
            risk_params_account,
            max_open_orders,
        } => set_max_open_orders(ctx, risk_params_account, *max_open_orders)
            .map(|_| InstructionOutcome::Updated),
        SetMaxLongExposure {
            risk_params_account,
            max_long_exposure,
        } => set_max_long_exposure(ctx, risk_params_account, *max_long_exposure)
            .map(|_| InstructionOutcome::Updated),
        SetMaxShortExposure {
            risk_params_account,
            max_short_exposure,
        } => set_max_short_exposure(ctx, risk_params_account, *max_short_exposure)
            .map(|_| InstructionOutcome::Updated),
        SetViolationBehaviour {
            risk_params_account,
            violation_behaviour,
        } => set_violation_behaviour(ctx, risk_params_account, *violation_behaviour)
            .map(|_| InstructionOutcome::Updated),
        CheckRisk {
            risk_params_account,
        } => check_risk(ctx, risk_params_account).map(InstructionOutcome::Checked),
        Close {
            risk_params_account,
        } => close(ctx, risk_params_account)
            .map(|reserve_returned| InstructionOutcome::Closed { reserve_returned }),
    }
}

// ───────────────────────── Lifecycle ─────────────────────────

/// Create the signer's record for `market_index` with unlimited defaults.
///
/// Parks the storage reserve on the record, debited from the signer.
pub fn initialize(
    ctx: &mut Context<'_>,
    market_index: MarketIndex,
) -> Result<Address, RiskCheckError> {
    let (address, bump) =
        derive_risk_params_address(&ctx.config.program_id, market_index, &ctx.signer)?;
    if ctx.state.records.contains_key(&address) {
        return Err(RiskCheckError::AlreadyExists { address });
    }

    let reserve = ctx.config.rent.minimum_balance(RiskParamsAccount::SPACE);
    ctx.state.debit(&ctx.signer, reserve)?;

    let record = RiskParamsAccount::new(ctx.signer, market_index, bump);
    ctx.state.records.insert(
        address,
        StoredAccount {
            lamports: reserve,
            data: record,
        },
    );

    info!(
        address = %address,
        authority = %ctx.signer,
        market_index = market_index.get(),
        reserve,
        "Risk params account initialized"
    );
    emit(
        ctx,
        address,
        market_index,
        RiskEventType::RiskAccountInitialized { reserve },
    );
    Ok(address)
}

/// Destroy the record and credit its reserve back to the authority.
pub fn close(ctx: &mut Context<'_>, address: &Address) -> Result<u64, RiskCheckError> {
    let record = load_authorized(ctx, address)?;
    let stored = ctx
        .state
        .records
        .remove(address)
        .ok_or(RiskCheckError::NotFound { address: *address })?;
    ctx.state.credit(&record.authority, stored.lamports)?;

    info!(
        address = %address,
        authority = %record.authority,
        reserve_returned = stored.lamports,
        "Risk params account closed"
    );
    emit(
        ctx,
        *address,
        record.market_index,
        RiskEventType::RiskAccountClosed {
            reserve_returned: stored.lamports,
        },
    );
    Ok(stored.lamports)
}

/// Read a record without authorization.
pub fn get_record<'s>(
    state: &'s LedgerState,
    address: &Address,
) -> Result<&'s RiskParamsAccount, RiskCheckError> {
    state
        .records
        .get(address)
        .map(|stored| &stored.data)
        .ok_or(RiskCheckError::NotFound { address: *address })
}

// ───────────────────────── Setters ─────────────────────────

pub fn set_max_open_orders(
    ctx: &mut Context<'_>,
    address: &Address,
    max_open_orders: u64,
) -> Result<(), RiskCheckError> {
    update_limit(
        ctx,
        address,
        Limit::OpenOrders,
        RiskParamUpdate::MaxOpenOrders(max_open_orders),
        |record| record.max_open_orders = max_open_orders,
    )
}

pub fn set_max_long_exposure(
    ctx: &mut Context<'_>,
    address: &Address,
    max_long_exposure: i64,
) -> Result<(), RiskCheckError> {
    if max_long_exposure < 0 {
        return Err(RiskCheckError::invalid_argument(format!(
            "max long exposure must be non-negative, got {max_long_exposure}"
        )));
    }
    update_limit(
        ctx,
        address,
        Limit::LongExposure,
        RiskParamUpdate::MaxLongExposure(max_long_exposure),
        |record| record.max_long_exposure = max_long_exposure,
    )
}

pub fn set_max_short_exposure(
    ctx: &mut Context<'_>,
    address: &Address,
    max_short_exposure: i64,
) -> Result<(), RiskCheckError> {
    if max_short_exposure < 0 {
        return Err(RiskCheckError::invalid_argument(format!(
            "max short exposure must be non-negative, got {max_short_exposure}"
        )));
    }
    update_limit(
        ctx,
        address,
        Limit::ShortExposure,
        RiskParamUpdate::MaxShortExposure(max_short_exposure),
        |record| record.max_short_exposure = max_short_exposure,
    )
}

/// Change the breach policy. Takes effect on the next `check_risk`.
pub fn set_violation_behaviour(
    ctx: &mut Context<'_>,
    address: &Address,
    violation_behaviour: ViolationBehaviour,
) -> Result<(), RiskCheckError> {
    let mut record = load_authorized(ctx, address)?;
    record.violation_behaviour = violation_behaviour;
    let market_index = record.market_index;
    store(ctx, address, record)?;

    info!(
        address = %address,
        behaviour = ?violation_behaviour,
        "Violation behaviour updated"
    );
    emit(
        ctx,
        *address,
        market_index,
        RiskEventType::RiskParamsUpdated(RiskParamUpdate::ViolationBehaviour(
            violation_behaviour,
        )),
    );
    Ok(())
}

/// Apply a new ceiling, refusing it if current state already breaches it.
fn update_limit(
    ctx: &mut Context<'_>,
    address: &Address,
    limit: Limit,
    update: RiskParamUpdate,
    apply: impl FnOnce(&mut RiskParamsAccount),
) -> Result<(), RiskCheckError> {
    let mut record = load_authorized(ctx, address)?;
    apply(&mut record);

    let values = risk_values(ctx, &record)?;
    if let Some(breach) = values.check(limit, &record) {
        return Err(breach.into_setter_error());
    }

    let market_index = record.market_index;
    store(ctx, address, record)?;
    debug!(address = %address, update = ?update, "Risk limit updated");
    emit(
        ctx,
        *address,
        market_index,
        RiskEventType::RiskParamsUpdated(update),
    );
    Ok(())
}

// ───────────────────────── Enforcement ─────────────────────────

/// Enforce the record's limits against the venue state as it stands now.
pub fn check_risk(ctx: &mut Context<'_>, address: &Address) -> Result<CheckOutcome, RiskCheckError> {
    let record = load_authorized(ctx, address)?;
    let values = risk_values(ctx, &record)?;

    let Some(breach) = values.first_breach(&record) else {
        return Ok(CheckOutcome::Pass);
    };

    warn!(
        address = %address,
        limit = %breach.limit,
        current = %breach.current,
        max = %breach.max,
        behaviour = ?record.violation_behaviour,
        "Risk limit breached"
    );
    emit(
        ctx,
        *address,
        record.market_index,
        RiskEventType::RiskLimitBreached {
            limit: breach.limit,
            current: breach.current,
            max: breach.max,
            behaviour: record.violation_behaviour,
        },
    );

    match record.violation_behaviour {
        ViolationBehaviour::RejectTransaction => Err(breach.into_limit_exceeded()),
        ViolationBehaviour::CancelAllOrders => {
            let cancelled = remediation::cancel_all_orders(
                &mut ctx.state.venue,
                &record.authority,
                record.market_index,
                ctx.config.cancel_limit,
            )?;
            warn!(
                address = %address,
                market_index = record.market_index.get(),
                cancelled,
                "Cancelled all orders to restore risk limits"
            );
            emit(
                ctx,
                *address,
                record.market_index,
                RiskEventType::OrdersCancelled { count: cancelled },
            );

            let values = risk_values(ctx, &record)?;
            match values.first_breach(&record) {
                Some(breach) => Err(breach.into_limit_exceeded()),
                None => Ok(CheckOutcome::Remediated { cancelled }),
            }
        }
    }
}

// ───────────────────────── Helpers ─────────────────────────

/// Load a record the signer is allowed to act on.
fn load_authorized(
    ctx: &Context<'_>,
    address: &Address,
) -> Result<RiskParamsAccount, RiskCheckError> {
    let record = get_record(ctx.state, address)?;
    require_authority(record, &ctx.signer)?;
    require_seeds(&ctx.config.program_id, address, record)?;
    Ok(record.clone())
}

fn store(
    ctx: &mut Context<'_>,
    address: &Address,
    record: RiskParamsAccount,
) -> Result<(), RiskCheckError> {
    let stored = ctx
        .state
        .records
        .get_mut(address)
        .ok_or(RiskCheckError::NotFound { address: *address })?;
    stored.data = record;
    Ok(())
}

fn risk_values(
    ctx: &Context<'_>,
    record: &RiskParamsAccount,
) -> Result<RiskValues, RiskCheckError> {
    let account = ctx.state.venue.trading_account(&record.authority);
    let values = RiskValues::compute(account, record.market_index)?;
    debug!(
        market_index = record.market_index.get(),
        position = values.position,
        unconsumed_position = values.unconsumed_position,
        num_open_orders = values.num_open_orders,
        long_exposure = values.long_exposure,
        short_exposure = values.short_exposure,
        "Computed risk values"
    );
    Ok(values)
}

fn emit(
    ctx: &mut Context<'_>,
    address: Address,
    market_index: MarketIndex,
    event_type: RiskEventType,
) {
    ctx.state
        .events
        .push(RiskEvent::new(address, ctx.signer, market_index, event_type));
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::Side;

    const SOL: MarketIndex = MarketIndex::new(3);
    const FUNDS: u64 = 10_000_000;

    fn setup() -> (ProgramConfig, LedgerState, Authority) {
        let owner = Authority::new();
        let mut state = LedgerState::default();
        state.credit(&owner, FUNDS).unwrap();
        (ProgramConfig::default(), state, owner)
    }

    fn ctx<'a>(
        config: &'a ProgramConfig,
        state: &'a mut LedgerState,
        signer: Authority,
    ) -> Context<'a> {
        Context {
            signer,
            config,
            state,
        }
    }

    #[test]
    fn test_initialize_defaults_and_reserve() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();

        let record = get_record(&state, &address).unwrap();
        assert_eq!(record.authority, owner);
        assert_eq!(record.max_long_exposure, i64::MAX);
        let reserve = config.rent.minimum_balance(RiskParamsAccount::SPACE);
        assert_eq!(state.balance(&owner), FUNDS - reserve);
        assert!(matches!(
            state.events[0].event_type,
            RiskEventType::RiskAccountInitialized { .. }
        ));
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        let result = initialize(&mut ctx(&config, &mut state, owner), SOL);
        assert_eq!(result, Err(RiskCheckError::AlreadyExists { address }));
    }

    #[test]
    fn test_initialize_without_funds() {
        let (config, mut state, _) = setup();
        let pauper = Authority::new();
        let result = initialize(&mut ctx(&config, &mut state, pauper), SOL);
        assert!(matches!(
            result,
            Err(RiskCheckError::InsufficientFunds { available: 0, .. })
        ));
    }

    #[test]
    fn test_setter_rechecks_current_state() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        let account = state.venue.account_mut(&owner);
        account.place_limit_order(SOL, Side::BUY, 100, 60).unwrap();

        let result = set_max_long_exposure(&mut ctx(&config, &mut state, owner), &address, 59);
        assert_eq!(
            result,
            Err(RiskCheckError::SetterBelowCurrent {
                limit: Limit::LongExposure,
                current: 60,
                requested: 59,
            })
        );
        assert_eq!(get_record(&state, &address).unwrap().max_long_exposure, i64::MAX);

        set_max_long_exposure(&mut ctx(&config, &mut state, owner), &address, 60).unwrap();
        assert_eq!(get_record(&state, &address).unwrap().max_long_exposure, 60);
    }

    #[test]
    fn test_negative_exposure_rejected() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        let result = set_max_short_exposure(&mut ctx(&config, &mut state, owner), &address, -1);
        assert!(matches!(result, Err(RiskCheckError::InvalidArgument { .. })));
    }

    #[test]
    fn test_other_signer_unauthorized() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        let intruder = Authority::new();
        let result = set_max_open_orders(&mut ctx(&config, &mut state, intruder), &address, 1);
        assert_eq!(result, Err(RiskCheckError::Unauthorized));
        let result = check_risk(&mut ctx(&config, &mut state, intruder), &address);
        assert_eq!(result, Err(RiskCheckError::Unauthorized));
    }

    #[test]
    fn test_check_risk_reject() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        set_max_open_orders(&mut ctx(&config, &mut state, owner), &address, 1).unwrap();
        let account = state.venue.account_mut(&owner);
        account.place_limit_order(SOL, Side::SELL, 100, 1).unwrap();
        account.place_limit_order(SOL, Side::SELL, 100, 1).unwrap();

        let result = check_risk(&mut ctx(&config, &mut state, owner), &address);
        assert_eq!(
            result,
            Err(RiskCheckError::LimitExceeded {
                limit: Limit::OpenOrders,
                current: 2,
                max: 1,
            })
        );
    }

    #[test]
    fn test_check_risk_remediates() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        set_max_short_exposure(&mut ctx(&config, &mut state, owner), &address, 100).unwrap();
        set_violation_behaviour(
            &mut ctx(&config, &mut state, owner),
            &address,
            ViolationBehaviour::CancelAllOrders,
        )
        .unwrap();
        let account = state.venue.account_mut(&owner);
        account.place_limit_order(SOL, Side::SELL, 100, 60).unwrap();
        account.place_limit_order(SOL, Side::SELL, 100, 50).unwrap();

        let outcome = check_risk(&mut ctx(&config, &mut state, owner), &address).unwrap();
        assert_eq!(outcome, CheckOutcome::Remediated { cancelled: 2 });
        let account = state.venue.trading_account(&owner).unwrap();
        assert_eq!(account.open_orders(SOL).count(), 0);
    }

    #[test]
    fn test_close_returns_reserve() {
        let (config, mut state, owner) = setup();
        let address = initialize(&mut ctx(&config, &mut state, owner), SOL).unwrap();
        let returned = close(&mut ctx(&config, &mut state, owner), &address).unwrap();
        assert_eq!(returned, config.rent.minimum_balance(RiskParamsAccount::SPACE));
        assert_eq!(state.balance(&owner), FUNDS);
        assert_eq!(
            get_record(&state, &address),
            Err(RiskCheckError::NotFound { address })
        );
    }
}
