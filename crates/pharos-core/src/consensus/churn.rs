//! Exit churn accounting.
//!
//! Bounds how much validator balance can exit per epoch, spreading large
//! exits across future epochs so the active set cannot drain abruptly. The
//! limiter performs a read-modify-write on the electra churn fields
//! (`earliest_exit_epoch`, `exit_balance_to_consume`); callers must serialize
//! access to a given state.

use crate::consensus::epoch::{compute_activation_exit_epoch, compute_epoch_at_slot};
use crate::types::beacon::{BeaconState, ElectraState, Epoch, Gwei, Validator};
use crate::types::preset::ChainSpec;
use thiserror::Error;

/// Errors raised by churn accounting.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChurnError {
    #[error("Per-epoch churn limit is zero; the chain spec must guarantee a strictly positive floor")]
    ZeroChurnLimit,

    #[error("Exit balance accounting underflow: consuming {requested} Gwei with {available} Gwei available")]
    BalanceUnderflow { requested: Gwei, available: Gwei },

    #[error("Exit of {exit_balance} Gwei overflows churn capacity accounting")]
    CapacityOverflow { exit_balance: Gwei },
}

/// Sum of effective balances of validators active at `epoch`, floored at one
/// effective-balance increment so downstream divisions never see zero.
fn total_active_balance_at(validators: &[Validator], epoch: Epoch, spec: &ChainSpec) -> Gwei {
    let sum: Gwei = validators
        .iter()
        .filter(|validator| validator.is_active_at(epoch))
        .map(|validator| validator.effective_balance)
        .sum();
    sum.max(spec.effective_balance_increment)
}

fn balance_churn_limit_at(validators: &[Validator], epoch: Epoch, spec: &ChainSpec) -> Gwei {
    let churn = spec
        .min_per_epoch_churn_limit
        .max(total_active_balance_at(validators, epoch, spec) / spec.churn_limit_quotient);
    // Round down to a whole number of effective-balance increments.
    churn - churn % spec.effective_balance_increment
}

fn activation_exit_churn_limit_at(validators: &[Validator], epoch: Epoch, spec: &ChainSpec) -> Gwei {
    spec.max_per_epoch_activation_exit_churn_limit
        .min(balance_churn_limit_at(validators, epoch, spec))
}

/// Total active balance of the state at its current epoch.
pub fn get_total_active_balance(state: &BeaconState, spec: &ChainSpec) -> Gwei {
    let epoch = compute_epoch_at_slot(state.slot(), spec);
    total_active_balance_at(state.validators(), epoch, spec)
}

/// Per-epoch balance churn limit: total active balance scaled down by the
/// churn-limit quotient, floored at the spec minimum, rounded down to a whole
/// number of effective-balance increments. Strictly positive whenever the
/// spec's minimum is.
pub fn get_balance_churn_limit(state: &BeaconState, spec: &ChainSpec) -> Gwei {
    let epoch = compute_epoch_at_slot(state.slot(), spec);
    balance_churn_limit_at(state.validators(), epoch, spec)
}

/// Per-epoch activation/exit churn limit: the balance churn limit, capped at
/// the spec's activation/exit ceiling.
pub fn get_activation_exit_churn_limit(state: &BeaconState, spec: &ChainSpec) -> Gwei {
    let epoch = compute_epoch_at_slot(state.slot(), spec);
    activation_exit_churn_limit_at(state.validators(), epoch, spec)
}

/// Schedule an exit of `exit_balance` Gwei and update the state's churn
/// bookkeeping.
///
/// Returns the epoch at which the exit becomes effective. The earliest exit
/// epoch never decreases across calls. Taking [`ElectraState`] directly keeps
/// pre-electra states out by construction; route through
/// [`BeaconState::as_electra_mut`] first.
pub fn compute_exit_epoch_and_update_churn(
    state: &mut ElectraState,
    exit_balance: Gwei,
    spec: &ChainSpec,
) -> Result<Epoch, ChurnError> {
    let current_epoch = compute_epoch_at_slot(state.slot, spec);

    // 1. The exit can land no earlier than the activation/exit lookahead
    // allows, and never earlier than what previous exits already claimed.
    let mut earliest_exit_epoch = state
        .earliest_exit_epoch
        .max(compute_activation_exit_epoch(current_epoch, spec));

    // 2. Per-epoch capacity for this state.
    let per_epoch_churn =
        activation_exit_churn_limit_at(&state.validators, current_epoch, spec);
    if per_epoch_churn == 0 {
        return Err(ChurnError::ZeroChurnLimit);
    }

    // 3. Rolling into a new churn epoch resets the allotment; otherwise the
    // remaining capacity carries forward.
    let mut exit_balance_to_consume = if state.earliest_exit_epoch < earliest_exit_epoch {
        per_epoch_churn
    } else {
        state.exit_balance_to_consume
    };

    // 4. An exit larger than the remaining capacity spills into as many
    // additional epochs as needed, growing capacity to match. Gwei must
    // never silently wrap, so the growth arithmetic is checked.
    if exit_balance > exit_balance_to_consume {
        let balance_to_process = exit_balance - exit_balance_to_consume;
        let additional_epochs = (balance_to_process - 1) / per_epoch_churn + 1;
        let overflow = ChurnError::CapacityOverflow { exit_balance };
        earliest_exit_epoch = earliest_exit_epoch
            .checked_add(additional_epochs)
            .ok_or(overflow.clone())?;
        exit_balance_to_consume = additional_epochs
            .checked_mul(per_epoch_churn)
            .and_then(|grown| exit_balance_to_consume.checked_add(grown))
            .ok_or(overflow)?;
    }

    // 5. Consume the requested balance. Capacity was grown above, so this
    // cannot underflow on any input that passed steps 3 and 4.
    state.exit_balance_to_consume = exit_balance_to_consume
        .checked_sub(exit_balance)
        .ok_or(ChurnError::BalanceUnderflow {
            requested: exit_balance,
            available: exit_balance_to_consume,
        })?;
    state.earliest_exit_epoch = earliest_exit_epoch;

    // 6. The exit becomes effective at the updated earliest exit epoch.
    Ok(state.earliest_exit_epoch)
}
