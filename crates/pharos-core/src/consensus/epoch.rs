//! Slot/epoch arithmetic.
//!
//! Pure integer functions over caller-owned values. Every function takes the
//! governing [`ChainSpec`] explicitly; nothing here reads global state.

use crate::types::beacon::{BeaconState, Epoch, Slot, GENESIS_EPOCH};
use crate::types::preset::ChainSpec;

/// Epoch containing the given slot: floor division by the epoch length.
pub fn compute_epoch_at_slot(slot: Slot, spec: &ChainSpec) -> Epoch {
    slot / spec.slots_per_epoch
}

/// Epoch of the state's current slot.
pub fn get_current_epoch(state: &BeaconState, spec: &ChainSpec) -> Epoch {
    compute_epoch_at_slot(state.slot(), spec)
}

/// Epoch before the current one, clamped at genesis. Never underflows.
pub fn get_previous_epoch(state: &BeaconState, spec: &ChainSpec) -> Epoch {
    let current_epoch = get_current_epoch(state, spec);
    if current_epoch == GENESIS_EPOCH {
        GENESIS_EPOCH
    } else {
        current_epoch - 1
    }
}

/// First slot of the given epoch. Saturates at `u64::MAX` for epochs beyond
/// the representable slot range (e.g. a far-future sentinel).
pub fn compute_start_slot_at_epoch(epoch: Epoch, spec: &ChainSpec) -> Slot {
    epoch.saturating_mul(spec.slots_per_epoch)
}

/// Earliest epoch at which an activation or exit initiated during `epoch`
/// can become effective: the next epoch plus the seed lookahead. Saturates
/// at `u64::MAX` rather than wrapping on sentinel epochs.
pub fn compute_activation_exit_epoch(epoch: Epoch, spec: &ChainSpec) -> Epoch {
    epoch.saturating_add(1).saturating_add(spec.max_seed_lookahead)
}
