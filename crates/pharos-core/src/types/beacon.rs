use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest fixed-duration time unit of the chain, counted since genesis.
pub type Slot = u64;

/// A fixed-size span of consecutive slots; the chain's unit of validator-set
/// and economic accounting.
pub type Epoch = u64;

/// Balance unit for validator stakes and churn accounting. Never negative,
/// never silently wrapped: any subtraction that could underflow must be
/// checked.
pub type Gwei = u64;

/// Slot of the genesis block.
pub const GENESIS_SLOT: Slot = 0;

/// Epoch of the genesis block.
pub const GENESIS_EPOCH: Epoch = 0;

/// Sentinel epoch for validators that have not scheduled the event yet.
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

/// Number of bytes in a compressed BLS12-381 public key.
pub const BLS_PUBKEY_LEN: usize = 48;

/// The raw compressed bytes of a validator's BLS public key.
///
/// Validators store keys in wire form; decompression and group checks are
/// deferred to the signature layer via [`decompress`](Self::decompress).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyBytes(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for PublicKeyBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl PublicKeyBytes {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("Invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Decompress and group-check the key for use in signature verification.
    pub fn decompress(&self) -> Result<crate::bls::PublicKey, crate::bls::BlsError> {
        crate::bls::PublicKey::deserialize(&self.0)
    }
}

/// A registered validator, as recorded in the beacon state.
/// Consumed read-only by this crate; registry mutation lives upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Compressed BLS public key the validator signs with.
    pub pubkey: PublicKeyBytes,
    /// Stake counted for rewards, penalties and churn, in Gwei.
    pub effective_balance: Gwei,
    /// Whether the validator has been slashed.
    pub slashed: bool,
    /// Epoch at which the validator became eligible for activation.
    pub activation_eligibility_epoch: Epoch,
    /// Epoch at which the validator became (or becomes) active.
    pub activation_epoch: Epoch,
    /// Epoch at which the validator exits, `FAR_FUTURE_EPOCH` if none scheduled.
    pub exit_epoch: Epoch,
    /// Epoch at which the stake becomes withdrawable.
    pub withdrawable_epoch: Epoch,
}

impl Validator {
    /// A validator is active from its activation epoch (inclusive) up to its
    /// exit epoch (exclusive).
    pub fn is_active_at(&self, epoch: Epoch) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}

/// Errors raised by fork-gated state access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("State fork {fork} has no exit churn fields (requires electra or later)")]
    PreElectraFork { fork: &'static str },
}

/// Beacon state payload for the phase0 fork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase0State {
    pub slot: Slot,
    pub validators: Vec<Validator>,
}

/// Beacon state payload for the altair fork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltairState {
    pub slot: Slot,
    pub validators: Vec<Validator>,
}

/// Beacon state payload for the electra fork. Electra introduced single-pass
/// exit-balance churn accounting, so only this payload carries the two churn
/// fields the exit limiter mutates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectraState {
    pub slot: Slot,
    pub validators: Vec<Validator>,
    /// Earliest epoch at which the next exit can become effective.
    /// Monotonically non-decreasing across limiter calls.
    pub earliest_exit_epoch: Epoch,
    /// Exit balance capacity remaining in the current churn epoch.
    pub exit_balance_to_consume: Gwei,
}

/// The beacon state across hard forks.
///
/// Forks share a common core (slot, validator registry) exposed through
/// shared accessors; fields that only exist from a given fork onward are
/// reached through fork-gated accessors that fail on earlier variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fork", rename_all = "snake_case")]
pub enum BeaconState {
    Phase0(Phase0State),
    Altair(AltairState),
    Electra(ElectraState),
}

impl BeaconState {
    /// Human-readable fork name, matching the serde tag.
    pub fn fork_name(&self) -> &'static str {
        match self {
            BeaconState::Phase0(_) => "phase0",
            BeaconState::Altair(_) => "altair",
            BeaconState::Electra(_) => "electra",
        }
    }

    /// Current slot, common to every fork.
    pub fn slot(&self) -> Slot {
        match self {
            BeaconState::Phase0(state) => state.slot,
            BeaconState::Altair(state) => state.slot,
            BeaconState::Electra(state) => state.slot,
        }
    }

    /// Validator registry, common to every fork.
    pub fn validators(&self) -> &[Validator] {
        match self {
            BeaconState::Phase0(state) => &state.validators,
            BeaconState::Altair(state) => &state.validators,
            BeaconState::Electra(state) => &state.validators,
        }
    }

    /// Fork-gated access to the churn fields. Pre-electra states have none.
    pub fn as_electra(&self) -> Result<&ElectraState, StateError> {
        match self {
            BeaconState::Electra(state) => Ok(state),
            other => Err(StateError::PreElectraFork {
                fork: other.fork_name(),
            }),
        }
    }

    /// Mutable fork-gated access, for the exit churn limiter.
    pub fn as_electra_mut(&mut self) -> Result<&mut ElectraState, StateError> {
        match self {
            BeaconState::Electra(state) => Ok(state),
            other => Err(StateError::PreElectraFork {
                fork: other.fork_name(),
            }),
        }
    }
}
