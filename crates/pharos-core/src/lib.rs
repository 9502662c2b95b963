//! # Pharos Core
//!
//! Deterministic core of a beacon-chain consensus client.
//!
//! This crate contains **no networking code** and **no persistence**. It is
//! the arithmetic and cryptographic heart of Pharos: the rules where any
//! deviation from the protocol forks the chain.
//!
//! ## What lives here
//!
//! - **Epoch arithmetic** (`consensus::epoch`): pure slot/epoch conversions
//!   over an explicitly passed [`ChainSpec`]. No globals, no failure modes.
//!
//! - **Exit churn accounting** (`consensus::churn`): the stateful economic
//!   rule bounding how much validator balance may exit per epoch, spreading
//!   oversized exits across future epochs.
//!
//! - **BLS signatures** (`bls`): BLS12-381 key, signature and aggregation
//!   primitives in Ethereum's `min_pk` flavor, used to authenticate validator
//!   messages before they enter the state transition.
//!
//! ## Usage
//!
//! ```ignore
//! use pharos_core::{compute_exit_epoch_and_update_churn, ChainSpec};
//! use pharos_core::bls::{self, Message, SecretKey};
//!
//! assert!(bls::init());
//! let spec = ChainSpec::mainnet();
//! ```

pub mod bls;
pub mod consensus;
pub mod types;

// Re-export commonly used items for convenience
pub use bls::{BlsError, Message, PublicKey, SecretKey, Signature};
pub use consensus::{
    churn::{
        compute_exit_epoch_and_update_churn, get_activation_exit_churn_limit,
        get_balance_churn_limit, get_total_active_balance, ChurnError,
    },
    epoch::{
        compute_activation_exit_epoch, compute_epoch_at_slot, compute_start_slot_at_epoch,
        get_current_epoch, get_previous_epoch,
    },
};
pub use types::{beacon::*, preset::ChainSpec};
