use crate::types::beacon::Gwei;
use serde::{Deserialize, Serialize};

/// The consensus parameters a computation runs under.
///
/// The protocol reference treats the active preset/config as process-global
/// selectable state. Here it is an explicit value passed into every call that
/// needs it: callers (and tests) construct the spec they want and thread it
/// through, so two computations under different presets can coexist in one
/// process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    /// Number of slots in one epoch. Must be nonzero.
    pub slots_per_epoch: u64,
    /// Minimum lookahead, in epochs, before an activation or exit becomes
    /// effective. Guards against last-moment committee manipulation.
    pub max_seed_lookahead: u64,
    /// Granularity of effective balances, in Gwei.
    pub effective_balance_increment: Gwei,
    /// Divisor applied to total active balance when deriving the balance
    /// churn limit.
    pub churn_limit_quotient: u64,
    /// Floor on the per-epoch balance churn limit, in Gwei.
    pub min_per_epoch_churn_limit: Gwei,
    /// Cap on the per-epoch activation/exit churn limit, in Gwei.
    pub max_per_epoch_activation_exit_churn_limit: Gwei,
}

impl ChainSpec {
    /// Mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            max_seed_lookahead: 4,
            effective_balance_increment: 1_000_000_000,
            churn_limit_quotient: 65_536,
            min_per_epoch_churn_limit: 128_000_000_000,
            max_per_epoch_activation_exit_churn_limit: 256_000_000_000,
        }
    }

    /// Minimal (testing) parameters: short epochs, aggressive churn.
    pub fn minimal() -> Self {
        Self {
            slots_per_epoch: 8,
            max_seed_lookahead: 4,
            effective_balance_increment: 1_000_000_000,
            churn_limit_quotient: 32,
            min_per_epoch_churn_limit: 64_000_000_000,
            max_per_epoch_activation_exit_churn_limit: 128_000_000_000,
        }
    }

    /// Load a spec from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
