//! Tunable parameters for the synaptic fabric and plasticity engine.
//!
//! The exact functional form of per-hop decay and the consolidation
//! threshold are deliberately configuration, not hardcoded formulas; the
//! defaults below are the values the system was tuned with.

use crate::error::{Result, WeaveError};
use serde::{Deserialize, Serialize};

/// Configuration for the fabric and its learning dynamics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricConfig {
    /// Upper bound on every synapse weight (default: 1.0).
    pub w_max: f64,
    /// Hebbian learning rate (default: 0.1).
    pub learning_rate: f64,
    /// Per-hop exponential attenuation of spreading activation
    /// (default: 0.5; each hop carries half the signal onward).
    pub hop_decay: f64,
    /// Neurons below this level are excluded from propagation results,
    /// keeping most of the graph silent (default: 0.05).
    pub activation_threshold: f64,
    /// Energy budget used by `encode` when the caller does not supply one
    /// (default: 10.0).
    pub default_energy_budget: f64,
    /// Depth limit used by `encode` (default: 3).
    pub default_max_depth: u32,
    /// Cap on the total outgoing weight of any neuron; exceeding it
    /// triggers homeostatic renormalization (default: 5.0).
    pub homeostatic_cap: f64,
    /// Synapses below this weight are candidates for forgetting
    /// (default: 0.05).
    pub prune_epsilon: f64,
    /// Cycles a weak synapse may go unreinforced before the forgetting
    /// pass removes it (default: 3).
    pub ttl_cycles: u64,
    /// Laplace smoothing constant for relation confidence
    /// `support / (support + k)` (default: 1.0).
    pub smoothing_k: f64,
    /// Per-cycle decay applied to residual neuron activation
    /// (default: 0.9, the retained fraction).
    pub neuron_decay: f64,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            w_max: 1.0,
            learning_rate: 0.1,
            hop_decay: 0.5,
            activation_threshold: 0.05,
            default_energy_budget: 10.0,
            default_max_depth: 3,
            homeostatic_cap: 5.0,
            prune_epsilon: 0.05,
            ttl_cycles: 3,
            smoothing_k: 1.0,
            neuron_decay: 0.9,
        }
    }
}

impl FabricConfig {
    /// Validate that all tunables are within sane ranges.
    pub fn validate(&self) -> Result<()> {
        // NaN slips through every range comparison below; reject it first.
        let fields = [
            ("w_max", self.w_max),
            ("learning_rate", self.learning_rate),
            ("hop_decay", self.hop_decay),
            ("activation_threshold", self.activation_threshold),
            ("default_energy_budget", self.default_energy_budget),
            ("homeostatic_cap", self.homeostatic_cap),
            ("prune_epsilon", self.prune_epsilon),
            ("smoothing_k", self.smoothing_k),
            ("neuron_decay", self.neuron_decay),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(WeaveError::config_invalid(
                    name,
                    value.to_string(),
                    "must be finite",
                ));
            }
        }
        if self.w_max <= 0.0 {
            return Err(WeaveError::config_out_of_range("w_max", f64::MIN_POSITIVE, f64::MAX, self.w_max));
        }
        if self.learning_rate <= 0.0 || self.learning_rate > self.w_max {
            return Err(WeaveError::config_out_of_range(
                "learning_rate",
                0.0,
                self.w_max,
                self.learning_rate,
            ));
        }
        if !(0.0..=1.0).contains(&self.hop_decay) {
            return Err(WeaveError::config_out_of_range("hop_decay", 0.0, 1.0, self.hop_decay));
        }
        if self.activation_threshold < 0.0 {
            return Err(WeaveError::config_out_of_range(
                "activation_threshold",
                0.0,
                f64::MAX,
                self.activation_threshold,
            ));
        }
        if self.default_energy_budget <= 0.0 {
            return Err(WeaveError::config_out_of_range(
                "default_energy_budget",
                f64::MIN_POSITIVE,
                f64::MAX,
                self.default_energy_budget,
            ));
        }
        if self.homeostatic_cap < self.w_max {
            return Err(WeaveError::config_out_of_range(
                "homeostatic_cap",
                self.w_max,
                f64::MAX,
                self.homeostatic_cap,
            ));
        }
        if self.prune_epsilon < 0.0 || self.prune_epsilon > self.w_max {
            return Err(WeaveError::config_out_of_range(
                "prune_epsilon",
                0.0,
                self.w_max,
                self.prune_epsilon,
            ));
        }
        if self.smoothing_k <= 0.0 {
            return Err(WeaveError::config_out_of_range(
                "smoothing_k",
                f64::MIN_POSITIVE,
                f64::MAX,
                self.smoothing_k,
            ));
        }
        if !(0.0..=1.0).contains(&self.neuron_decay) {
            return Err(WeaveError::config_out_of_range(
                "neuron_decay",
                0.0,
                1.0,
                self.neuron_decay,
            ));
        }
        Ok(())
    }
}
