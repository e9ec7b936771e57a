//! The plasticity engine: Hebbian reinforcement, homeostatic
//! normalization, and the forgetting pass.
//!
//! Consumes propagation results from the fabric. Neurons that fire
//! together wire together; neurons whose outgoing weight runs away get
//! scaled back; synapses that stay weak and unused get pruned in SLEEP.

use crate::config::FabricConfig;
use crate::error::Result;
use crate::fabric::Fabric;
use crate::types::{ActivationEvent, NeuronId, PrunedSynapse};

/// Bounds on the learning-rate modulation factor (valence analog).
const MODULATION_MIN: f64 = 0.1;
const MODULATION_MAX: f64 = 2.0;

/// Outcome of one Hebbian pass, for the runtime's logging.
#[derive(Debug, Clone, Default)]
pub struct HebbianOutcome {
    /// Synapse updates applied (including newly created synapses).
    pub reinforced: usize,
    /// Neurons whose outgoing weight exceeded the homeostatic cap and
    /// were renormalized. Non-fatal; reported so the runtime can log it.
    pub renormalized: Vec<NeuronId>,
}

/// Applies learning dynamics to a fabric.
#[derive(Debug, Clone)]
pub struct PlasticityEngine {
    config: FabricConfig,
    /// Multiplier on the effective learning rate, clamped to
    /// `[0.1, 2.0]`. Driven by the affect of recent experience.
    modulation: f64,
}

impl PlasticityEngine {
    pub fn new(config: FabricConfig) -> Self {
        Self {
            config,
            modulation: 1.0,
        }
    }

    pub fn modulation(&self) -> f64 {
        self.modulation
    }

    /// Set the learning-rate modulation factor, clamped into bounds.
    pub fn set_modulation(&mut self, factor: f64) {
        self.modulation = factor.clamp(MODULATION_MIN, MODULATION_MAX);
    }

    /// Hebbian pass over one propagation event.
    ///
    /// For every ordered pair of co-activated neurons the connecting
    /// synapse gains `learning_rate * modulation * act(src) * act(dst)`,
    /// created on first co-activation and clamped to `[0, w_max]`.
    /// Afterwards any source whose outgoing sum exceeds the homeostatic
    /// cap is scaled back proportionally.
    pub fn apply_hebbian(&self, fabric: &mut Fabric, event: &ActivationEvent) -> Result<HebbianOutcome> {
        let rate = self.config.learning_rate * self.modulation;
        let mut outcome = HebbianOutcome::default();

        let fired: Vec<(NeuronId, f64)> = event.levels.iter().map(|(&id, &l)| (id, l)).collect();
        for &(source, source_level) in &fired {
            for &(target, target_level) in &fired {
                if source == target {
                    continue;
                }
                let delta = rate * source_level * target_level;
                fabric.reinforce(source, target, delta)?;
                outcome.reinforced += 1;
            }
        }

        for &(source, _) in &fired {
            if self.normalize_outgoing(fabric, source)? {
                outcome.renormalized.push(source);
            }
        }

        Ok(outcome)
    }

    /// Homeostatic normalization for one neuron. Returns true when the
    /// outgoing sum exceeded the cap and was scaled back.
    pub fn normalize_outgoing(&self, fabric: &mut Fabric, source: NeuronId) -> Result<bool> {
        let sum = fabric.outgoing_sum(source);
        if sum <= self.config.homeostatic_cap {
            return Ok(false);
        }
        fabric.scale_outgoing(source, self.config.homeostatic_cap / sum)?;
        Ok(true)
    }

    /// Strengthen every ordered pair within a consolidated pattern
    /// directly, bypassing the real-time propagation path. Weights are
    /// raised to at least `floor` (and clamped to `w_max`); already
    /// stronger synapses are left alone, so the operation is idempotent.
    pub fn strengthen_pattern(&self, fabric: &mut Fabric, neurons: &[NeuronId], floor: f64) -> Result<usize> {
        let floor = floor.min(self.config.w_max);
        let mut strengthened = 0;
        for &source in neurons {
            for &target in neurons {
                if source == target {
                    continue;
                }
                let current = fabric.synapse(source, target).map(|s| s.weight).unwrap_or(0.0);
                if current < floor {
                    fabric.reinforce(source, target, floor - current)?;
                    strengthened += 1;
                }
            }
        }
        Ok(strengthened)
    }

    /// Forgetting pass (SLEEP only): drop synapses below epsilon that
    /// have gone unreinforced beyond the TTL.
    pub fn prune(&self, fabric: &mut Fabric) -> Result<Vec<PrunedSynapse>> {
        fabric.prune_synapses(self.config.prune_epsilon, self.config.ttl_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NeuronKind;

    fn setup() -> (Fabric, PlasticityEngine, NeuronId, NeuronId) {
        let config = FabricConfig::default();
        let mut fabric = Fabric::new(config.clone()).unwrap();
        let a = fabric.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = fabric.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        (fabric, PlasticityEngine::new(config), a, b)
    }

    fn event_for(pairs: &[(NeuronId, f64)]) -> ActivationEvent {
        let mut event = ActivationEvent::default();
        for &(id, level) in pairs {
            event.levels.insert(id, level);
        }
        event
    }

    #[test]
    fn co_activation_strictly_increases_weight_up_to_cap() {
        let (mut fabric, engine, a, b) = setup();
        let event = event_for(&[(a, 1.0), (b, 1.0)]);

        // Ten co-activations at learning rate 0.1, cap 1.0: the weight
        // climbs toward 1.0 and never exceeds it.
        let mut last = 0.0;
        for _ in 0..10 {
            engine.apply_hebbian(&mut fabric, &event).unwrap();
            let w = fabric.synapse(a, b).unwrap().weight;
            assert!(w > last || w == 1.0, "weight must not decrease");
            assert!(w <= 1.0);
            last = w;
        }
        assert!((last - 1.0).abs() < 1e-9);
    }

    #[test]
    fn creates_synapses_on_first_co_activation() {
        let (mut fabric, engine, a, b) = setup();
        assert!(fabric.synapse(a, b).is_none());
        let outcome = engine
            .apply_hebbian(&mut fabric, &event_for(&[(a, 0.5), (b, 0.5)]))
            .unwrap();
        assert_eq!(outcome.reinforced, 2); // a->b and b->a
        assert!(fabric.synapse(a, b).is_some());
        assert!(fabric.synapse(b, a).is_some());
    }

    #[test]
    fn hebbian_delta_scales_with_activation_product() {
        let (mut fabric, engine, a, b) = setup();
        engine
            .apply_hebbian(&mut fabric, &event_for(&[(a, 0.5), (b, 0.2)]))
            .unwrap();
        let w = fabric.synapse(a, b).unwrap().weight;
        assert!((w - 0.1 * 0.5 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn homeostatic_cap_rescales_proportionally() {
        let config = FabricConfig {
            homeostatic_cap: 1.0,
            ..Default::default()
        };
        let mut fabric = Fabric::new(config.clone()).unwrap();
        let engine = PlasticityEngine::new(config);
        let hub = fabric.get_or_create_neuron("hub", NeuronKind::Concept).unwrap();
        let mut spokes = Vec::new();
        for i in 0..4 {
            let s = fabric.get_or_create_neuron(&format!("s{i}"), NeuronKind::Concept).unwrap();
            fabric.reinforce(hub, s, 0.5).unwrap();
            spokes.push(s);
        }
        assert!((fabric.outgoing_sum(hub) - 2.0).abs() < 1e-12);

        let rescaled = engine.normalize_outgoing(&mut fabric, hub).unwrap();
        assert!(rescaled);
        assert!((fabric.outgoing_sum(hub) - 1.0).abs() < 1e-9);
        // Proportions preserved: all four spokes end up equal.
        for &s in &spokes {
            assert!((fabric.synapse(hub, s).unwrap().weight - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn modulation_scales_learning_and_stays_bounded() {
        let (mut fabric, mut engine, a, b) = setup();
        engine.set_modulation(2.0);
        engine
            .apply_hebbian(&mut fabric, &event_for(&[(a, 1.0), (b, 1.0)]))
            .unwrap();
        assert!((fabric.synapse(a, b).unwrap().weight - 0.2).abs() < 1e-12);

        engine.set_modulation(100.0);
        assert_eq!(engine.modulation(), 2.0);
        engine.set_modulation(0.0);
        assert_eq!(engine.modulation(), 0.1);
    }

    #[test]
    fn strengthen_pattern_is_idempotent() {
        let (mut fabric, engine, a, b) = setup();
        let first = engine.strengthen_pattern(&mut fabric, &[a, b], 0.7).unwrap();
        assert_eq!(first, 2);
        assert_eq!(fabric.synapse(a, b).unwrap().weight, 0.7);

        let second = engine.strengthen_pattern(&mut fabric, &[a, b], 0.7).unwrap();
        assert_eq!(second, 0, "already at the floor; nothing to do");
        assert_eq!(fabric.synapse(a, b).unwrap().weight, 0.7);

        // A stronger existing synapse is left alone.
        fabric.reinforce(a, b, 0.2).unwrap();
        engine.strengthen_pattern(&mut fabric, &[a, b], 0.7).unwrap();
        assert!((fabric.synapse(a, b).unwrap().weight - 0.9).abs() < 1e-12);
    }

    #[test]
    fn prune_delegates_config_thresholds() {
        let (mut fabric, engine, a, b) = setup();
        fabric.reinforce(a, b, 0.01).unwrap();
        for _ in 0..5 {
            fabric.advance_cycle();
        }
        let pruned = engine.prune(&mut fabric).unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(fabric.synapse(a, b).is_none());
    }
}
