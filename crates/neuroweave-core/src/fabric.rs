//! The synaptic fabric: the graph store and propagation engine.
//!
//! All knowledge lives here, as weighted directed synapses between
//! neurons in an id-indexed arena. Neurons are created lazily when a
//! symbol is first grounded and never deleted; synapses come and go with
//! learning and forgetting. The fabric may contain cycles; propagation
//! terminates through its energy/depth budget, not through acyclicity.

use crate::config::FabricConfig;
use crate::error::{Result, WeaveError};
use crate::relation::{RelationPattern, RelationStore};
use crate::types::{
    ActivationEvent, Cycle, Neuron, NeuronId, NeuronKind, PrunedSynapse, RelationRecord, Synapse,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Neurons created within this many cycles count as "novel" for the
/// planning agent's curiosity signal.
const NOVELTY_WINDOW: Cycle = 10;

/// Summary statistics exposed to the planning agent.
#[derive(Debug, Clone, Serialize)]
pub struct FabricStats {
    pub neuron_count: usize,
    pub synapse_count: usize,
    /// Share of possible directed connections that do NOT exist.
    /// Stays close to 1.0 in a healthy, sparse fabric.
    pub sparsity_ratio: f64,
    /// Share of neurons created within the recent novelty window.
    /// Regions of fresh, weakly-connected structure are curiosity targets.
    pub novelty_score: f64,
}

/// The synaptic fabric.
///
/// Owned explicitly by the caller and passed by reference to every
/// component; there is no hidden global instance.
#[derive(Debug)]
pub struct Fabric {
    pub(crate) config: FabricConfig,
    /// Arena of neurons; `NeuronId` is the index. Never shrinks.
    pub(crate) neurons: Vec<Neuron>,
    /// Outgoing adjacency per neuron. BTreeMaps keep iteration in id
    /// order, which is the propagation tie-break order.
    pub(crate) synapses: BTreeMap<NeuronId, BTreeMap<NeuronId, Synapse>>,
    /// Symbol -> neuron grounding table.
    pub(crate) symbol_index: HashMap<String, NeuronId>,
    /// Learned relation facts.
    pub(crate) relations: RelationStore,
    pub(crate) cycle: Cycle,
    /// Set when corruption is detected; all further mutation refuses.
    pub(crate) halted: bool,
}

impl Fabric {
    /// Create an empty fabric with the given configuration.
    pub fn new(config: FabricConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            neurons: Vec::new(),
            synapses: BTreeMap::new(),
            symbol_index: HashMap::new(),
            relations: RelationStore::new(),
            cycle: 0,
            halted: false,
        })
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Advance the consolidation cycle, decaying residual activation.
    pub fn advance_cycle(&mut self) {
        self.cycle += 1;
        for neuron in &mut self.neurons {
            neuron.activation *= neuron.decay_rate;
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.halted {
            Err(WeaveError::halted())
        } else {
            Ok(())
        }
    }

    /// Whether the fabric has halted after detecting corruption.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // ------------------------------------------------------------------
    // Neurons and grounding
    // ------------------------------------------------------------------

    /// Ground a symbol, creating its neuron on first sight. Idempotent
    /// per symbol; an unknown symbol is never an error.
    pub fn get_or_create_neuron(&mut self, symbol: &str, kind: NeuronKind) -> Result<NeuronId> {
        self.ensure_writable()?;
        if let Some(&id) = self.symbol_index.get(symbol) {
            return Ok(id);
        }
        let id = NeuronId(self.neurons.len() as u64);
        self.neurons.push(Neuron {
            id,
            kind,
            symbol: symbol.to_string(),
            activation: 0.0,
            decay_rate: self.config.neuron_decay,
            last_fired: self.cycle,
            created: self.cycle,
        });
        self.symbol_index.insert(symbol.to_string(), id);
        Ok(id)
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(id.index())
    }

    /// Id of the neuron grounding a symbol, if any.
    pub fn neuron_id(&self, symbol: &str) -> Option<NeuronId> {
        self.symbol_index.get(symbol).copied()
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.values().map(|out| out.len()).sum()
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Ground and seed a set of symbol activations, then propagate with
    /// the configured default budget. The perceptual encoder's entry
    /// point, and the re-entry path for oracle results.
    pub fn encode(&mut self, symbol_activations: &[(&str, NeuronKind, f64)]) -> Result<ActivationEvent> {
        let mut seeds = Vec::with_capacity(symbol_activations.len());
        for &(symbol, kind, level) in symbol_activations {
            let id = self.get_or_create_neuron(symbol, kind)?;
            seeds.push((id, level));
        }
        let budget = self.config.default_energy_budget;
        let depth = self.config.default_max_depth;
        self.propagate(&seeds, budget, depth)
    }

    /// Spreading activation from the given seeds.
    ///
    /// Activation flows along outgoing synapses proportional to weight,
    /// attenuated per hop by `hop_decay`. Every injection of mass, seed
    /// or downstream, draws from `energy_budget`; the call stops when the
    /// budget is spent, `max_depth` is reached, or the frontier falls
    /// silent. Neurons below the activation threshold are excluded from
    /// the result. Deterministic for fixed seeds and graph state: sources
    /// and targets are visited in id order.
    pub fn propagate(
        &mut self,
        seeds: &[(NeuronId, f64)],
        energy_budget: f64,
        max_depth: u32,
    ) -> Result<ActivationEvent> {
        self.ensure_writable()?;
        let threshold = self.config.activation_threshold;
        let hop_decay = self.config.hop_decay;

        // Seed injection in id order so budget clipping is deterministic.
        let mut seed_map: BTreeMap<NeuronId, f64> = BTreeMap::new();
        for &(id, level) in seeds {
            if self.neuron(id).is_none() {
                return Err(WeaveError::no_such_neuron(id.0));
            }
            if level > 0.0 {
                *seed_map.entry(id).or_insert(0.0) += level;
            }
        }

        let mut budget = energy_budget;
        let mut levels: BTreeMap<NeuronId, f64> = BTreeMap::new();
        let mut frontier: BTreeMap<NeuronId, f64> = BTreeMap::new();
        let mut depth_reached = 0;

        for (id, level) in seed_map {
            if budget <= 0.0 {
                break;
            }
            let inject = level.min(budget);
            budget -= inject;
            *levels.entry(id).or_insert(0.0) += inject;
            *frontier.entry(id).or_insert(0.0) += inject;
        }

        for depth in 1..=max_depth {
            if budget <= 0.0 || frontier.is_empty() {
                break;
            }
            let mut next: BTreeMap<NeuronId, f64> = BTreeMap::new();
            'sources: for (&source, &source_level) in &frontier {
                if source_level < threshold {
                    continue;
                }
                let Some(outgoing) = self.synapses.get_mut(&source) else {
                    continue;
                };
                for (&target, synapse) in outgoing.iter_mut() {
                    if budget <= 0.0 {
                        break 'sources;
                    }
                    let flow = source_level * synapse.weight * hop_decay;
                    if flow <= 0.0 {
                        continue;
                    }
                    let inject = flow.min(budget);
                    budget -= inject;
                    synapse.trace += inject;
                    *levels.entry(target).or_insert(0.0) += inject;
                    *next.entry(target).or_insert(0.0) += inject;
                    depth_reached = depth;
                }
            }
            frontier = next;
        }

        // Sparsity: silent neurons never appear in the result.
        levels.retain(|_, level| *level >= threshold);

        let cycle = self.cycle;
        for (&id, &level) in &levels {
            let neuron = &mut self.neurons[id.index()];
            neuron.activation = level;
            neuron.last_fired = cycle;
        }

        Ok(ActivationEvent {
            levels,
            injected_mass: energy_budget - budget,
            depth_reached,
            cycle,
        })
    }

    // ------------------------------------------------------------------
    // Synapses
    // ------------------------------------------------------------------

    /// Adjust the weight of a synapse, creating it if absent. The result
    /// is clamped into `[0, w_max]`. Plasticity-engine-facing; not part
    /// of the external boundary.
    pub fn reinforce(&mut self, source: NeuronId, target: NeuronId, delta: f64) -> Result<f64> {
        self.ensure_writable()?;
        let count = self.neurons.len() as u64;
        if source.0 >= count {
            return Err(WeaveError::no_such_neuron(source.0));
        }
        if target.0 >= count {
            return Err(WeaveError::no_such_neuron(target.0));
        }

        let w_max = self.config.w_max;
        let cycle = self.cycle;
        let synapse = self
            .synapses
            .entry(source)
            .or_default()
            .entry(target)
            .or_insert_with(|| Synapse::new(0.0, cycle));
        synapse.weight = (synapse.weight + delta).clamp(0.0, w_max);
        synapse.last_reinforced = cycle;
        if delta > 0.0 {
            synapse.trace += delta;
        }
        Ok(synapse.weight)
    }

    pub fn synapse(&self, source: NeuronId, target: NeuronId) -> Option<&Synapse> {
        self.synapses.get(&source)?.get(&target)
    }

    pub fn outgoing(&self, source: NeuronId) -> Option<&BTreeMap<NeuronId, Synapse>> {
        self.synapses.get(&source)
    }

    /// Total outgoing weight of a neuron.
    pub fn outgoing_sum(&self, source: NeuronId) -> f64 {
        self.synapses
            .get(&source)
            .map(|out| out.values().map(|s| s.weight).sum())
            .unwrap_or(0.0)
    }

    /// Scale all outgoing weights of a neuron by `factor`, clamped into
    /// range. Used by homeostatic renormalization.
    pub fn scale_outgoing(&mut self, source: NeuronId, factor: f64) -> Result<()> {
        self.ensure_writable()?;
        let w_max = self.config.w_max;
        if let Some(outgoing) = self.synapses.get_mut(&source) {
            for synapse in outgoing.values_mut() {
                synapse.weight = (synapse.weight * factor).clamp(0.0, w_max);
            }
        }
        Ok(())
    }

    /// Forgetting pass: remove synapses below `epsilon` that have gone
    /// unreinforced for more than `ttl` cycles. SLEEP-only.
    pub fn prune_synapses(&mut self, epsilon: f64, ttl: Cycle) -> Result<Vec<PrunedSynapse>> {
        self.ensure_writable()?;
        let cycle = self.cycle;
        let mut pruned = Vec::new();
        for (&source, outgoing) in self.synapses.iter_mut() {
            outgoing.retain(|&target, synapse| {
                let stale = cycle.saturating_sub(synapse.last_reinforced) > ttl;
                if synapse.weight < epsilon && stale {
                    pruned.push(PrunedSynapse {
                        source,
                        target,
                        final_weight: synapse.weight,
                    });
                    false
                } else {
                    true
                }
            });
        }
        self.synapses.retain(|_, outgoing| !outgoing.is_empty());
        Ok(pruned)
    }

    /// Direct association strength between two grounded symbols: the sum
    /// of both directed weights. 0.0 when either symbol is unknown.
    pub fn association(&self, symbol_a: &str, symbol_b: &str) -> f64 {
        let (Some(a), Some(b)) = (self.neuron_id(symbol_a), self.neuron_id(symbol_b)) else {
            return 0.0;
        };
        let forward = self.synapse(a, b).map(|s| s.weight).unwrap_or(0.0);
        let backward = self.synapse(b, a).map(|s| s.weight).unwrap_or(0.0);
        forward + backward
    }

    /// Aggregate synaptic weight along subject -> predicate -> object.
    pub fn path_weight(&self, s: NeuronId, p: NeuronId, o: NeuronId) -> Result<f64> {
        let count = self.neurons.len() as u64;
        for id in [s, p, o] {
            if id.0 >= count {
                return Err(WeaveError::no_such_neuron(id.0));
            }
        }
        let first = self.synapse(s, p).map(|syn| syn.weight).unwrap_or(0.0);
        let second = self.synapse(p, o).map(|syn| syn.weight).unwrap_or(0.0);
        Ok(first + second)
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    /// Merge an observed triple into the relation table.
    pub fn merge_relation(
        &mut self,
        subject: NeuronId,
        predicate: NeuronId,
        object: NeuronId,
    ) -> Result<RelationRecord> {
        self.ensure_writable()?;
        let count = self.neurons.len() as u64;
        for id in [subject, predicate, object] {
            if id.0 >= count {
                return Err(WeaveError::no_such_neuron(id.0));
            }
        }
        let k = self.config.smoothing_k;
        let cycle = self.cycle;
        Ok(self
            .relations
            .merge(subject, predicate, object, cycle, k)
            .clone())
    }

    /// Lazy, finite, restartable, read-only match over the relation
    /// table. The inference engine's view of the fabric.
    pub fn query<'a>(
        &'a self,
        pattern: &'a RelationPattern,
    ) -> impl Iterator<Item = &'a RelationRecord> + 'a {
        self.relations.matching(pattern)
    }

    // ------------------------------------------------------------------
    // Statistics and integrity
    // ------------------------------------------------------------------

    pub fn stats(&self) -> FabricStats {
        let n = self.neurons.len();
        let synapse_count = self.synapse_count();
        let possible = n.saturating_mul(n.saturating_sub(1));
        let sparsity_ratio = if possible == 0 {
            1.0
        } else {
            1.0 - synapse_count as f64 / possible as f64
        };
        let novel = self
            .neurons
            .iter()
            .filter(|neuron| self.cycle.saturating_sub(neuron.created) <= NOVELTY_WINDOW)
            .count();
        let novelty_score = if n == 0 { 0.0 } else { novel as f64 / n as f64 };
        FabricStats {
            neuron_count: n,
            synapse_count,
            sparsity_ratio,
            novelty_score,
        }
    }

    /// Verify structural invariants. On violation the fabric halts all
    /// further mutation and returns the (fatal) error; the remedy is
    /// restoring from the last valid snapshot.
    pub fn check_integrity(&mut self) -> Result<()> {
        let count = self.neurons.len() as u64;
        let w_max = self.config.w_max;
        for (source, outgoing) in &self.synapses {
            if source.0 >= count {
                self.halted = true;
                return Err(WeaveError::dangling_synapse(source.0, source.0));
            }
            for (target, synapse) in outgoing {
                if target.0 >= count {
                    self.halted = true;
                    return Err(WeaveError::dangling_synapse(source.0, target.0));
                }
                if !(0.0..=w_max).contains(&synapse.weight) {
                    self.halted = true;
                    return Err(WeaveError::weight_out_of_range(
                        source.0,
                        target.0,
                        synapse.weight,
                    ));
                }
            }
        }
        for (index, neuron) in self.neurons.iter().enumerate() {
            if neuron.id.index() != index {
                self.halted = true;
                return Err(WeaveError::snapshot_corrupt(format!(
                    "neuron id {} stored at arena index {}",
                    neuron.id, index
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NeuronKind;

    fn fabric() -> Fabric {
        Fabric::new(FabricConfig::default()).unwrap()
    }

    #[test]
    fn grounding_is_idempotent() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("cat", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("cat", NeuronKind::Concept).unwrap();
        assert_eq!(a, b);
        assert_eq!(f.neuron_count(), 1);
        assert_eq!(f.neuron(a).unwrap().symbol, "cat");
    }

    #[test]
    fn propagation_mass_never_exceeds_budget() {
        let mut f = fabric();
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(f.get_or_create_neuron(&format!("s{i}"), NeuronKind::Sensory).unwrap());
        }
        // Dense wiring so flow would exceed a small budget without the cap.
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    f.reinforce(a, b, 1.0).unwrap();
                }
            }
        }
        let seeds: Vec<_> = ids.iter().map(|&id| (id, 1.0)).collect();
        let budget = 2.5;
        let event = f.propagate(&seeds, budget, 5).unwrap();
        assert!(event.injected_mass <= budget + 1e-12);
        assert!(event.total_mass() <= budget + 1e-12);
    }

    #[test]
    fn propagation_is_deterministic() {
        let build = || {
            let mut f = fabric();
            let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
            let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
            let c = f.get_or_create_neuron("c", NeuronKind::Concept).unwrap();
            f.reinforce(a, b, 0.6).unwrap();
            f.reinforce(a, c, 0.6).unwrap();
            f.reinforce(b, c, 0.4).unwrap();
            (f, a)
        };
        let (mut f1, a1) = build();
        let (mut f2, a2) = build();
        let e1 = f1.propagate(&[(a1, 1.0)], 5.0, 3).unwrap();
        let e2 = f2.propagate(&[(a2, 1.0)], 5.0, 3).unwrap();
        assert_eq!(e1.levels, e2.levels);
        assert_eq!(e1.injected_mass, e2.injected_mass);
    }

    #[test]
    fn silent_neurons_are_excluded() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        // Weight so weak the downstream flow lands under the threshold.
        f.reinforce(a, b, 0.01).unwrap();
        let event = f.propagate(&[(a, 1.0)], 10.0, 3).unwrap();
        assert_eq!(event.level(a), 1.0);
        assert_eq!(event.level(b), 0.0);
        assert_eq!(event.len(), 1);
    }

    #[test]
    fn propagation_terminates_on_cycles() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 1.0).unwrap();
        f.reinforce(b, a, 1.0).unwrap();
        // A tight loop: only the budget and depth stop the flow.
        let event = f.propagate(&[(a, 1.0)], 100.0, 50).unwrap();
        assert!(event.injected_mass <= 100.0 + 1e-12);
        assert!(event.depth_reached <= 50);
    }

    #[test]
    fn propagation_stamps_fired_and_traces() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 0.9).unwrap();
        f.advance_cycle();
        f.advance_cycle();
        let trace_before = f.synapse(a, b).unwrap().trace;
        f.propagate(&[(a, 1.0)], 10.0, 2).unwrap();
        assert_eq!(f.neuron(a).unwrap().last_fired, 2);
        assert!(f.synapse(a, b).unwrap().trace > trace_before);
    }

    #[test]
    fn reinforce_clamps_to_w_max() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        for _ in 0..100 {
            f.reinforce(a, b, 0.3).unwrap();
        }
        assert_eq!(f.synapse(a, b).unwrap().weight, 1.0);
        let w = f.reinforce(a, b, -5.0).unwrap();
        assert_eq!(w, 0.0);
    }

    #[test]
    fn reinforce_rejects_unknown_neuron() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let err = f.reinforce(a, NeuronId(99), 0.1).unwrap_err();
        assert!(err.is_fatal() || matches!(err, WeaveError::Fabric(_)));
    }

    #[test]
    fn pruning_respects_epsilon_and_ttl() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        let c = f.get_or_create_neuron("c", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 0.01).unwrap(); // weak, will go stale
        f.reinforce(a, c, 0.9).unwrap(); // strong, survives regardless
        for _ in 0..5 {
            f.advance_cycle();
        }
        // Refresh nothing; both are 5 cycles stale, ttl is 3.
        let pruned = f.prune_synapses(0.05, 3).unwrap();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0], PrunedSynapse { source: a, target: b, final_weight: 0.01 });
        assert!(f.synapse(a, b).is_none());
        assert!(f.synapse(a, c).is_some());
    }

    #[test]
    fn recently_reinforced_weak_synapse_survives() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 0.01).unwrap();
        f.advance_cycle();
        f.reinforce(a, b, 0.0).unwrap(); // touch within the window
        let pruned = f.prune_synapses(0.05, 3).unwrap();
        assert!(pruned.is_empty());
        assert!(f.synapse(a, b).is_some());
    }

    #[test]
    fn association_sums_both_directions() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("ball", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("red", NeuronKind::Sensory).unwrap();
        f.reinforce(a, b, 0.4).unwrap();
        f.reinforce(b, a, 0.2).unwrap();
        assert!((f.association("ball", "red") - 0.6).abs() < 1e-12);
        assert_eq!(f.association("ball", "nothing"), 0.0);
    }

    #[test]
    fn encode_creates_unknown_symbols() {
        let mut f = fabric();
        let event = f
            .encode(&[("sky", NeuronKind::Sensory, 1.0), ("blue", NeuronKind::Sensory, 0.8)])
            .unwrap();
        assert_eq!(f.neuron_count(), 2);
        assert_eq!(event.len(), 2);
    }

    #[test]
    fn stats_report_sparsity_and_novelty() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 0.5).unwrap();
        let stats = f.stats();
        assert_eq!(stats.neuron_count, 2);
        assert_eq!(stats.synapse_count, 1);
        assert!((stats.sparsity_ratio - 0.5).abs() < 1e-12);
        assert_eq!(stats.novelty_score, 1.0);
    }

    #[test]
    fn corruption_halts_mutation() {
        let mut f = fabric();
        let a = f.get_or_create_neuron("a", NeuronKind::Concept).unwrap();
        let b = f.get_or_create_neuron("b", NeuronKind::Concept).unwrap();
        f.reinforce(a, b, 0.5).unwrap();
        // Corrupt the store directly: a dangling target.
        f.synapses
            .get_mut(&a)
            .unwrap()
            .insert(NeuronId(42), Synapse::new(0.5, 0));
        let err = f.check_integrity().unwrap_err();
        assert!(err.is_fatal());
        assert!(f.is_halted());
        assert!(matches!(
            f.get_or_create_neuron("c", NeuronKind::Concept),
            Err(WeaveError::Fabric(crate::error::FabricError::Halted))
        ));
        // Reads still work.
        assert!(f.neuron(a).is_some());
    }
}
