//! Shared types used across the Neuroweave crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current consolidation cycle of the substrate.
///
/// Advances once per WAKE/SLEEP round trip; all temporal bookkeeping
/// (last fired, last reinforced, TTL ages) is expressed in cycles.
pub type Cycle = u64;

/// Stable identifier of a neuron: its index in the fabric's arena.
///
/// Neurons are never deleted (only their synapses are pruned), so an id
/// stays valid for the lifetime of the fabric and across snapshot/restore.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NeuronId(pub u64);

impl NeuronId {
    /// Arena index of this neuron.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NeuronId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unique identifier for a short-term memory trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceId(pub Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for tests.
    pub fn from_seed(seed: u64) -> Self {
        Self(Uuid::from_u128(seed as u128))
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

/// The functional kind of a neuron. Closed set; each kind restricts what
/// the neuron may participate in (sensory neurons ground raw percepts,
/// relational neurons anchor predicates, concept neurons anchor entities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronKind {
    /// Grounds a raw perceptual symbol.
    Sensory,
    /// Anchors a predicate in a relation triple.
    Relational,
    /// Anchors an entity or abstract concept.
    Concept,
}

/// A single computational unit in the synaptic fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    pub id: NeuronId,
    pub kind: NeuronKind,
    /// The symbol this neuron grounds. Meaning comes from the connection
    /// pattern, not from the symbol itself.
    pub symbol: String,
    /// Current activation level (>= 0). Transient; reset between events.
    pub activation: f64,
    /// Per-cycle decay applied to residual activation.
    pub decay_rate: f64,
    /// Cycle in which this neuron last crossed the firing threshold.
    pub last_fired: Cycle,
    /// Cycle in which this neuron was created.
    pub created: Cycle,
}

/// A directed connection between two neurons.
///
/// Source and target are implied by the synapse's position in the fabric's
/// adjacency table; at most one synapse exists per ordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    /// Connection strength, always within `[0, w_max]`.
    pub weight: f64,
    /// Recent co-activation evidence accumulated by propagation.
    pub trace: f64,
    pub created: Cycle,
    pub last_reinforced: Cycle,
}

impl Synapse {
    pub fn new(weight: f64, cycle: Cycle) -> Self {
        Self {
            weight,
            trace: 0.0,
            created: cycle,
            last_reinforced: cycle,
        }
    }
}

/// A synapse removed by the forgetting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedSynapse {
    pub source: NeuronId,
    pub target: NeuronId,
    pub final_weight: f64,
}

/// Result of one spreading-activation call. Ephemeral; never persisted.
///
/// Activation levels are keyed in id order, which is also the tie-break
/// order of the propagation algorithm, so iterating an event is
/// deterministic for a fixed seed set and graph state.
#[derive(Debug, Clone, Default)]
pub struct ActivationEvent {
    /// Neurons that crossed the activation threshold, with their levels.
    pub levels: std::collections::BTreeMap<NeuronId, f64>,
    /// Total activation mass injected over the whole call. Never exceeds
    /// the energy budget the call was given.
    pub injected_mass: f64,
    /// Deepest hop reached before the budget or depth limit stopped flow.
    pub depth_reached: u32,
    /// Cycle during which the event was produced.
    pub cycle: Cycle,
}

impl ActivationEvent {
    /// Activation level of a neuron, 0.0 if it stayed below threshold.
    pub fn level(&self, id: NeuronId) -> f64 {
        self.levels.get(&id).copied().unwrap_or(0.0)
    }

    /// Sum of all reported activation levels.
    pub fn total_mass(&self) -> f64 {
        self.levels.values().sum()
    }

    /// Ids of all neurons that fired, in id order.
    pub fn fired(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.levels.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

/// A learned (subject, predicate, object) fact.
///
/// Uniquely keyed by the triple: repeated observations merge into one
/// record, incrementing support. Confidence is recomputed on every merge
/// and is monotone non-decreasing in support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub subject: NeuronId,
    pub predicate: NeuronId,
    pub object: NeuronId,
    /// Number of times this triple has been observed.
    pub support: u64,
    /// `support / (support + k)` for the configured smoothing constant k.
    pub confidence: f64,
    pub first_seen: Cycle,
}

impl RelationRecord {
    /// The unique key of this record.
    pub fn key(&self) -> (NeuronId, NeuronId, NeuronId) {
        (self.subject, self.predicate, self.object)
    }
}

/// A short-term memory entry: the neurons activated in one encoding pass.
///
/// Buffered during WAKE; promoted to long-term storage (direct synapse
/// strengthening) or discarded during SLEEP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTrace {
    pub id: TraceId,
    /// Sorted, deduplicated ids of the neurons that fired.
    pub neurons: Vec<NeuronId>,
    /// Cycle during which the trace was captured.
    pub cycle: Cycle,
    /// How many times this exact pattern was re-observed while buffered.
    pub reinforcement: u64,
}

impl MemoryTrace {
    /// Build a trace from an activation event. Neuron ids arrive already
    /// sorted because the event is keyed in id order.
    pub fn from_event(event: &ActivationEvent) -> Self {
        Self {
            id: TraceId::new(),
            neurons: event.fired().collect(),
            cycle: event.cycle,
            reinforcement: 1,
        }
    }
}
