//! The memory cycle scheduler: an explicit WAKE/SLEEP state machine.
//!
//! During WAKE the fabric encodes and propagates; every non-trivial
//! event is buffered as a short-term trace. SLEEP is exclusive: buffered
//! traces are consolidated (promoted to strengthened synapses, atomically
//! per trace), a sample of consolidated patterns is replayed through the
//! fabric ("dreaming"), and the forgetting pass prunes weak, stale
//! synapses. The commit log makes trace promotion exactly-once across
//! crashes: an interrupted SLEEP discards uncommitted traces on recovery
//! and never reprocesses committed ones.

use neuroweave_core::config::FabricConfig;
use neuroweave_core::error::{Result, WeaveError};
use neuroweave_core::fabric::{Fabric, FabricStats};
use neuroweave_core::plasticity::PlasticityEngine;
use neuroweave_core::types::{ActivationEvent, Cycle, MemoryTrace, NeuronId, TraceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// The two phases of the cognitive cycle. Mutually exclusive over the
/// whole fabric; initial phase is WAKE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    Wake,
    Sleep,
}

/// Tunables for the memory cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Short-term buffer capacity; reaching it triggers WAKE -> SLEEP
    /// (default: 100).
    pub buffer_capacity: usize,
    /// Minimum reinforcement count for a trace to be promoted
    /// (default: 3).
    pub consolidation_threshold: u64,
    /// Weight floor applied to the synapses of a promoted pattern
    /// (default: 0.7).
    pub promotion_weight: f64,
    /// How many consolidated patterns each SLEEP replays (default: 4).
    pub replay_sample: usize,
    /// Seed level used when replaying a pattern (default: 1.1; slightly
    /// above a live percept so dreams reliably re-fire the assembly).
    pub replay_gain: f64,
    /// Energy budget for each replay propagation (default: 5.0).
    pub replay_budget: f64,
    /// Depth limit for replay propagation (default: 2).
    pub replay_depth: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 100,
            consolidation_threshold: 3,
            promotion_weight: 0.7,
            replay_sample: 4,
            replay_gain: 1.1,
            replay_budget: 5.0,
            replay_depth: 2,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(WeaveError::config_out_of_range("buffer_capacity", 1.0, f64::MAX, 0.0));
        }
        if self.promotion_weight <= 0.0 {
            return Err(WeaveError::config_out_of_range(
                "promotion_weight",
                f64::MIN_POSITIVE,
                f64::MAX,
                self.promotion_weight,
            ));
        }
        if self.replay_budget <= 0.0 {
            return Err(WeaveError::config_out_of_range(
                "replay_budget",
                f64::MIN_POSITIVE,
                f64::MAX,
                self.replay_budget,
            ));
        }
        Ok(())
    }
}

/// What happened to one trace during consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CycleEvent {
    /// Trace promoted to long-term storage and committed.
    TracePromoted { id: TraceId, pattern_len: usize },
    /// Trace below the consolidation threshold; dropped.
    TraceDiscarded { id: TraceId },
    /// Trace was already committed by an earlier (interrupted) pass.
    TraceSkipped { id: TraceId },
}

/// Summary of a completed SLEEP pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SleepReport {
    pub promoted: usize,
    pub discarded: usize,
    pub skipped: usize,
    pub replayed: usize,
    pub pruned: usize,
}

/// Summary statistics for the planning agent.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    pub phase: CyclePhase,
    pub cycle: Cycle,
    pub buffered: usize,
    pub committed_total: usize,
    pub consolidated_patterns: usize,
    pub pruned_last_sleep: usize,
    pub fabric: FabricStats,
}

/// Serializable scheduler state, persisted alongside the fabric snapshot
/// so recovery can honor the commit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleState {
    pub phase: CyclePhase,
    pub buffer: Vec<MemoryTrace>,
    pub committed: Vec<TraceId>,
    pub consolidated: Vec<Vec<NeuronId>>,
    pub replay_cursor: usize,
}

/// The memory cycle scheduler.
pub struct MemoryCycle {
    config: CycleConfig,
    plasticity: PlasticityEngine,
    phase: CyclePhase,
    buffer: VecDeque<MemoryTrace>,
    /// Ids of traces whose promotion has been committed. Never replayed
    /// through consolidation again.
    committed: BTreeSet<TraceId>,
    /// Promoted patterns, kept for replay.
    consolidated: Vec<Vec<NeuronId>>,
    /// Round-robin position for deterministic replay sampling.
    replay_cursor: usize,
    pruned_last_sleep: usize,
}

impl MemoryCycle {
    pub fn new(fabric_config: FabricConfig, config: CycleConfig) -> Result<Self> {
        fabric_config.validate()?;
        config.validate()?;
        Ok(Self {
            plasticity: PlasticityEngine::new(fabric_config),
            config,
            phase: CyclePhase::Wake,
            buffer: VecDeque::new(),
            committed: BTreeSet::new(),
            consolidated: Vec::new(),
            replay_cursor: 0,
            pruned_last_sleep: 0,
        })
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Whether the buffer has reached capacity and SLEEP should begin.
    pub fn needs_sleep(&self) -> bool {
        self.buffer.len() >= self.config.buffer_capacity
    }

    /// Access the plasticity engine, e.g. to adjust modulation.
    pub fn plasticity_mut(&mut self) -> &mut PlasticityEngine {
        &mut self.plasticity
    }

    // ------------------------------------------------------------------
    // WAKE
    // ------------------------------------------------------------------

    /// One WAKE learning step: Hebbian reinforcement for the event, then
    /// buffer it as a short-term trace. Returns the trace id, or `None`
    /// for trivial events (fewer than two neurons) or during SLEEP.
    ///
    /// When the buffer reaches capacity this runs a full SLEEP pass
    /// before returning, so the buffer never grows past capacity.
    pub fn wake(&mut self, fabric: &mut Fabric, event: &ActivationEvent) -> Result<Option<TraceId>> {
        if self.phase != CyclePhase::Wake {
            return Ok(None);
        }
        let outcome = self.plasticity.apply_hebbian(fabric, event)?;
        if !outcome.renormalized.is_empty() {
            // Weight overflow pre-clamp; homeostatic renormalization
            // already handled it. Non-fatal.
            tracing::warn!(
                neurons = outcome.renormalized.len(),
                "plasticity overflow renormalized"
            );
        }
        let trace = self.observe(event);
        if self.needs_sleep() {
            self.sleep(fabric)?;
        }
        Ok(trace)
    }

    /// Buffer an event as a short-term trace without learning.
    ///
    /// Re-observing an identical neuron pattern bumps the existing
    /// trace's reinforcement count instead of duplicating it. A new
    /// pattern arriving while the buffer is full is dropped; callers
    /// going through [`wake`](Self::wake) never hit that case because
    /// the full buffer triggers SLEEP first.
    pub fn observe(&mut self, event: &ActivationEvent) -> Option<TraceId> {
        if self.phase != CyclePhase::Wake || event.len() < 2 {
            return None;
        }
        let neurons: Vec<NeuronId> = event.fired().collect();
        if let Some(existing) = self.buffer.iter_mut().find(|t| t.neurons == neurons) {
            existing.reinforcement += 1;
            return Some(existing.id);
        }
        if self.buffer.len() >= self.config.buffer_capacity {
            tracing::warn!(
                capacity = self.config.buffer_capacity,
                "trace buffer full; dropping new trace"
            );
            return None;
        }
        let trace = MemoryTrace::from_event(event);
        let id = trace.id;
        self.buffer.push_back(trace);
        tracing::debug!(trace = %id.0, buffered = self.buffer.len(), "trace buffered");
        Some(id)
    }

    // ------------------------------------------------------------------
    // SLEEP
    // ------------------------------------------------------------------

    /// Run a full SLEEP pass: consolidate every buffered trace, replay,
    /// forget, then return to WAKE.
    pub fn sleep(&mut self, fabric: &mut Fabric) -> Result<SleepReport> {
        self.begin_sleep();
        let mut report = SleepReport::default();
        while let Some(event) = self.consolidate_step(fabric)? {
            match event {
                CycleEvent::TracePromoted { .. } => report.promoted += 1,
                CycleEvent::TraceDiscarded { .. } => report.discarded += 1,
                CycleEvent::TraceSkipped { .. } => report.skipped += 1,
            }
        }
        report.replayed = self.replay(fabric)?;
        report.pruned = self.forget(fabric)?;
        self.finish_sleep(fabric);
        tracing::debug!(
            promoted = report.promoted,
            discarded = report.discarded,
            replayed = report.replayed,
            pruned = report.pruned,
            "sleep pass complete"
        );
        Ok(report)
    }

    /// Enter the exclusive SLEEP phase.
    pub fn begin_sleep(&mut self) {
        self.phase = CyclePhase::Sleep;
    }

    /// Consolidate the next buffered trace. Returns `None` once the
    /// buffer is drained.
    ///
    /// Promotion is atomic per trace: the pattern's synapse updates and
    /// the commit-log entry happen in one step, and the trace leaves the
    /// buffer in the same step. A crash between steps leaves either the
    /// fully promoted trace (committed) or the untouched trace
    /// (uncommitted, discarded by recovery); never a half-applied one.
    pub fn consolidate_step(&mut self, fabric: &mut Fabric) -> Result<Option<CycleEvent>> {
        let Some(trace) = self.buffer.pop_front() else {
            return Ok(None);
        };
        if self.committed.contains(&trace.id) {
            return Ok(Some(CycleEvent::TraceSkipped { id: trace.id }));
        }
        if trace.reinforcement < self.config.consolidation_threshold {
            return Ok(Some(CycleEvent::TraceDiscarded { id: trace.id }));
        }

        self.plasticity
            .strengthen_pattern(fabric, &trace.neurons, self.config.promotion_weight)?;
        // Flooring a dense pattern can push a neuron's outgoing sum past
        // the homeostatic cap; renormalize before committing so the
        // committed state already satisfies the cap invariant.
        for &id in &trace.neurons {
            if self.plasticity.normalize_outgoing(fabric, id)? {
                tracing::debug!(neuron = %id, "promotion renormalized outgoing weights");
            }
        }
        self.committed.insert(trace.id);
        if !self.consolidated.contains(&trace.neurons) {
            self.consolidated.push(trace.neurons.clone());
        }
        Ok(Some(CycleEvent::TracePromoted {
            id: trace.id,
            pattern_len: trace.neurons.len(),
        }))
    }

    /// Replay ("dream"): re-propagate a deterministic round-robin sample
    /// of consolidated patterns, letting Hebbian learning further
    /// strengthen related synapses offline.
    pub fn replay(&mut self, fabric: &mut Fabric) -> Result<usize> {
        if self.consolidated.is_empty() {
            return Ok(0);
        }
        let sample = self.config.replay_sample.min(self.consolidated.len());
        let mut replayed = 0;
        for _ in 0..sample {
            let pattern = &self.consolidated[self.replay_cursor % self.consolidated.len()];
            self.replay_cursor = (self.replay_cursor + 1) % self.consolidated.len();
            let seeds: Vec<(NeuronId, f64)> =
                pattern.iter().map(|&id| (id, self.config.replay_gain)).collect();
            let event = fabric.propagate(&seeds, self.config.replay_budget, self.config.replay_depth)?;
            let outcome = self.plasticity.apply_hebbian(fabric, &event)?;
            if !outcome.renormalized.is_empty() {
                tracing::warn!(
                    neurons = outcome.renormalized.len(),
                    "plasticity overflow renormalized during replay"
                );
            }
            replayed += 1;
        }
        Ok(replayed)
    }

    /// Forgetting: run the pruning pass. Returns the number of synapses
    /// removed.
    pub fn forget(&mut self, fabric: &mut Fabric) -> Result<usize> {
        let pruned = self.plasticity.prune(fabric)?;
        self.pruned_last_sleep = pruned.len();
        Ok(pruned.len())
    }

    /// Leave SLEEP: advance the consolidation cycle and return to WAKE.
    pub fn finish_sleep(&mut self, fabric: &mut Fabric) {
        fabric.advance_cycle();
        self.phase = CyclePhase::Wake;
    }

    // ------------------------------------------------------------------
    // Recovery and persistence
    // ------------------------------------------------------------------

    /// Apply the crash/interruption contract after restoring persisted
    /// state: if the process died mid-SLEEP, uncommitted buffered traces
    /// are discarded (committed ones were already removed from the
    /// buffer when they were applied) and the cycle returns to WAKE.
    /// Returns the number of traces discarded.
    pub fn recover(&mut self) -> usize {
        if self.phase != CyclePhase::Sleep {
            return 0;
        }
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.phase = CyclePhase::Wake;
        if discarded > 0 {
            tracing::warn!(discarded, "sleep interrupted; uncommitted traces discarded");
        }
        discarded
    }

    /// Export the scheduler state for session persistence.
    pub fn export_state(&self) -> CycleState {
        CycleState {
            phase: self.phase,
            buffer: self.buffer.iter().cloned().collect(),
            committed: self.committed.iter().copied().collect(),
            consolidated: self.consolidated.clone(),
            replay_cursor: self.replay_cursor,
        }
    }

    /// Rebuild a scheduler from persisted state.
    pub fn from_state(
        fabric_config: FabricConfig,
        config: CycleConfig,
        state: CycleState,
    ) -> Result<Self> {
        let mut cycle = Self::new(fabric_config, config)?;
        cycle.phase = state.phase;
        cycle.buffer = state.buffer.into();
        cycle.committed = state.committed.into_iter().collect();
        cycle.consolidated = state.consolidated;
        cycle.replay_cursor = state.replay_cursor;
        Ok(cycle)
    }

    pub fn stats(&self, fabric: &Fabric) -> CycleStats {
        CycleStats {
            phase: self.phase,
            cycle: fabric.cycle(),
            buffered: self.buffer.len(),
            committed_total: self.committed.len(),
            consolidated_patterns: self.consolidated.len(),
            pruned_last_sleep: self.pruned_last_sleep,
            fabric: fabric.stats(),
        }
    }
}
