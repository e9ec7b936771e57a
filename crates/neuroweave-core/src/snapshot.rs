//! Versioned serialization of the fabric state.
//!
//! A snapshot is a full copy of the neuron, synapse, and relation tables
//! behind a schema version tag. Restore verifies the version and the
//! structural invariants before handing back a live fabric, so a corrupt
//! payload can never become an observable fabric state.

use crate::config::FabricConfig;
use crate::error::{Result, SnapshotError, WeaveError};
use crate::fabric::Fabric;
use crate::relation::RelationStore;
use crate::types::{Cycle, Neuron, NeuronId, RelationRecord, Synapse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version of the snapshot layout.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A serialized synapse row: (srcId, dstId, weight, lastReinforcedAt)
/// plus the plasticity bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedSynapse {
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: f64,
    pub trace: f64,
    pub created: Cycle,
    pub last_reinforced: Cycle,
}

/// Full serialized copy of a fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricSnapshot {
    /// Schema version tag; restore refuses a mismatch.
    pub version: u32,
    pub cycle: Cycle,
    pub neurons: Vec<Neuron>,
    pub synapses: Vec<SerializedSynapse>,
    pub relations: Vec<RelationRecord>,
}

impl Fabric {
    /// Serialize the complete fabric state.
    pub fn snapshot(&self) -> FabricSnapshot {
        let synapses = self
            .synapses
            .iter()
            .flat_map(|(&source, outgoing)| {
                outgoing.iter().map(move |(&target, synapse)| SerializedSynapse {
                    source,
                    target,
                    weight: synapse.weight,
                    trace: synapse.trace,
                    created: synapse.created,
                    last_reinforced: synapse.last_reinforced,
                })
            })
            .collect();
        FabricSnapshot {
            version: SNAPSHOT_VERSION,
            cycle: self.cycle,
            neurons: self.neurons.clone(),
            synapses,
            relations: self.relations.to_records(),
        }
    }

    /// Rebuild a fabric from a snapshot.
    ///
    /// Verifies the schema version and every structural invariant
    /// (arena-consistent neuron ids, in-range weights, no dangling
    /// endpoints) before the fabric becomes usable.
    pub fn restore(snapshot: FabricSnapshot, config: FabricConfig) -> Result<Self> {
        config.validate()?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(WeaveError::Snapshot(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            }));
        }

        let count = snapshot.neurons.len() as u64;
        for (index, neuron) in snapshot.neurons.iter().enumerate() {
            if neuron.id.index() != index {
                return Err(WeaveError::snapshot_corrupt(format!(
                    "neuron id {} stored at index {}",
                    neuron.id, index
                )));
            }
        }

        let mut synapses: BTreeMap<NeuronId, BTreeMap<NeuronId, Synapse>> = BTreeMap::new();
        for row in &snapshot.synapses {
            if row.source.0 >= count || row.target.0 >= count {
                return Err(WeaveError::dangling_synapse(row.source.0, row.target.0));
            }
            if !(0.0..=config.w_max).contains(&row.weight) {
                return Err(WeaveError::weight_out_of_range(
                    row.source.0,
                    row.target.0,
                    row.weight,
                ));
            }
            let previous = synapses.entry(row.source).or_default().insert(
                row.target,
                Synapse {
                    weight: row.weight,
                    trace: row.trace,
                    created: row.created,
                    last_reinforced: row.last_reinforced,
                },
            );
            if previous.is_some() {
                return Err(WeaveError::snapshot_corrupt(format!(
                    "duplicate synapse {} -> {}",
                    row.source, row.target
                )));
            }
        }

        for record in &snapshot.relations {
            for id in [record.subject, record.predicate, record.object] {
                if id.0 >= count {
                    return Err(WeaveError::snapshot_corrupt(format!(
                        "relation references missing neuron {}",
                        id
                    )));
                }
            }
        }

        let symbol_index = snapshot
            .neurons
            .iter()
            .map(|n| (n.symbol.clone(), n.id))
            .collect();

        Ok(Self {
            config,
            neurons: snapshot.neurons,
            synapses,
            symbol_index,
            relations: RelationStore::from_records(snapshot.relations),
            cycle: snapshot.cycle,
            halted: false,
        })
    }
}
