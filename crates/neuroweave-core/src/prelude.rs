//! Neuroweave Core Prelude - convenient imports for common usage.
//!
//! ```rust
//! use neuroweave_core::prelude::*;
//! ```

pub use crate::types::{
    ActivationEvent, Cycle, MemoryTrace, Neuron, NeuronId, NeuronKind, PrunedSynapse,
    RelationRecord, Synapse, TraceId,
};

pub use crate::config::FabricConfig;
pub use crate::error::{FabricError, OracleError, Result, SnapshotError, WeaveError};
pub use crate::fabric::{Fabric, FabricStats};
pub use crate::plasticity::{HebbianOutcome, PlasticityEngine};
pub use crate::relation::{
    ActivationWindow, FiringPattern, RelationPattern, RelationStore, RelationalExtractor, RoleHint,
};
pub use crate::snapshot::{FabricSnapshot, SerializedSynapse, SNAPSHOT_VERSION};
