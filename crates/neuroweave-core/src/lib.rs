//! # Neuroweave Core
//!
//! The synaptic fabric and its learning dynamics: the representation
//! layer of a grounded cognitive architecture. Everything the system
//! knows is stored as weighted directed synapses between lazily created
//! neurons; meaning comes from the connection pattern, not from symbol
//! definitions.
//!
//! - **Fabric** - id-indexed neuron arena, spreading activation under an
//!   energy budget, snapshot/restore, relation queries
//! - **PlasticityEngine** - Hebbian reinforcement, homeostatic
//!   normalization, the forgetting pass
//! - **RelationalExtractor** - ordered firing patterns in, merged
//!   (subject, predicate, object) facts out
//!
//! ## Quick Start
//!
//! ```rust
//! use neuroweave_core::prelude::*;
//!
//! let mut fabric = Fabric::new(FabricConfig::default()).unwrap();
//! let event = fabric
//!     .encode(&[("cat", NeuronKind::Concept, 1.0), ("mouse", NeuronKind::Concept, 1.0)])
//!     .unwrap();
//!
//! let engine = PlasticityEngine::new(FabricConfig::default());
//! engine.apply_hebbian(&mut fabric, &event).unwrap();
//!
//! assert!(fabric.association("cat", "mouse") > 0.0);
//! ```

pub mod config;
pub mod error;
pub mod fabric;
pub mod plasticity;
pub mod relation;
pub mod snapshot;
pub mod types;
pub mod prelude;
