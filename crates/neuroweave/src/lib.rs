//! # Neuroweave
//!
//! A grounded cognitive substrate. Knowledge lives as weighted directed
//! synapses between lazily created neurons; meaning comes from the
//! connection pattern, never from symbol definitions. Learning is
//! Hebbian, querying is spreading activation under an energy budget,
//! and memory runs on an explicit WAKE/SLEEP cycle with consolidation,
//! replay, and forgetting.
//!
//! ## Quick Start
//!
//! ```rust
//! use neuroweave::prelude::*;
//!
//! let mut fabric = Fabric::new(FabricConfig::default()).unwrap();
//! let mut cycle = MemoryCycle::new(FabricConfig::default(), CycleConfig::default()).unwrap();
//!
//! // WAKE: perceive; co-activation wires the symbols together.
//! for _ in 0..3 {
//!     let event = fabric
//!         .encode(&[("cat", NeuronKind::Concept, 1.0), ("mouse", NeuronKind::Concept, 1.0)])
//!         .unwrap();
//!     cycle.wake(&mut fabric, &event).unwrap();
//! }
//!
//! // SLEEP: consolidate the repeated pattern into long-term memory.
//! let report = cycle.sleep(&mut fabric).unwrap();
//! assert_eq!(report.promoted, 1);
//! assert!(fabric.association("cat", "mouse") >= 0.7);
//! ```
//!
//! ## Architecture
//!
//! Neuroweave is organized into two crates:
//!
//! - [`neuroweave_core`] - The synaptic fabric: neurons, synapses,
//!   spreading activation, Hebbian plasticity, relational extraction,
//!   snapshots
//! - [`neuroweave_runtime`] - The memory cycle scheduler, concurrent
//!   fabric handle, session persistence, and the research oracle
//!
//! ## Key Concepts
//!
//! ### The Synaptic Fabric
//!
//! Neurons are created lazily, one per grounded symbol, and never
//! deleted. Synapses carry all the meaning: a weight in `[0, w_max]`
//! grown by co-activation and shrunk by homeostasis and forgetting.
//!
//! ### Spreading Activation
//!
//! Every query and percept is a propagation: energy is injected at seed
//! neurons and flows along synapses, attenuated by weight and hop decay,
//! until the energy budget or depth limit stops it. Results are
//! deterministic for a fixed graph state.
//!
//! ### The Memory Cycle
//!
//! WAKE buffers every non-trivial activation as a short-term trace.
//! SLEEP promotes repeated traces to long-term synapses (atomically,
//! behind a commit log), replays consolidated patterns ("dreaming"),
//! and prunes weak stale synapses. A crash mid-SLEEP loses only
//! uncommitted traces.
//!
//! ## Session Persistence
//!
//! Save and resume a complete session:
//!
//! ```rust,ignore
//! use neuroweave::prelude::*;
//! use std::path::Path;
//!
//! save_session(Path::new("session.json"), session_id, &fabric, &cycle).unwrap();
//!
//! let state = load_session(Path::new("session.json")).unwrap();
//! let resumed = resume(state, FabricConfig::default(), CycleConfig::default()).unwrap();
//! ```

// Re-export the subcrates
pub use neuroweave_core as core;
pub use neuroweave_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use neuroweave::prelude::*;
/// ```
pub mod prelude {
    pub use neuroweave_core::prelude::*;
    pub use neuroweave_runtime::prelude::*;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
