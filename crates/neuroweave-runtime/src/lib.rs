//! # Neuroweave Runtime
//!
//! The operational layer around the synaptic fabric: the WAKE/SLEEP
//! memory cycle, concurrent access, session persistence, and the
//! asynchronous research oracle.
//!
//! - **MemoryCycle** - buffers short-term traces during WAKE, then
//!   consolidates, replays, and forgets during an exclusive SLEEP pass,
//!   with a commit log that makes promotion exactly-once across crashes
//! - **SharedFabric** - `Arc<RwLock>` handle; readers see consistent
//!   snapshots while SLEEP holds the write lock
//! - **session** - save/load/resume with the crash contract applied
//! - **Oracle** - external research with timeout, one retry, and
//!   graceful degradation; answers re-enter through perception
//!
//! ## Quick Start
//!
//! ```rust
//! use neuroweave_core::prelude::*;
//! use neuroweave_runtime::prelude::*;
//!
//! let mut fabric = Fabric::new(FabricConfig::default()).unwrap();
//! let mut cycle = MemoryCycle::new(FabricConfig::default(), CycleConfig::default()).unwrap();
//!
//! // WAKE: perceive and learn.
//! for _ in 0..3 {
//!     let event = fabric
//!         .encode(&[("cat", NeuronKind::Concept, 1.0), ("mouse", NeuronKind::Concept, 1.0)])
//!         .unwrap();
//!     cycle.wake(&mut fabric, &event).unwrap();
//! }
//!
//! // SLEEP: consolidate, dream, forget.
//! let report = cycle.sleep(&mut fabric).unwrap();
//! assert_eq!(report.promoted, 1);
//! ```

pub mod oracle;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod prelude;
