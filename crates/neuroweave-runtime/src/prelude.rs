//! Neuroweave Runtime Prelude - convenient imports for common usage.
//!
//! ```rust
//! use neuroweave_runtime::prelude::*;
//! ```

pub use crate::oracle::{Oracle, OracleConfig, ResearchProvider};
pub use crate::scheduler::{
    CycleConfig, CycleEvent, CyclePhase, CycleState, CycleStats, MemoryCycle, SleepReport,
};
pub use crate::session::{
    load_session, resume, save_session, ResumedSession, SessionState, SESSION_VERSION,
};
pub use crate::shared::SharedFabric;
