//! Session persistence: one JSON file holding the fabric snapshot and
//! the scheduler state (buffer, commit log, consolidated patterns).
//!
//! Saving is atomic at the file level (write to a temp path, then
//! rename), and resuming applies the crash contract: a session saved
//! mid-SLEEP comes back in WAKE with its uncommitted traces discarded,
//! while everything the commit log recorded stays applied exactly once.

use crate::scheduler::{CycleConfig, CycleState, MemoryCycle};
use neuroweave_core::config::FabricConfig;
use neuroweave_core::error::{Result, SnapshotError, WeaveError};
use neuroweave_core::fabric::Fabric;
use neuroweave_core::snapshot::FabricSnapshot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Schema version of the session file layout.
pub const SESSION_VERSION: u32 = 1;

/// Everything needed to resume a cognitive session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub version: u32,
    pub session_id: Uuid,
    pub fabric: FabricSnapshot,
    pub cycle: CycleState,
}

/// A resumed session, with the crash contract already applied.
pub struct ResumedSession {
    pub session_id: Uuid,
    pub fabric: Fabric,
    pub cycle: MemoryCycle,
    /// Uncommitted traces discarded because the save happened mid-SLEEP.
    pub discarded_traces: usize,
}

/// Persist the current session to `path`.
pub fn save_session(
    path: &Path,
    session_id: Uuid,
    fabric: &Fabric,
    cycle: &MemoryCycle,
) -> Result<()> {
    let state = SessionState {
        version: SESSION_VERSION,
        session_id,
        fabric: fabric.snapshot(),
        cycle: cycle.export_state(),
    };
    let json = serde_json::to_string_pretty(&state)?;

    // Write-then-rename so a crash mid-save leaves the old file intact.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), %session_id, "session saved");
    Ok(())
}

/// Load a persisted session from `path`.
pub fn load_session(path: &Path) -> Result<SessionState> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WeaveError::Snapshot(SnapshotError::NotFound(
                path.display().to_string(),
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let state: SessionState = serde_json::from_str(&json)?;
    if state.version != SESSION_VERSION {
        return Err(WeaveError::Snapshot(SnapshotError::VersionMismatch {
            expected: SESSION_VERSION,
            found: state.version,
        }));
    }
    Ok(state)
}

/// Rebuild the fabric and scheduler from persisted state and apply the
/// crash contract.
pub fn resume(
    state: SessionState,
    fabric_config: FabricConfig,
    cycle_config: CycleConfig,
) -> Result<ResumedSession> {
    let fabric = Fabric::restore(state.fabric, fabric_config.clone())?;
    let mut cycle = MemoryCycle::from_state(fabric_config, cycle_config, state.cycle)?;
    let discarded_traces = cycle.recover();
    Ok(ResumedSession {
        session_id: state.session_id,
        fabric,
        cycle,
        discarded_traces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::CyclePhase;
    use neuroweave_core::types::{ActivationEvent, NeuronId, NeuronKind};

    fn seeded() -> (Fabric, MemoryCycle, Vec<NeuronId>) {
        let mut fabric = Fabric::new(FabricConfig::default()).unwrap();
        let mut cycle =
            MemoryCycle::new(FabricConfig::default(), CycleConfig::default()).unwrap();
        let ids: Vec<NeuronId> = ["cat", "mouse"]
            .iter()
            .map(|s| fabric.get_or_create_neuron(s, NeuronKind::Concept).unwrap())
            .collect();
        let mut event = ActivationEvent::default();
        for &id in &ids {
            event.levels.insert(id, 1.0);
        }
        for _ in 0..3 {
            cycle.observe(&event);
        }
        (fabric, cycle, ids)
    }

    #[test]
    fn save_load_resume_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let (fabric, cycle, _) = seeded();
        let id = Uuid::new_v4();

        save_session(&path, id, &fabric, &cycle).unwrap();
        let state = load_session(&path).unwrap();
        let resumed = resume(state, FabricConfig::default(), CycleConfig::default()).unwrap();

        assert_eq!(resumed.session_id, id);
        assert_eq!(resumed.fabric.neuron_count(), 2);
        assert_eq!(resumed.cycle.phase(), CyclePhase::Wake);
        assert_eq!(resumed.cycle.buffered(), 1);
        assert_eq!(resumed.discarded_traces, 0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_session(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            WeaveError::Snapshot(SnapshotError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_session(&path).unwrap_err();
        assert!(matches!(err, WeaveError::Serialization(_)));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let (fabric, cycle, _) = seeded();
        save_session(&path, Uuid::new_v4(), &fabric, &cycle).unwrap();

        let mut raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        raw["version"] = serde_json::json!(99);
        fs::write(&path, raw.to_string()).unwrap();

        let err = load_session(&path).unwrap_err();
        assert!(matches!(
            err,
            WeaveError::Snapshot(SnapshotError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn interrupted_sleep_commits_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let (mut fabric, mut cycle, strong) = seeded();

        // A second, weaker trace that stays uncommitted.
        let pending: Vec<NeuronId> = ["e", "f"]
            .iter()
            .map(|s| fabric.get_or_create_neuron(s, NeuronKind::Concept).unwrap())
            .collect();
        let mut event = ActivationEvent::default();
        for &id in &pending {
            event.levels.insert(id, 1.0);
        }
        for _ in 0..3 {
            cycle.observe(&event);
        }

        // SLEEP begins, one trace commits, then the process dies.
        cycle.begin_sleep();
        cycle.consolidate_step(&mut fabric).unwrap();
        save_session(&path, Uuid::new_v4(), &fabric, &cycle).unwrap();

        let state = load_session(&path).unwrap();
        let resumed = resume(state, FabricConfig::default(), CycleConfig::default()).unwrap();
        assert_eq!(resumed.discarded_traces, 1);
        assert_eq!(resumed.cycle.phase(), CyclePhase::Wake);
        assert_eq!(resumed.cycle.committed_count(), 1);

        // The committed promotion was applied exactly once: the weight
        // sits at the promotion floor, not above it.
        let w = resumed
            .fabric
            .synapse(strong[0], strong[1])
            .unwrap()
            .weight;
        assert!((w - 0.7).abs() < 1e-9);
        // The uncommitted pattern left no long-term synapse behind.
        assert!(resumed.fabric.synapse(pending[0], pending[1]).is_none());
    }
}
