//! Error types for Neuroweave operations.
//!
//! Perceptual and grounding problems are absorbed locally (an unknown
//! symbol creates a neuron, a weight overflow is renormalized); only
//! structural invariant violations and persistence failures surface here.

use std::error::Error;
use std::fmt;

/// Result type for Neuroweave operations.
pub type Result<T> = std::result::Result<T, WeaveError>;

/// Errors that can occur during Neuroweave operations.
#[derive(Debug, Clone)]
pub enum WeaveError {
    /// Structural fabric errors.
    Fabric(FabricError),
    /// Snapshot/session errors.
    Snapshot(SnapshotError),
    /// External research provider errors.
    Oracle(OracleError),
    /// Configuration errors.
    Config(ConfigError),
    /// I/O errors (wrapped).
    Io(String),
    /// Serialization errors.
    Serialization(String),
}

impl fmt::Display for WeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaveError::Fabric(e) => write!(f, "Fabric error: {}", e),
            WeaveError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            WeaveError::Oracle(e) => write!(f, "Oracle error: {}", e),
            WeaveError::Config(e) => write!(f, "Config error: {}", e),
            WeaveError::Io(msg) => write!(f, "I/O error: {}", msg),
            WeaveError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl Error for WeaveError {}

impl From<std::io::Error> for WeaveError {
    fn from(e: std::io::Error) -> Self {
        WeaveError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(e: serde_json::Error) -> Self {
        WeaveError::Serialization(e.to_string())
    }
}

/// Structural invariant violations in the synaptic fabric.
///
/// All of these are fatal: the fabric halts further mutation and must be
/// restored from the last valid snapshot.
#[derive(Debug, Clone)]
pub enum FabricError {
    /// A synapse references a neuron outside the arena.
    DanglingSynapse { source: u64, target: u64 },
    /// A weight escaped `[0, w_max]` outside the normal update paths.
    WeightOutOfRange { source: u64, target: u64, weight: f64 },
    /// An operation referenced a neuron id outside the arena.
    NoSuchNeuron(u64),
    /// Mutation was attempted after corruption was detected.
    Halted,
    /// A writer panicked while holding the fabric lock.
    LockPoisoned,
}

impl fmt::Display for FabricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FabricError::DanglingSynapse { source, target } => {
                write!(f, "Dangling synapse n{} -> n{}", source, target)
            }
            FabricError::WeightOutOfRange { source, target, weight } => {
                write!(f, "Weight out of range on n{} -> n{}: {}", source, target, weight)
            }
            FabricError::NoSuchNeuron(id) => write!(f, "No such neuron: n{}", id),
            FabricError::Halted => write!(f, "Fabric halted after corruption; restore from snapshot"),
            FabricError::LockPoisoned => write!(f, "Fabric lock poisoned by a panicked writer"),
        }
    }
}

/// Snapshot and session persistence errors.
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// Schema version tag does not match this build.
    VersionMismatch { expected: u32, found: u32 },
    /// Payload failed integrity verification on restore.
    Corrupt(String),
    /// Session file missing.
    NotFound(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::VersionMismatch { expected, found } => {
                write!(f, "Version mismatch: expected {}, found {}", expected, found)
            }
            SnapshotError::Corrupt(msg) => write!(f, "Snapshot corrupt: {}", msg),
            SnapshotError::NotFound(path) => write!(f, "Session not found: {}", path),
        }
    }
}

/// External research provider errors.
///
/// Never surfaced to the cognitive cycle: the oracle retries once and
/// then degrades to "no new information".
#[derive(Debug, Clone)]
pub enum OracleError {
    /// The provider did not answer within the configured timeout.
    Timeout,
    /// The provider answered with a failure.
    Unavailable(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Timeout => write!(f, "Research provider timed out"),
            OracleError::Unavailable(msg) => write!(f, "Research provider unavailable: {}", msg),
        }
    }
}

/// Configuration errors, rejected at construction time.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Invalid value.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// Out of range.
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: {} ({})", field, value, reason)
            }
            ConfigError::OutOfRange { field, min, max, value } => {
                write!(f, "{} out of range: {} (must be {}-{})", field, value, min, max)
            }
        }
    }
}

// Convenience constructors
impl WeaveError {
    pub fn dangling_synapse(source: u64, target: u64) -> Self {
        WeaveError::Fabric(FabricError::DanglingSynapse { source, target })
    }

    pub fn weight_out_of_range(source: u64, target: u64, weight: f64) -> Self {
        WeaveError::Fabric(FabricError::WeightOutOfRange { source, target, weight })
    }

    pub fn no_such_neuron(id: u64) -> Self {
        WeaveError::Fabric(FabricError::NoSuchNeuron(id))
    }

    pub fn halted() -> Self {
        WeaveError::Fabric(FabricError::Halted)
    }

    pub fn lock_poisoned() -> Self {
        WeaveError::Fabric(FabricError::LockPoisoned)
    }

    pub fn snapshot_corrupt(msg: impl Into<String>) -> Self {
        WeaveError::Snapshot(SnapshotError::Corrupt(msg.into()))
    }

    pub fn config_invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        WeaveError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        })
    }

    pub fn config_out_of_range(field: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        WeaveError::Config(ConfigError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }

    /// Whether this error is fatal for the fabric (structural corruption).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WeaveError::Fabric(
                FabricError::DanglingSynapse { .. }
                    | FabricError::WeightOutOfRange { .. }
                    | FabricError::Halted
            )
        )
    }
}
