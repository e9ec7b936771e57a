//! Concurrent access to a single fabric.
//!
//! Queries take a read lock and observe a consistent snapshot of the
//! substrate; mutation (encoding, learning, the whole SLEEP pass) takes
//! the write lock. SLEEP holding the write lock end to end is what makes
//! the phase exclusive: no query can observe a half-consolidated fabric.

use crate::scheduler::{MemoryCycle, SleepReport};
use neuroweave_core::config::FabricConfig;
use neuroweave_core::error::{Result, WeaveError};
use neuroweave_core::fabric::Fabric;
use std::sync::{Arc, RwLock};

/// A cloneable, thread-safe handle to one fabric.
#[derive(Clone)]
pub struct SharedFabric {
    inner: Arc<RwLock<Fabric>>,
}

impl SharedFabric {
    pub fn new(config: FabricConfig) -> Result<Self> {
        Ok(Self::from_fabric(Fabric::new(config)?))
    }

    pub fn from_fabric(fabric: Fabric) -> Self {
        Self {
            inner: Arc::new(RwLock::new(fabric)),
        }
    }

    /// Run a closure under the read lock. Many readers may hold it at
    /// once; each sees a consistent snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&Fabric) -> R) -> Result<R> {
        let guard = self.inner.read().map_err(|_| WeaveError::lock_poisoned())?;
        Ok(f(&guard))
    }

    /// Run a closure under the exclusive write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Fabric) -> R) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| WeaveError::lock_poisoned())?;
        Ok(f(&mut guard))
    }

    /// Fallible variant of [`write`](Self::write) for closures that
    /// return a `Result` themselves.
    pub fn try_write<R>(&self, f: impl FnOnce(&mut Fabric) -> Result<R>) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| WeaveError::lock_poisoned())?;
        f(&mut guard)
    }

    /// Run a full SLEEP pass under the write lock, so the phase is
    /// exclusive with respect to every reader and writer.
    pub fn sleep(&self, cycle: &mut MemoryCycle) -> Result<SleepReport> {
        self.try_write(|fabric| cycle.sleep(fabric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroweave_core::types::NeuronKind;
    use std::thread;

    #[test]
    fn readers_and_writers_share_one_fabric() {
        let shared = SharedFabric::new(FabricConfig::default()).unwrap();
        shared
            .try_write(|fabric| {
                fabric.encode(&[
                    ("cat", NeuronKind::Concept, 1.0),
                    ("mouse", NeuronKind::Concept, 1.0),
                ])?;
                Ok(())
            })
            .unwrap();

        let count = shared.read(|fabric| fabric.neuron_count()).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn concurrent_readers_observe_consistent_state() {
        let shared = SharedFabric::new(FabricConfig::default()).unwrap();
        shared
            .try_write(|fabric| {
                let a = fabric.get_or_create_neuron("a", NeuronKind::Concept)?;
                let b = fabric.get_or_create_neuron("b", NeuronKind::Concept)?;
                fabric.reinforce(a, b, 0.5)
            })
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .read(|fabric| (fabric.neuron_count(), fabric.synapse_count()))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (2, 1));
        }
    }

    #[test]
    fn sleep_holds_the_write_lock_end_to_end() {
        use crate::scheduler::CycleConfig;
        let shared = SharedFabric::new(FabricConfig::default()).unwrap();
        let mut cycle =
            MemoryCycle::new(FabricConfig::default(), CycleConfig::default()).unwrap();

        let event = shared
            .try_write(|fabric| {
                fabric.encode(&[
                    ("a", NeuronKind::Concept, 1.0),
                    ("b", NeuronKind::Concept, 1.0),
                ])
            })
            .unwrap();
        for _ in 0..3 {
            cycle.observe(&event);
        }

        let report = shared.sleep(&mut cycle).unwrap();
        assert_eq!(report.promoted, 1);
        let cycle_count = shared.read(|fabric| fabric.cycle()).unwrap();
        assert_eq!(cycle_count, 1);
    }
}
