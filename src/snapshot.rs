//! Saved registry states for test isolation.

use parking_lot::Mutex;

use crate::cache::CacheMap;
use crate::error::{RegistryError, RegistryResult};
use crate::registration::RegistrationMap;

/// Immutable copy of a registry's overrides and caches.
pub(crate) struct Snapshot {
    pub(crate) registrations: RegistrationMap,
    pub(crate) cache: CacheMap,
}

/// LIFO stack of snapshots.
#[derive(Default)]
pub(crate) struct SnapshotStack {
    stack: Mutex<Vec<Snapshot>>,
}

impl SnapshotStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pushes a snapshot and returns the new depth.
    pub(crate) fn push(&self, snapshot: Snapshot) -> usize {
        let mut stack = self.stack.lock();
        stack.push(snapshot);
        stack.len()
    }

    /// Pops the most recent snapshot, returning it with the remaining depth.
    pub(crate) fn pop(&self) -> RegistryResult<(Snapshot, usize)> {
        let mut stack = self.stack.lock();
        let snapshot = stack.pop().ok_or(RegistryError::UnbalancedPop)?;
        Ok((snapshot, stack.len()))
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.lock().len()
    }
}
