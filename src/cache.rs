//! Per-scope instance caches.
//!
//! Every caching [`Scope`](crate::Scope) of a registry shares one `CacheStore`;
//! entries are indexed by `(ScopeId, Key)` so resetting one scope instance
//! leaves the others alone.

use std::any::Any;
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::key::Key;
use crate::scope::{Retention, ScopeId};

/// Type-erased holder: an `Arc<T>` or a `Weak<T>` for some `T`.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// One cached value.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    held: AnyArc,
    retention: Retention,
    // Monomorphized probe so liveness can be checked without knowing `T`.
    alive: fn(&AnyArc) -> bool,
}

impl CacheEntry {
    fn new<T: ?Sized + Send + Sync + 'static>(value: &Arc<T>, retention: Retention) -> Self {
        match retention {
            Retention::Strong => Self {
                held: Arc::new(value.clone()),
                retention,
                alive: |_| true,
            },
            Retention::Weak => Self {
                held: Arc::new(Arc::downgrade(value)),
                retention,
                alive: weak_alive::<T>,
            },
        }
    }

    /// Recovers the value, or `None` for a dead weak entry.
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let value = match self.retention {
            Retention::Strong => self.held.downcast_ref::<Arc<T>>().cloned(),
            Retention::Weak => self.held.downcast_ref::<Weak<T>>().and_then(Weak::upgrade),
        };
        if value.is_none() && self.is_alive() {
            // Same key, different value type: two slots ended up sharing a key.
            panic!(
                "cache entry does not hold a {}; slot keys collided",
                std::any::type_name::<T>()
            );
        }
        value
    }

    pub(crate) fn is_alive(&self) -> bool {
        (self.alive)(&self.held)
    }
}

fn weak_alive<T: ?Sized + Send + Sync + 'static>(held: &AnyArc) -> bool {
    held.downcast_ref::<Weak<T>>()
        .map_or(false, |weak| weak.strong_count() > 0)
}

/// Plain map of cache entries; cloned whole for snapshots.
#[derive(Clone, Default)]
pub(crate) struct CacheMap {
    entries: AHashMap<(ScopeId, Key), CacheEntry>,
}

impl CacheMap {
    /// Live entries (dead weak entries do not count).
    pub(crate) fn live(&self) -> impl Iterator<Item = (&(ScopeId, Key), &CacheEntry)> {
        self.entries.iter().filter(|(_, entry)| entry.is_alive())
    }
}

/// Entries plus the generation they belong to.
///
/// Every eviction or restore bumps `generation`; it is never rolled back.
#[derive(Default)]
struct CacheState {
    map: CacheMap,
    generation: u64,
}

impl CacheState {
    fn lookup<T: ?Sized + Send + Sync + 'static>(&self, key: Key, scope: ScopeId) -> Option<Arc<T>> {
        let entry = self.map.entries.get(&(scope, key))?;
        let value = entry.get::<T>();
        if value.is_none() {
            trace!(%key, ?scope, "weak entry expired");
        }
        value
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Thread-safe cache of produced instances.
pub(crate) struct CacheStore {
    state: Mutex<CacheState>,
}

impl CacheStore {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the cached instance for `key` in `scope`, producing it on a miss.
    ///
    /// The lock is released while `producer` runs so producers can resolve
    /// other factories. If another thread filled the entry meanwhile, its
    /// value wins and ours is discarded. A failing producer leaves the store
    /// untouched.
    ///
    /// If the store was reset or restored while `producer` ran, the value is
    /// returned to this caller only and not cached: the producer may have
    /// been chosen from registrations that no longer apply. Callers must pick
    /// the producer inside `producer`, after this method has read the
    /// generation.
    pub(crate) fn get_or_create<T, E, F>(
        &self,
        key: Key,
        scope: ScopeId,
        retention: Retention,
        producer: F,
    ) -> Result<Arc<T>, E>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        let generation = {
            let state = self.state.lock();
            if let Some(hit) = state.lookup::<T>(key, scope) {
                trace!(%key, ?scope, "cache hit");
                return Ok(hit);
            }
            state.generation
        };

        trace!(%key, ?scope, ?retention, "cache miss");
        let value = producer()?;

        let mut state = self.state.lock();
        if state.generation != generation {
            trace!(%key, ?scope, "cache invalidated during construction, not caching");
            return Ok(value);
        }
        if let Some(existing) = state.lookup::<T>(key, scope) {
            return Ok(existing);
        }
        state
            .map
            .entries
            .insert((scope, key), CacheEntry::new(&value, retention));
        Ok(value)
    }

    /// Drops the entries of `key` in every scope instance.
    pub(crate) fn reset(&self, key: Key) -> usize {
        let mut state = self.state.lock();
        state.invalidate();
        let before = state.map.entries.len();
        state.map.entries.retain(|(_, k), _| *k != key);
        before - state.map.entries.len()
    }

    /// Drops every entry of one scope instance.
    pub(crate) fn reset_scope_instance(&self, scope: ScopeId) -> usize {
        let mut state = self.state.lock();
        state.invalidate();
        let before = state.map.entries.len();
        state.map.entries.retain(|(s, _), _| *s != scope);
        before - state.map.entries.len()
    }

    pub(crate) fn reset_all(&self) {
        let mut state = self.state.lock();
        state.invalidate();
        state.map.entries.clear();
    }

    /// Number of live entries held for `scope`.
    pub(crate) fn count(&self, scope: ScopeId) -> usize {
        self.state
            .lock()
            .map
            .live()
            .filter(|((s, _), _)| *s == scope)
            .count()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().map.entries.len()
    }

    pub(crate) fn snapshot(&self) -> CacheMap {
        self.state.lock().map.clone()
    }

    pub(crate) fn restore(&self, snapshot: CacheMap) {
        let mut state = self.state.lock();
        state.invalidate();
        state.map = snapshot;
    }
}
