//! The shared registry state: slots, overrides, caches and snapshots.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::CacheStore;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::key::{Key, SlotTable};
use crate::observer::{Observers, RegistryObserver, TracingObserver};
use crate::registration::RegistrationStore;
use crate::scope::Scope;
use crate::snapshot::{Snapshot, SnapshotStack};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

// Created on first access, torn down with the process.
static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// What a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOptions {
    /// Overrides and cached instances.
    All,
    /// Overrides only.
    Registration,
    /// Cached instances only.
    Scope,
    /// Nothing.
    None,
}

impl ResetOptions {
    fn registrations(self) -> bool {
        matches!(self, ResetOptions::All | ResetOptions::Registration)
    }

    fn caches(self) -> bool {
        matches!(self, ResetOptions::All | ResetOptions::Scope)
    }
}

/// Process-wide state shared by a tree of containers.
///
/// A `Registry` owns the slot table that hands out [`Key`]s, the override
/// store, the instance caches of every scope, and the snapshot stack used by
/// tests. Cloning is cheap and yields a handle to the same state; containers
/// derived from one another share one registry, isolated containers get
/// their own.
///
/// Each store sits behind its own mutex and is only locked for the duration
/// of a map operation, never while a producer runs.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, Registry, Scope};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// let registry: &Registry = container.registry();
/// let config = container.factory(|| String::from("prod")).with_scope(Scope::SINGLETON);
///
/// registry.push();
/// config.register(|| String::from("test"));
/// assert_eq!(*config.call(), "test");
/// registry.pop();
///
/// assert_eq!(*config.call(), "prod");
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    id: u64,
    config: RegistryConfig,
    slots: Mutex<SlotTable>,
    registrations: RegistrationStore,
    cache: CacheStore,
    snapshots: SnapshotStack,
    observers: Observers,
}

impl Registry {
    /// Creates an empty registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry.
    pub fn with_config(config: RegistryConfig) -> Self {
        let observers = Observers::new();
        if config.trace {
            observers.add(Arc::new(TracingObserver::new()));
        }
        let registry = Self {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                config,
                slots: Mutex::new(SlotTable::new()),
                registrations: RegistrationStore::new(),
                cache: CacheStore::new(),
                snapshots: SnapshotStack::new(),
                observers,
            }),
        };
        debug!(registry = registry.inner.id, "registry created");
        registry
    }

    /// The process-wide root registry, created on first access.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        self.inner.observers.add(observer);
    }

    // ===== Slot declaration =====

    /// Allocates a key for a new slot, or finds the key of a named one.
    pub(crate) fn declare(
        &self,
        name: Option<&'static str>,
        type_id: TypeId,
        type_name: &'static str,
    ) -> RegistryResult<Key> {
        let mut slots = self.inner.slots.lock();
        let key = match name {
            Some(name) => slots.lookup_or_allocate(name, type_id, type_name)?,
            None => slots.allocate(type_name, type_id, type_name),
        };
        debug!(registry = self.inner.id, %key, slot = name.unwrap_or(type_name), "slot declared");
        Ok(key)
    }

    /// Name of the slot behind `key`.
    pub fn slot_name(&self, key: Key) -> Option<&'static str> {
        self.inner.slots.lock().get(key).map(|slot| slot.name)
    }

    pub fn slot_count(&self) -> usize {
        self.inner.slots.lock().len()
    }

    // ===== Overrides =====

    /// Installs `producer` as the override for `key` and evicts the key's
    /// cached instances, so the next resolution uses it.
    pub(crate) fn register<P>(&self, key: Key, name: &'static str, producer: P)
    where
        P: std::any::Any + Send + Sync,
    {
        self.inner.registrations.register(key, producer);
        self.inner.cache.reset(key);
        debug!(registry = self.inner.id, %key, slot = name, "override registered");
        self.inner.observers.registered(key, name);
    }

    /// The producer to use for `key`: its override, else `default`.
    pub(crate) fn resolve_producer<P>(&self, key: Key, default: &P) -> P
    where
        P: std::any::Any + Clone,
    {
        self.inner.registrations.resolve_producer(key, default)
    }

    pub fn is_overridden(&self, key: Key) -> bool {
        self.inner.registrations.contains(key)
    }

    pub fn override_count(&self) -> usize {
        self.inner.registrations.len()
    }

    /// Resets one slot.
    ///
    /// Removing an override also evicts the slot's cached instances so the
    /// default producer takes over on the next resolution.
    pub fn reset_key(&self, key: Key, options: ResetOptions) {
        let mut evict = options.caches();
        if options.registrations() && self.inner.registrations.reset(key) {
            evict = true;
        }
        if evict {
            self.inner.cache.reset(key);
        }
        debug!(registry = self.inner.id, %key, ?options, "slot reset");
        self.inner.observers.reset(Some(key), options);
    }

    /// Resets every slot.
    pub fn reset(&self, options: ResetOptions) {
        if options.caches() {
            self.inner.cache.reset_all();
        }
        if options.registrations() {
            for key in self.inner.registrations.reset_all() {
                self.inner.cache.reset(key);
            }
        }
        debug!(registry = self.inner.id, ?options, "registry reset");
        self.inner.observers.reset(None, options);
    }

    // ===== Caches =====

    pub(crate) fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Drops every instance cached by one scope instance.
    ///
    /// Resetting [`Scope::UNIQUE`] is a no-op.
    pub fn reset_scope(&self, scope: &Scope) {
        let Some(id) = scope.id() else {
            return;
        };
        let dropped = self.inner.cache.reset_scope_instance(id);
        debug!(registry = self.inner.id, %scope, dropped, "scope reset");
        self.inner.observers.scope_reset(scope);
    }

    /// Number of live instances cached by `scope`.
    pub fn cached_count(&self, scope: &Scope) -> usize {
        scope.id().map_or(0, |id| self.inner.cache.count(id))
    }

    // ===== Snapshots =====

    /// Saves the current overrides and caches.
    ///
    /// Pair every `push` with a [`pop`](Registry::pop); pushes nest.
    pub fn push(&self) {
        let snapshot = Snapshot {
            registrations: self.inner.registrations.snapshot(),
            cache: self.inner.cache.snapshot(),
        };
        let depth = self.inner.snapshots.push(snapshot);
        debug!(registry = self.inner.id, depth, "snapshot pushed");
        self.inner.observers.pushed(depth);
    }

    /// Restores the state saved by the most recent [`push`](Registry::push),
    /// discarding every override and cached instance created since.
    ///
    /// # Panics
    ///
    /// Panics when there is no matching `push`. An unbalanced pop means test
    /// setup and teardown disagree, and carrying on would leak state between
    /// tests. Use [`try_pop`](Registry::try_pop) to handle it instead.
    pub fn pop(&self) {
        if let Err(err) = self.try_pop() {
            panic!("{}", err);
        }
    }

    /// Like [`pop`](Registry::pop), reporting an unbalanced pop as an error.
    pub fn try_pop(&self) -> RegistryResult<()> {
        let (snapshot, depth) = self.inner.snapshots.pop().map_err(|err| {
            tracing::error!(registry = self.inner.id, "pop without matching push");
            err
        })?;
        self.inner.registrations.restore(snapshot.registrations);
        self.inner.cache.restore(snapshot.cache);
        debug!(registry = self.inner.id, depth, "snapshot popped");
        self.inner.observers.popped(depth);
        Ok(())
    }

    pub fn snapshot_depth(&self) -> usize {
        self.inner.snapshots.depth()
    }

    // ===== Internals for factories =====

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    /// Human-readable dump of slots, overrides and cache entries.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let _ = writeln!(s, "=== Registry #{} ===", self.inner.id);
        s.push_str("Slots:\n");
        for (key, slot) in self.inner.slots.lock().iter() {
            let _ = writeln!(s, "  {}: {} ({})", key, slot.name, slot.type_name);
        }
        s.push_str("Overrides:\n");
        let mut overridden: Vec<Key> = self.inner.registrations.snapshot().keys().collect();
        overridden.sort();
        for key in overridden {
            let _ = writeln!(s, "  {}", key);
        }
        s.push_str("Cached:\n");
        let cache = self.inner.cache.snapshot();
        let mut live: Vec<_> = cache.live().map(|(entry, _)| *entry).collect();
        live.sort();
        for (scope, key) in live {
            let _ = writeln!(s, "  {:?} {}", scope, key);
        }
        s
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.inner.id)
            .field("slots", &self.slot_count())
            .field("overrides", &self.override_count())
            .field("snapshot_depth", &self.snapshot_depth())
            .finish()
    }
}
