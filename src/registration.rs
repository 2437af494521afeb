//! Override registrations.

use std::any::Any;
use std::convert::Infallible;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::cache::AnyArc;
use crate::key::Key;

/// A zero-argument service constructor.
///
/// Producers hand back `Arc<T>` so the same value can be cached and shared.
/// Infallible producers use `E = Infallible`.
pub type Producer<T, E = Infallible> = Arc<dyn Fn() -> Result<Arc<T>, E> + Send + Sync>;

/// A one-argument service constructor, used by
/// [`ParameterFactory`](crate::ParameterFactory).
pub type ParameterProducer<P, T, E = Infallible> =
    Arc<dyn Fn(P) -> Result<Arc<T>, E> + Send + Sync>;

/// Plain map of overrides; cloned whole for snapshots.
#[derive(Clone, Default)]
pub(crate) struct RegistrationMap {
    overrides: AHashMap<Key, AnyArc>,
}

impl RegistrationMap {
    #[cfg(feature = "diagnostics")]
    pub(crate) fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.overrides.keys().copied()
    }
}

/// Thread-safe store of override producers keyed by slot.
///
/// Producers are stored type-erased; the factory that owns the key knows
/// the concrete producer type and recovers it on lookup.
pub(crate) struct RegistrationStore {
    map: Mutex<RegistrationMap>,
}

impl RegistrationStore {
    pub(crate) fn new() -> Self {
        Self {
            map: Mutex::new(RegistrationMap::default()),
        }
    }

    /// Installs or replaces the override for `key`. Last writer wins.
    pub(crate) fn register<P>(&self, key: Key, producer: P)
    where
        P: Any + Send + Sync,
    {
        self.map.lock().overrides.insert(key, Arc::new(producer));
    }

    /// The override registered for `key`, if any.
    pub(crate) fn get<P>(&self, key: Key) -> Option<P>
    where
        P: Any + Clone,
    {
        let map = self.map.lock();
        let held = map.overrides.get(&key)?;
        match held.downcast_ref::<P>() {
            Some(producer) => Some(producer.clone()),
            None => panic!(
                "override for slot {} is not a {}; slot keys collided",
                key,
                std::any::type_name::<P>()
            ),
        }
    }

    /// The override for `key`, or `default` when none is registered.
    pub(crate) fn resolve_producer<P>(&self, key: Key, default: &P) -> P
    where
        P: Any + Clone,
    {
        self.get(key).unwrap_or_else(|| default.clone())
    }

    pub(crate) fn contains(&self, key: Key) -> bool {
        self.map.lock().overrides.contains_key(&key)
    }

    /// Removes the override for `key`. Returns whether one existed.
    pub(crate) fn reset(&self, key: Key) -> bool {
        self.map.lock().overrides.remove(&key).is_some()
    }

    /// Removes every override, returning the keys that had one.
    pub(crate) fn reset_all(&self) -> Vec<Key> {
        self.map.lock().overrides.drain().map(|(key, _)| key).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.lock().overrides.len()
    }

    pub(crate) fn snapshot(&self) -> RegistrationMap {
        self.map.lock().clone()
    }

    pub(crate) fn restore(&self, snapshot: RegistrationMap) {
        *self.map.lock() = snapshot;
    }
}
