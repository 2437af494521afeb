//! Diagnostic observers for registry traceability.
//!
//! Observers receive resolution and mutation events from a
//! [`Registry`](crate::Registry): every factory call, every override
//! installed or removed, every snapshot pushed or popped. They are the hook
//! for structured tracing, timing and test assertions about who resolved
//! what.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::key::Key;
use crate::registry::ResetOptions;
use crate::scope::Scope;

/// Observer trait for registry events.
///
/// `resolving` and `resolved` are required; the mutation hooks default to
/// no-ops.
///
/// # Performance
///
/// Observer calls are made synchronously on the resolving thread. Keep
/// implementations lightweight. When no observer is attached the registry
/// skips timing entirely.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, Key, RegistryObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl RegistryObserver for Counting {
///     fn resolving(&self, _key: Key, _name: &'static str) {}
///     fn resolved(&self, _key: Key, _name: &'static str, _took: Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let container = Container::new();
/// let observer = Arc::new(Counting::default());
/// container.registry().add_observer(observer.clone());
///
/// let greeting = container.factory(|| "hello");
/// greeting.call();
/// greeting.call();
/// assert_eq!(observer.0.load(Ordering::SeqCst), 2);
/// ```
pub trait RegistryObserver: Send + Sync {
    /// Called before the effective producer is looked up.
    fn resolving(&self, key: Key, name: &'static str);

    /// Called after a successful resolution with the time it took.
    fn resolved(&self, key: Key, name: &'static str, duration: Duration);

    /// Called after an override was installed.
    fn registered(&self, _key: Key, _name: &'static str) {}

    /// Called after a slot (`Some`) or the whole registry (`None`) was reset.
    fn reset(&self, _key: Option<Key>, _options: ResetOptions) {}

    /// Called after every entry of a scope instance was dropped.
    fn scope_reset(&self, _scope: &Scope) {}

    /// Called after a snapshot was pushed, with the new depth.
    fn pushed(&self, _depth: usize) {}

    /// Called after a snapshot was popped, with the remaining depth.
    fn popped(&self, _depth: usize) {}
}

/// Observers attached to one registry.
///
/// Designed to cost a single relaxed load when empty.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
    any: AtomicBool,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.write().push(observer);
        self.any.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        self.any.load(Ordering::Acquire)
    }

    // Observers are cloned out so no lock is held while they run.
    fn each(&self, f: impl Fn(&dyn RegistryObserver)) {
        if !self.has_observers() {
            return;
        }
        let observers = self.observers.read().clone();
        for observer in &observers {
            f(observer.as_ref());
        }
    }

    pub(crate) fn resolving(&self, key: Key, name: &'static str) {
        self.each(|o| o.resolving(key, name));
    }

    pub(crate) fn resolved(&self, key: Key, name: &'static str, duration: Duration) {
        self.each(|o| o.resolved(key, name, duration));
    }

    pub(crate) fn registered(&self, key: Key, name: &'static str) {
        self.each(|o| o.registered(key, name));
    }

    pub(crate) fn reset(&self, key: Option<Key>, options: ResetOptions) {
        self.each(|o| o.reset(key, options));
    }

    pub(crate) fn scope_reset(&self, scope: &Scope) {
        self.each(|o| o.scope_reset(scope));
    }

    pub(crate) fn pushed(&self, depth: usize) {
        self.each(|o| o.pushed(depth));
    }

    pub(crate) fn popped(&self, depth: usize) {
        self.each(|o| o.popped(depth));
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// Installed automatically when [`RegistryConfig::trace`](crate::RegistryConfig)
/// is set.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, TracingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.registry().add_observer(Arc::new(TracingObserver::new()));
/// ```
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    /// Creates a tracing observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-factory".to_string(),
        }
    }

    /// Creates a tracing observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryObserver for TracingObserver {
    fn resolving(&self, key: Key, name: &'static str) {
        tracing::info!(prefix = %self.prefix, %key, slot = name, "resolving");
    }

    fn resolved(&self, key: Key, name: &'static str, duration: Duration) {
        tracing::info!(prefix = %self.prefix, %key, slot = name, ?duration, "resolved");
    }

    fn registered(&self, key: Key, name: &'static str) {
        tracing::info!(prefix = %self.prefix, %key, slot = name, "override registered");
    }

    fn reset(&self, key: Option<Key>, options: ResetOptions) {
        match key {
            Some(key) => tracing::info!(prefix = %self.prefix, %key, ?options, "slot reset"),
            None => tracing::info!(prefix = %self.prefix, ?options, "registry reset"),
        }
    }

    fn scope_reset(&self, scope: &Scope) {
        tracing::info!(prefix = %self.prefix, %scope, "scope reset");
    }

    fn pushed(&self, depth: usize) {
        tracing::info!(prefix = %self.prefix, depth, "snapshot pushed");
    }

    fn popped(&self, depth: usize) {
        tracing::info!(prefix = %self.prefix, depth, "snapshot popped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl RegistryObserver for Recorder {
        fn resolving(&self, key: Key, name: &'static str) {
            self.0.lock().push(format!("resolving {} {}", name, key));
        }
        fn resolved(&self, _key: Key, name: &'static str, _duration: Duration) {
            self.0.lock().push(format!("resolved {}", name));
        }
        fn pushed(&self, depth: usize) {
            self.0.lock().push(format!("pushed {}", depth));
        }
    }

    #[test]
    fn empty_observers_are_skipped() {
        let observers = Observers::new();
        assert!(!observers.has_observers());
        observers.pushed(1);
    }

    #[test]
    fn events_reach_every_observer() {
        let observers = Observers::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        observers.add(a.clone());
        observers.add(b.clone());

        observers.pushed(3);
        observers.scope_reset(&Scope::CACHED);

        assert_eq!(*a.0.lock(), vec!["pushed 3".to_string()]);
        assert_eq!(*b.0.lock(), vec!["pushed 3".to_string()]);
    }
}
