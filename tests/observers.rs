use ferrous_factory::{Container, Key, RegistryConfig, RegistryObserver, ResetOptions, Scope, ScopeConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RegistryObserver for Recorder {
    fn resolving(&self, _key: Key, name: &'static str) {
        self.record(format!("resolving {}", name));
    }

    fn resolved(&self, _key: Key, name: &'static str, _duration: Duration) {
        self.record(format!("resolved {}", name));
    }

    fn registered(&self, _key: Key, name: &'static str) {
        self.record(format!("registered {}", name));
    }

    fn reset(&self, key: Option<Key>, options: ResetOptions) {
        self.record(format!("reset {} {:?}", key.is_some(), options));
    }

    fn scope_reset(&self, scope: &Scope) {
        self.record(format!("scope_reset {}", scope));
    }

    fn pushed(&self, depth: usize) {
        self.record(format!("pushed {}", depth));
    }

    fn popped(&self, depth: usize) {
        self.record(format!("popped {}", depth));
    }
}

#[test]
fn test_observer_sees_lifecycle_events() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.registry().add_observer(recorder.clone());

    let port = container.named_factory("port", || 80u16).with_scope(Scope::CACHED);
    port.call();
    container.push();
    port.register(|| 8080);
    port.reset_with(ResetOptions::Registration);
    container.reset_scope(&Scope::CACHED);
    container.pop();

    assert_eq!(
        recorder.events(),
        vec![
            "resolving port",
            "resolved port",
            "pushed 1",
            "registered port",
            "reset true Registration",
            "scope_reset cached",
            "popped 0",
        ]
    );
}

#[test]
fn test_failed_resolution_is_not_reported_as_resolved() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.registry().add_observer(recorder.clone());

    let broken = container.try_factory(|| "x".parse::<u8>());
    assert!(broken.try_call().is_err());

    assert_eq!(recorder.events(), vec!["resolving u8"]);
}

#[test]
fn test_observers_are_per_registry() {
    let recorder = Arc::new(Recorder::default());
    let root = Container::new();
    root.registry().add_observer(recorder.clone());

    root.derive().factory(|| 1u8).call();
    root.isolated().factory(|| 1u8).call();

    assert_eq!(recorder.events().len(), 2);
}

#[test]
fn test_tracing_observer_from_config() {
    let container = Container::with_config(
        RegistryConfig::new()
            .default_scope(ScopeConfig::Singleton)
            .trace(true),
    );
    let value = container.factory(|| 3u8);
    assert_eq!(value.scope(), Scope::SINGLETON);
    assert!(Arc::ptr_eq(&value.call(), &value.call()));
}
