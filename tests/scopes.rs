use ferrous_factory::{Container, Retention, Scope};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting(container: &Container, scope: Scope) -> (ferrous_factory::Factory<usize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let factory = container
        .factory(move || counter.fetch_add(1, Ordering::SeqCst))
        .with_scope(scope);
    (factory, calls)
}

#[test]
fn test_unique_invokes_producer_every_time() {
    let container = Container::new();
    let (factory, calls) = counting(&container, Scope::UNIQUE);

    let instances: Vec<_> = (0..5).map(|_| factory.call()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    for (i, a) in instances.iter().enumerate() {
        for b in &instances[i + 1..] {
            assert!(!Arc::ptr_eq(a, b));
        }
    }
    assert_eq!(container.registry().cached_count(&Scope::UNIQUE), 0);
}

#[test]
fn test_singleton_identity_and_reset() {
    let container = Container::new();
    let (factory, calls) = counting(&container, Scope::SINGLETON);

    let first = factory.call();
    let second = factory.call();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    container.reset_scope(&Scope::SINGLETON);
    let third = factory.call();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(!Arc::ptr_eq(&second, &third));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cached_reset_leaves_singletons_alone() {
    let container = Container::new();
    let (singleton, _) = counting(&container, Scope::SINGLETON);
    let (cached, _) = counting(&container, Scope::CACHED);

    let s1 = singleton.call();
    let c1 = cached.call();

    container.reset_scope(&Scope::CACHED);

    assert!(Arc::ptr_eq(&s1, &singleton.call()));
    assert!(!Arc::ptr_eq(&c1, &cached.call()));
}

#[test]
fn test_custom_scope_is_independent() {
    let session = Scope::custom("session", Retention::Strong);
    let container = Container::new();
    let (user, calls) = counting(&container, session);
    let (settings, _) = counting(&container, Scope::CACHED);

    let u1 = user.call();
    let s1 = settings.call();
    assert!(Arc::ptr_eq(&u1, &user.call()));
    assert_eq!(container.registry().cached_count(&session), 1);

    container.reset_scope(&session);
    assert_eq!(container.registry().cached_count(&session), 0);
    assert!(!Arc::ptr_eq(&u1, &user.call()));
    assert!(Arc::ptr_eq(&s1, &settings.call()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shared_scope_releases_dropped_instances() {
    let container = Container::new();
    let (factory, calls) = counting(&container, Scope::SHARED);

    let first = factory.call();
    let again = factory.call();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    drop(first);
    drop(again);

    let fresh = factory.call();
    assert_eq!(*fresh, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shared_scope_keeps_nothing_alive() {
    struct Resource;
    let container = Container::new();
    let factory = container.factory(|| Resource).with_scope(Scope::SHARED);

    let held = factory.call();
    let weak = Arc::downgrade(&held);
    drop(held);
    assert!(weak.upgrade().is_none());
    assert_eq!(container.registry().cached_count(&Scope::SHARED), 0);
}

#[test]
fn test_custom_weak_scope() {
    let per_request = Scope::custom("request", Retention::Weak);
    let container = Container::new();
    let (factory, calls) = counting(&container, per_request);

    let held = factory.call();
    assert!(Arc::ptr_eq(&held, &factory.call()));
    drop(held);
    factory.call();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_resetting_unique_scope_is_a_no_op() {
    let container = Container::new();
    let (singleton, _) = counting(&container, Scope::SINGLETON);
    let s1 = singleton.call();
    container.reset_scope(&Scope::UNIQUE);
    assert!(Arc::ptr_eq(&s1, &singleton.call()));
}
