use ferrous_factory::{CircularDependency, Container, Factory};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

#[test]
fn test_self_dependency_is_detected() {
    let container = Container::new();
    let slot: Arc<OnceLock<Factory<u32>>> = Arc::new(OnceLock::new());
    let inner = slot.clone();

    let looping = container.named_factory("looping", move || {
        let me = inner.get().unwrap();
        *me.call() + 1
    });
    slot.set(looping.clone()).unwrap();

    let payload = panic::catch_unwind(AssertUnwindSafe(|| looping.call())).unwrap_err();
    let circular = payload.downcast_ref::<CircularDependency>().unwrap();
    assert_eq!(&*circular.path, &["looping", "looping"]);
}

#[test]
fn test_indirect_cycle_reports_full_path() {
    let container = Container::new();
    let a_slot: Arc<OnceLock<Factory<u32>>> = Arc::new(OnceLock::new());

    let a_ref = a_slot.clone();
    let b = container.named_factory("b", move || *a_ref.get().unwrap().call());
    let b_ref = b.clone();
    let a = container.named_factory("a", move || *b_ref.call());
    a_slot.set(a.clone()).unwrap();

    let payload = panic::catch_unwind(AssertUnwindSafe(|| a.call())).unwrap_err();
    let circular = payload.downcast_ref::<CircularDependency>().unwrap();
    assert_eq!(&*circular.path, &["a", "b", "a"]);
    assert_eq!(circular.to_string(), "circular dependency: a -> b -> a");

    // Breaking the cycle with an override makes everything resolvable again
    b.register(|| 9);
    assert_eq!(*a.call(), 9);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let container = Container::new();
    let base = container.factory(|| 1u32);
    let (l, r) = (base.clone(), base.clone());
    let left = container.factory(move || *l.call() + 1);
    let right = container.factory(move || *r.call() + 2);
    let top = container.factory(move || *left.call() + *right.call());
    assert_eq!(*top.call(), 5);
}
