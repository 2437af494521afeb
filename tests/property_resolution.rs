/// Property-based tests for resolution
///
/// These tests verify that resolution follows the scope and override rules
/// regardless of the values and operation sequences involved.

use ferrous_factory::{Container, Scope};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn singleton_resolution_consistency(value in "\\PC{0,50}") {
        let container = Container::new();
        let expected = value.clone();
        let factory = container.factory(move || expected.clone()).with_scope(Scope::SINGLETON);

        let resolved1 = factory.call();
        let resolved2 = factory.call();
        prop_assert!(Arc::ptr_eq(&resolved1, &resolved2));
        prop_assert_eq!(&*resolved1, &value);
    }
}

proptest! {
    #[test]
    fn override_always_wins_until_reset(default in any::<i64>(), overrides in prop::collection::vec(any::<i64>(), 1..8)) {
        let container = Container::new();
        let factory = container.factory(move || default).with_scope(Scope::CACHED);
        prop_assert_eq!(*factory.call(), default);

        for value in &overrides {
            let value = *value;
            factory.register(move || value);
            prop_assert_eq!(*factory.call(), value);
        }

        factory.reset();
        prop_assert_eq!(*factory.call(), default);
    }
}

proptest! {
    #[test]
    fn pop_restores_pre_push_behavior(before in any::<u16>(), inside in any::<u16>(), depth in 1usize..5) {
        let container = Container::new();
        let factory = container.factory(|| 0u16).with_scope(Scope::SINGLETON);
        factory.register(move || before);
        let cached = factory.call();

        for _ in 0..depth {
            container.push();
            factory.register(move || inside);
            prop_assert_eq!(*factory.call(), inside);
        }
        for _ in 0..depth {
            container.pop();
        }

        let restored = factory.call();
        prop_assert_eq!(*restored, before);
        prop_assert!(Arc::ptr_eq(&cached, &restored));
    }
}
