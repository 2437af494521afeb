//! Scope policies controlling instance caching.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::key::Key;

/// How a caching scope holds on to the instances it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retention {
    /// The cache keeps the instance alive until the scope is reset.
    Strong,
    /// The cache only observes the instance; once every caller has dropped
    /// it, the next resolution produces a fresh one.
    Weak,
}

/// Identity of one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

// Ids below this are reserved for the built-in scopes.
static NEXT_CUSTOM_SCOPE: AtomicU64 = AtomicU64::new(16);

/// Policy deciding whether and how a resolved instance is cached.
///
/// A caching scope is a cache-instance identity plus a [`Retention`]. The
/// built-in instances cover the common lifetimes; [`Scope::custom`] creates
/// further independent instances, such as a "session" cache that is reset on
/// logout without touching singletons.
///
/// | Scope              | Cache instance | Retention |
/// |--------------------|----------------|-----------|
/// | `Scope::UNIQUE`    | none           | n/a       |
/// | `Scope::SINGLETON` | singleton      | strong    |
/// | `Scope::CACHED`    | cached         | strong    |
/// | `Scope::SHARED`    | shared         | weak      |
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{Container, Retention, Scope};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// let session = Scope::custom("session", Retention::Strong);
/// let user = container.factory(|| String::from("guest")).with_scope(session);
///
/// let a = user.call();
/// let b = user.call();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// container.reset_scope(&session);
/// let c = user.call();
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    id: Option<ScopeId>,
    name: &'static str,
    retention: Retention,
}

impl Scope {
    /// Invokes the producer on every resolution. Never caches.
    pub const UNIQUE: Scope = Scope {
        id: None,
        name: "unique",
        retention: Retention::Strong,
    };

    /// One instance per registry tree, kept until explicitly reset.
    pub const SINGLETON: Scope = Scope {
        id: Some(ScopeId(1)),
        name: "singleton",
        retention: Retention::Strong,
    };

    /// The registry's default cache; reset independently of singletons.
    pub const CACHED: Scope = Scope {
        id: Some(ScopeId(2)),
        name: "cached",
        retention: Retention::Strong,
    };

    /// Hands out the same instance while anyone still holds it.
    pub const SHARED: Scope = Scope {
        id: Some(ScopeId(3)),
        name: "shared",
        retention: Retention::Weak,
    };

    /// Creates a new, independent cache instance.
    ///
    /// Every call yields a distinct scope, even for equal names; keep the
    /// returned value around and reuse it.
    pub fn custom(name: &'static str, retention: Retention) -> Self {
        let id = NEXT_CUSTOM_SCOPE.fetch_add(1, Ordering::Relaxed);
        Scope {
            id: Some(ScopeId(id)),
            name,
            retention,
        }
    }

    pub fn id(&self) -> Option<ScopeId> {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn is_unique(&self) -> bool {
        self.id.is_none()
    }

    /// Returns a cached instance or runs `producer` and records the result.
    ///
    /// Producer errors are returned untouched and nothing is cached.
    pub(crate) fn resolve<T, E, F>(&self, cache: &CacheStore, key: Key, producer: F) -> Result<Arc<T>, E>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        match self.id {
            None => producer(),
            Some(id) => cache.get_or_create(key, id, self.retention, producer),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::UNIQUE
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            None => f.write_str("Scope(unique)"),
            Some(ScopeId(id)) => write!(f, "Scope({}#{}, {:?})", self.name, id, self.retention),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scopes_are_distinct() {
        let all = [Scope::UNIQUE, Scope::SINGLETON, Scope::CACHED, Scope::SHARED];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(Scope::UNIQUE.is_unique());
        assert_eq!(Scope::SHARED.retention(), Retention::Weak);
        assert_eq!(Scope::default(), Scope::UNIQUE);
    }

    #[test]
    fn custom_scopes_get_fresh_ids() {
        let a = Scope::custom("session", Retention::Strong);
        let b = Scope::custom("session", Retention::Strong);
        assert_ne!(a, b);
        assert_eq!(a.name(), "session");
        assert!(a.id().unwrap() > Scope::SHARED.id().unwrap());
    }

    #[test]
    fn unique_scope_always_produces() {
        let cache = CacheStore::new();
        let key = crate::key::SlotTable::new().allocate("n", std::any::TypeId::of::<u8>(), "u8");
        let a: Arc<u8> = Scope::UNIQUE
            .resolve::<u8, (), _>(&cache, key, || Ok(Arc::new(1)))
            .unwrap();
        let b: Arc<u8> = Scope::UNIQUE
            .resolve::<u8, (), _>(&cache, key, || Ok(Arc::new(1)))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(Scope::SINGLETON.to_string(), "singleton");
        assert_eq!(format!("{:?}", Scope::UNIQUE), "Scope(unique)");
    }
}
