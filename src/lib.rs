//! # ferrous-factory
//!
//! Compile-time safe factory registry with scoped caching and test-friendly overrides.
//!
//! ## Features
//!
//! - **No missing registrations**: a [`Factory`] cannot exist without a default producer
//! - **Scopes**: unique, singleton, cached, shared (weak) and custom cache instances
//! - **Overrides**: swap any producer at runtime, e.g. for mocks, and reset it again
//! - **Snapshots**: `push`/`pop` the whole registry state around a test
//! - **Thread-safe**: coarse locks that are never held while a producer runs
//! - **Circular dependency detection**: re-entrant resolution panics with the slot path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_factory::{Container, Scope};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! let database = container
//!     .factory(|| Database { connection_string: "postgres://localhost".into() })
//!     .with_scope(Scope::SINGLETON);
//!
//! let db = database.clone();
//! let users = container.factory(move || UserService { db: db.call() });
//!
//! let service = users.call();
//! assert_eq!(service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scopes
//!
//! - **Unique** (default): a fresh instance on every call
//! - **Singleton**: one instance for the registry tree until reset
//! - **Cached**: like singleton, but reset independently
//! - **Shared**: the same instance while any caller still holds it
//! - **Custom**: [`Scope::custom`] creates further cache instances, e.g. a session
//!
//! ## Overrides in tests
//!
//! ```rust
//! use ferrous_factory::{Container, Scope};
//!
//! let container = Container::new();
//! let counter = container.factory(|| 0i32).with_scope(Scope::CACHED);
//! assert_eq!(*counter.call(), 0);
//!
//! container.push();
//! counter.register(|| 10);
//! assert_eq!(*counter.call(), 10);
//! container.pop();
//!
//! assert_eq!(*counter.call(), 0);
//! ```

// Module declarations
pub mod config;
pub mod container;
pub mod error;
pub mod factory;
pub mod key;
pub mod observer;
pub mod registry;
pub mod scope;

// Internal modules
mod cache;
mod internal;
mod registration;
mod snapshot;

// Re-export core types
pub use config::{RegistryConfig, ScopeConfig};
pub use container::Container;
pub use error::{RegistryError, RegistryResult};
pub use factory::{Decorator, Factory, ParameterFactory};
pub use internal::CircularDependency;
pub use key::Key;
pub use observer::{RegistryObserver, TracingObserver};
pub use registration::{ParameterProducer, Producer};
pub use registry::{Registry, ResetOptions};
pub use scope::{Retention, Scope, ScopeId};
