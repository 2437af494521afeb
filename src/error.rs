//! Error types for the factory registry.

use thiserror::Error;

/// Registry errors
///
/// These are developer-facing conditions: a mismatched `push`/`pop` pair in
/// test setup, or two declarations fighting over one named slot. Failures of
/// a service's own construction never show up here; they travel through
/// [`Factory::try_call`](crate::Factory::try_call) as the producer's own
/// error type.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{Container, RegistryError};
///
/// let container = Container::new();
/// match container.try_pop() {
///     Err(RegistryError::UnbalancedPop) => {}
///     other => panic!("unexpected: {:?}", other),
/// }
///
/// let err = RegistryError::KeyCollision {
///     name: "database",
///     existing: "u32",
///     requested: "alloc::string::String",
/// };
/// assert!(err.to_string().contains("database"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `pop` was called with no matching `push`
    #[error("registry pop without a matching push")]
    UnbalancedPop,
    /// A named slot was declared again with a different value type
    #[error("slot `{name}` is declared as {existing}, cannot redeclare as {requested}")]
    KeyCollision {
        name: &'static str,
        existing: &'static str,
        requested: &'static str,
    },
    /// Configuration could not be parsed or is inconsistent
    #[error("invalid registry configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
