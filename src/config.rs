//! Registry configuration.
//!
//! Configuration is small on purpose: which scope factories get when their
//! declaration does not name one, and whether registry events are traced.
//! With the `config` feature it can be loaded from JSON.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::{RegistryError, RegistryResult};
use crate::scope::Scope;

/// Built-in scope names usable from configuration.
///
/// Custom scopes are runtime values and cannot be named here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum ScopeConfig {
    #[default]
    Unique,
    Singleton,
    Cached,
    Shared,
}

impl ScopeConfig {
    pub fn scope(self) -> Scope {
        match self {
            ScopeConfig::Unique => Scope::UNIQUE,
            ScopeConfig::Singleton => Scope::SINGLETON,
            ScopeConfig::Cached => Scope::CACHED,
            ScopeConfig::Shared => Scope::SHARED,
        }
    }
}

/// Settings for a [`Registry`](crate::Registry) and every container built on it.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, RegistryConfig, Scope, ScopeConfig};
/// use std::sync::Arc;
///
/// let config = RegistryConfig::new().default_scope(ScopeConfig::Singleton);
/// let container = Container::with_config(config);
///
/// let clock = container.factory(|| 0u64);
/// assert_eq!(clock.scope(), Scope::SINGLETON);
/// assert!(Arc::ptr_eq(&clock.call(), &clock.call()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RegistryConfig {
    /// Scope used by declarations that do not choose one.
    pub default_scope: ScopeConfig,
    /// Attach a [`TracingObserver`](crate::TracingObserver) on creation.
    pub trace: bool,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_scope(mut self, scope: ScopeConfig) -> Self {
        self.default_scope = scope;
        self
    }

    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    ///
    /// ```
    /// use ferrous_factory::{RegistryConfig, ScopeConfig};
    ///
    /// let config = RegistryConfig::from_json(r#"{ "default_scope": "cached" }"#).unwrap();
    /// assert_eq!(config.default_scope, ScopeConfig::Cached);
    /// assert!(!config.trace);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::InvalidConfig(e.to_string()))
    }

    #[cfg(feature = "config")]
    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string(self).map_err(|e| RegistryError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_unique_without_tracing() {
        let config = RegistryConfig::default();
        assert_eq!(config.default_scope.scope(), Scope::UNIQUE);
        assert!(!config.trace);
    }

    #[test]
    fn builder_sets_fields() {
        let config = RegistryConfig::new()
            .default_scope(ScopeConfig::Shared)
            .trace(true);
        assert_eq!(config.default_scope.scope(), Scope::SHARED);
        assert!(config.trace);
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_round_trip_and_errors() {
        let config = RegistryConfig::new().default_scope(ScopeConfig::Singleton).trace(true);
        let json = config.to_json().unwrap();
        assert_eq!(RegistryConfig::from_json(&json).unwrap(), config);

        let err = RegistryConfig::from_json(r#"{ "default_scope": "forever" }"#).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig(_)));
    }
}
