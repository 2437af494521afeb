#![cfg(feature = "config")]

use ferrous_factory::{Container, RegistryConfig, RegistryError, Scope, ScopeConfig};

#[test]
fn test_config_from_json() {
    let config = RegistryConfig::from_json(r#"{ "default_scope": "cached", "trace": false }"#).unwrap();
    assert_eq!(config.default_scope, ScopeConfig::Cached);

    let container = Container::with_config(config);
    assert_eq!(container.factory(|| 0u8).scope(), Scope::CACHED);
}

#[test]
fn test_missing_fields_use_defaults() {
    let config = RegistryConfig::from_json("{}").unwrap();
    assert_eq!(config, RegistryConfig::default());
    assert_eq!(config.default_scope.scope(), Scope::UNIQUE);
}

#[test]
fn test_config_json_round_trip() {
    let config = RegistryConfig::new().default_scope(ScopeConfig::Shared).trace(true);
    let json = config.to_json().unwrap();
    assert!(json.contains("\"shared\""));
    assert_eq!(RegistryConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_invalid_config_is_reported() {
    let err = RegistryConfig::from_json(r#"{ "default_scope": "forever" }"#).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidConfig(_)));
}
