use helix_authz::{AccessDirectory, AuthzConfig, MemoryBackend};
use helix_core::config::{ConfigError, HelixConfig};
use helix_core::ContextScope;

#[test]
fn test_defaults() {
    let config: AuthzConfig = HelixConfig::empty().section().unwrap();
    assert!(!config.cache_enabled);
    assert_eq!(config.cache_ttl_secs, 30);
    assert_eq!(config.resources.scope_of("ticket"), Some(ContextScope::Project));
}

#[test]
fn test_from_yaml() {
    let yaml = r#"
access:
  cache:
    enabled: true
    ttl_secs: 5
  resources:
    release: project
    roadmap: organization
"#;
    let config: AuthzConfig = HelixConfig::from_yaml_str(yaml, "test")
        .unwrap()
        .section()
        .unwrap();
    assert!(config.cache_enabled);
    assert_eq!(config.cache_ttl_secs, 5);
    assert_eq!(
        config.resources.scope_of("roadmap"),
        Some(ContextScope::Organization)
    );

    let directory = AccessDirectory::from_config(MemoryBackend::new(), &config);
    assert_eq!(
        directory.resources().scope_of("release"),
        Some(ContextScope::Project)
    );
}

#[test]
fn test_invalid_values() {
    let bad_scope = "access:\n  resources:\n    release: galaxy\n";
    let result = HelixConfig::from_yaml_str(bad_scope, "test")
        .unwrap()
        .section::<AuthzConfig>();
    assert!(result.is_err());

    let zero_ttl = "access:\n  cache:\n    enabled: true\n    ttl_secs: 0\n";
    let result = HelixConfig::from_yaml_str(zero_ttl, "test")
        .unwrap()
        .section::<AuthzConfig>();
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_builder() {
    let config = AuthzConfig::new()
        .with_cache(true, 10)
        .with_resource("release", ContextScope::Project);
    assert!(config.validate().is_ok());
    assert_eq!(
        config.resources.scope_of("release"),
        Some(ContextScope::Project)
    );
}
