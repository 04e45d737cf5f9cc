//! Configuration for the authorization directory.

use helix_core::config::{ConfigError, ConfigProperties, HelixConfig};
use helix_core::{ContextScope, ResourceScopes};

/// Settings read from the `access` section.
///
/// ```yaml
/// access:
///   cache:
///     enabled: false     # default: false
///     ttl_secs: 30       # default: 30
///   resources:           # extra resource types, name -> scope
///     release: project
/// ```
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub resources: ResourceScopes,
}

impl AuthzConfig {
    pub fn new() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_secs: 30,
            resources: ResourceScopes::new(),
        }
    }

    /// Enable or disable decision caching with the given TTL.
    pub fn with_cache(mut self, enabled: bool, ttl_secs: u64) -> Self {
        self.cache_enabled = enabled;
        self.cache_ttl_secs = ttl_secs;
        self
    }

    /// Register an extra resource type.
    pub fn with_resource(mut self, name: impl Into<String>, scope: ContextScope) -> Self {
        self.resources.insert(name, scope);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_enabled && self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "access.cache.ttl_secs must be positive when the cache is enabled".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProperties for AuthzConfig {
    fn prefix() -> &'static str {
        "access"
    }

    fn from_config(config: &HelixConfig) -> Result<Self, ConfigError> {
        let defaults = Self::new();
        let mut resources = defaults.resources;
        for (name, _) in config.children("access.resources") {
            let scope: ContextScope = config.get(&format!("access.resources.{name}"))?;
            resources.insert(name, scope);
        }
        let section = Self {
            cache_enabled: config.get_or("access.cache.enabled", defaults.cache_enabled)?,
            cache_ttl_secs: config.get_or("access.cache.ttl_secs", defaults.cache_ttl_secs)?,
            resources,
        };
        section.validate()?;
        Ok(section)
    }
}
