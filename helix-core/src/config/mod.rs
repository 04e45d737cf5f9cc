mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A section was readable but its values are inconsistent.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Strongly-typed configuration section.
///
/// ```ignore
/// impl ConfigProperties for CacheConfig {
///     fn prefix() -> &'static str { "access.cache" }
///     fn from_config(config: &HelixConfig) -> Result<Self, ConfigError> {
///         Ok(Self { enabled: config.get_or("access.cache.enabled", false)? })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// Key prefix of the section (e.g. `"access"`).
    fn prefix() -> &'static str;

    fn from_config(config: &HelixConfig) -> Result<Self, ConfigError>;
}

/// Layered configuration.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. Environment variables (`ACCESS_CACHE_TTL_SECS` overrides `access.cache.ttl_secs`)
///
/// The profile is `HELIX_PROFILE` if set, otherwise the argument.
#[derive(Debug, Clone)]
pub struct HelixConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl HelixConfig {
    /// Load configuration for `profile` from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile)
    }

    /// Load configuration for `profile` from `dir`.
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("HELIX_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::merge_yaml_file(&dir.join("application.yaml"), &mut values)?;
        let profile_file = dir.join(format!("application-{active_profile}.yaml"));
        if loader::merge_yaml_file(&profile_file, &mut values)? {
            tracing::debug!(profile = %active_profile, "loaded profile configuration");
        }

        // Missing .env files are expected.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(std::env::vars(), &mut values);

        Ok(HelixConfig {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string, without any environment overlay.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::merge_yaml_str(yaml, &mut values)?;
        Ok(HelixConfig {
            values,
            profile: profile.to_string(),
        })
    }

    /// An empty config.
    pub fn empty() -> Self {
        HelixConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Typed value for a dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Typed value, or `default` if the key is missing.
    ///
    /// A present but malformed value is still an error: silently falling
    /// back would hide a misconfiguration.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Direct children of `prefix`, as `(child name, value)` pairs.
    ///
    /// `access.resources.release: project` yields `("release", "project")`
    /// for prefix `access.resources`.
    pub fn children(&self, prefix: &str) -> Vec<(String, &ConfigValue)> {
        let lead = format!("{prefix}.");
        let mut out: Vec<_> = self
            .values
            .iter()
            .filter_map(|(k, v)| {
                let rest = k.strip_prefix(&lead)?;
                (!rest.contains('.')).then(|| (rest.to_string(), v))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Build a typed section.
    pub fn section<C: ConfigProperties>(&self) -> Result<C, ConfigError> {
        C::from_config(self)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}
