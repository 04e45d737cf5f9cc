use helix_authz::AuthzConfig;
use helix_core::config::{ConfigError, ConfigProperties, HelixConfig};
use helix_events::DEFAULT_MAX_CONCURRENCY;
use std::fmt;
use std::str::FromStr;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!(
                "access.log.format must be 'pretty' or 'json', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Everything under the `access` prefix.
///
/// ```yaml
/// access:
///   cache:
///     enabled: true
///     ttl_secs: 10
///   events:
///     max_concurrency: 256
///   log:
///     format: json
///     filter: "info,helix_authz=debug"
///   resources:
///     release: project
/// ```
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub authz: AuthzConfig,
    pub events_max_concurrency: usize,
    pub log: LogConfig,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            authz: AuthzConfig::default(),
            events_max_concurrency: DEFAULT_MAX_CONCURRENCY,
            log: LogConfig::default(),
        }
    }
}

impl AccessConfig {
    /// Load `application.yaml` and friends from the working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        HelixConfig::load(profile)?.section()
    }
}

impl ConfigProperties for AccessConfig {
    fn prefix() -> &'static str {
        "access"
    }

    fn from_config(config: &HelixConfig) -> Result<Self, ConfigError> {
        let defaults = LogConfig::default();
        let format: String =
            config.get_or("access.log.format", defaults.format.to_string())?;
        let events_max_concurrency =
            config.get_or("access.events.max_concurrency", DEFAULT_MAX_CONCURRENCY)?;
        if events_max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "access.events.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(Self {
            authz: AuthzConfig::from_config(config)?,
            events_max_concurrency,
            log: LogConfig {
                format: format.parse()?,
                filter: config.get_or("access.log.filter", defaults.filter)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
