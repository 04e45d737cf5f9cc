use std::collections::HashMap;
use std::path::Path;

use super::value::{yaml_key, ConfigValue};
use super::ConfigError;

/// Read `path` if it exists and merge its flattened keys into `values`.
///
/// A missing file is not an error: every layer is optional.
pub(crate) fn merge_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    merge_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    Ok(true)
}

pub(crate) fn merge_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Overlay environment variables: `ACCESS_CACHE_ENABLED` becomes `access.cache.enabled`.
///
/// A variable that matches an already loaded key once dots are read as
/// underscores overrides that key, so `ACCESS_CACHE_TTL_SECS` reaches
/// `access.cache.ttl_secs`.
pub(crate) fn overlay_env<I>(vars: I, values: &mut HashMap<String, ConfigValue>)
where
    I: IntoIterator<Item = (String, String)>,
{
    let known: HashMap<String, String> = values
        .keys()
        .map(|k| (k.replace('.', "_"), k.clone()))
        .collect();
    for (env_key, env_val) in vars {
        let lowered = env_key.to_lowercase();
        let config_key = match known.get(&lowered) {
            Some(existing) => existing.clone(),
            None => lowered.replace('_', "."),
        };
        values.insert(config_key, ConfigValue::String(env_val));
    }
}

/// Flatten a YAML tree into dot-separated keys.
///
/// Sequences are stored whole under their key and element-wise under
/// `key.0`, `key.1`, ... so env vars can override single elements.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = yaml_key(k);
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) if !prefix.is_empty() => {
            out.insert(
                prefix.to_string(),
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect()),
            );
            for (i, item) in seq.iter().enumerate() {
                flatten_yaml(&format!("{prefix}.{i}"), item, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}
