//! Configuration file discovery and loading.
//!
//! The discovery order is:
//! 1. `MURMUR_CONFIG` environment variable (path).
//! 2. `~/.murmur/config.json`
//! 3. If none found, an empty JSON object (`{}`), i.e. all defaults.
//!
//! JSON keys are normalized from camelCase to snake_case before returning.

use std::path::{Path, PathBuf};

use serde_json::Value;

use murmur_types::config::Config;
use murmur_types::{MurmurError, Result};

use super::env::Environment;
use super::fs::FileSystem;

/// Environment variable that overrides config discovery.
pub const CONFIG_ENV_VAR: &str = "MURMUR_CONFIG";

/// Discover the config file path using the fallback chain.
///
/// The env var path is returned as-is, even if it does not exist; the
/// loader reports that case and falls back to defaults.
pub fn discover_config_path(env: &dyn Environment, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(env_path) = env.get_var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(env_path));
    }

    let home = home_dir?;
    let path = home.join(".murmur").join("config.json");
    path.exists().then_some(path)
}

/// Load raw JSON configuration using the discovery algorithm.
///
/// If no config file is found, returns an empty JSON object.
pub async fn load_config_raw(fs: &dyn FileSystem, env: &dyn Environment) -> Result<Value> {
    let path = discover_config_path(env, fs.home_dir());

    let Some(path) = path else {
        tracing::info!("no config file found, using defaults");
        return Ok(Value::Object(serde_json::Map::new()));
    };

    if !fs.exists(&path).await {
        tracing::warn!(
            path = %path.display(),
            "config path does not exist, using defaults"
        );
        return Ok(Value::Object(serde_json::Map::new()));
    }

    read_config_raw(fs, &path).await
}

/// Read and normalize one config file.
pub async fn read_config_raw(fs: &dyn FileSystem, path: &Path) -> Result<Value> {
    tracing::debug!(path = %path.display(), "loading config file");
    let contents = fs.read_to_string(path).await?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| MurmurError::ConfigInvalid {
        reason: format!("failed to parse {}: {e}", path.display()),
    })?;
    Ok(normalize_keys(value))
}

/// Deserialize and validate a normalized config value.
pub fn parse_config(raw: Value) -> Result<Config> {
    let config: Config = serde_json::from_value(raw)?;
    config.validate()?;
    Ok(config)
}

/// Convert camelCase JSON keys to snake_case recursively.
///
/// Objects and arrays are processed recursively; other values are returned
/// unchanged.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut new_map = serde_json::Map::new();
            for (key, val) in map {
                new_map.insert(camel_to_snake(&key), normalize_keys(val));
            }
            Value::Object(new_map)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert a single camelCase string to snake_case.
///
/// A run of uppercase letters (an acronym) is kept together, with an
/// underscore inserted before its last letter only when a lowercase letter
/// follows.
///
/// # Examples
/// ```
/// # use murmur_platform::config_loader::camel_to_snake;
/// assert_eq!(camel_to_snake("pairingFile"), "pairing_file");
/// assert_eq!(camel_to_snake("already_snake"), "already_snake");
/// assert_eq!(camel_to_snake("HTTPPort"), "http_port");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            if prev.is_lowercase()
                || (prev.is_uppercase() && next.is_some_and(|c| c.is_lowercase()))
            {
                result.push('_');
            }
        }
        result.push(ch.to_ascii_lowercase());
    }
    result
}
