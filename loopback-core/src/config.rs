//! # Loopback Configuration
//!
//! A minimal string key/value store, in the spirit of `app.set()` /
//! `app.get()`. Typed settings are derived from a [`ConfigSnapshot`] by the
//! crates that need them.
//!
//! ## Setting and reading values
//! ```rust
//! use loopback_core::ConfigStore;
//! let mut cfg = ConfigStore::new();
//!
//! cfg.set("paginate.default", "10");
//! assert_eq!(cfg.get("paginate.default"), Some("10"));
//! ```
//!
//! ## Environment overrides
//! `load_env("LOOPBACK__")` maps `LOOPBACK__API__BASE_PATH=/v2` to
//! `api.base_path = "/v2"`.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply overrides from an iterator of `(NAME, value)` pairs.
    ///
    /// `PREFIX__PAGINATE__DEFAULT` becomes `paginate.default`.
    pub fn apply_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                tracing::debug!(key = %normalized, "config override from environment");
                self.set(normalized, value);
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.apply_vars(prefix, std::env::vars());
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        self.parse_with(key, |v| v.parse::<usize>().map_err(|e| e.to_string()))
    }

    pub fn get_u32(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        self.parse_with(key, |v| v.parse::<u32>().map_err(|e| e.to_string()))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.parse_with(key, |v| v.parse::<bool>().map_err(|e| e.to_string()))
    }

    /// Durations accept a bare number of milliseconds (`"250"`) or a
    /// humantime string (`"1day"`, `"7d"`, `"150ms"`).
    pub fn get_duration(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        self.parse_with(key, |v| match v.parse::<u64>() {
            Ok(ms) => Ok(Duration::from_millis(ms)),
            Err(_) => humantime::parse_duration(v).map_err(|e| e.to_string()),
        })
    }

    fn parse_with<T, F>(&self, key: &str, parse: F) -> Result<Option<T>, ConfigError>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => parse(raw.trim())
                .map(Some)
                .map_err(|reason| ConfigError::invalid(key, reason)),
        }
    }
}
