//! Typed simulator configuration, read from a [`ConfigSnapshot`].
//!
//! | key                 | default          |
//! |---------------------|------------------|
//! | `api.base_path`     | `/api/v1`        |
//! | `routes.strict`     | `false`          |
//! | `latency.min`       | `200ms`          |
//! | `latency.max`       | `500ms`          |
//! | `storage.key`       | `loopback-store` |
//! | `storage.dir`       | unset (memory)   |
//! | `paginate.default`  | `10`             |
//! | `paginate.max`      | `100`            |
//! | `auth.*`            | see `TokenOptions` |

use std::path::PathBuf;
use std::time::Duration;

use loopback_auth::TokenOptions;
use loopback_core::{ConfigError, ConfigSnapshot, ConfigStore};
use loopback_store::DEFAULT_STORAGE_KEY;

/// Environment variables with this prefix override config keys:
/// `LOOPBACK__API__BASE_PATH` sets `api.base_path`.
pub const ENV_PREFIX: &str = "LOOPBACK__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub base_path: String,
    /// Unmatched routes answer 404 instead of the permissive default.
    pub strict_routes: bool,
    pub latency_min: Duration,
    pub latency_max: Duration,
    pub storage_key: String,
    /// Directory for file-backed storage; `None` keeps the store in memory.
    pub storage_dir: Option<PathBuf>,
    pub paginate_default: usize,
    pub paginate_max: usize,
    pub tokens: TokenOptions,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_path: "/api/v1".to_string(),
            strict_routes: false,
            latency_min: Duration::from_millis(200),
            latency_max: Duration::from_millis(500),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            paginate_default: 10,
            paginate_max: 100,
            tokens: TokenOptions::default(),
        }
    }
}

impl SimConfig {
    pub fn from_snapshot(cfg: &ConfigSnapshot) -> Result<Self, ConfigError> {
        let mut out = Self::default();
        if let Some(base) = cfg.get_string("api.base_path") {
            out.base_path = normalize_base(&base);
        }
        if let Some(strict) = cfg.get_bool("routes.strict")? {
            out.strict_routes = strict;
        }
        if let Some(min) = cfg.get_duration("latency.min")? {
            out.latency_min = min;
        }
        if let Some(max) = cfg.get_duration("latency.max")? {
            out.latency_max = max;
        }
        if out.latency_max < out.latency_min {
            return Err(ConfigError::invalid(
                "latency.max",
                format!(
                    "{} is below latency.min ({})",
                    humantime::format_duration(out.latency_max),
                    humantime::format_duration(out.latency_min)
                ),
            ));
        }
        if let Some(key) = cfg.get_string("storage.key") {
            out.storage_key = key;
        }
        if let Some(dir) = cfg.get_string("storage.dir") {
            out.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(n) = cfg.get_usize("paginate.default")? {
            out.paginate_default = n.max(1);
        }
        if let Some(n) = cfg.get_usize("paginate.max")? {
            out.paginate_max = n.max(1);
        }
        out.tokens = TokenOptions::from_config(cfg)?;
        Ok(out)
    }

    /// Defaults overlaid with `LOOPBACK__*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut store = ConfigStore::new();
        store.load_env(ENV_PREFIX);
        Self::from_snapshot(&store.snapshot())
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.latency_min = min;
        self.latency_max = max.max(min);
        self
    }

    pub fn without_latency(self) -> Self {
        self.with_latency(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_routes = true;
        self
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keys_override_defaults() {
        let cfg = ConfigStore::new()
            .with("api.base_path", "api/v2/")
            .with("routes.strict", "true")
            .with("latency.min", "0")
            .with("latency.max", "50ms")
            .with("storage.dir", "/tmp/loopback")
            .with("paginate.default", "25")
            .with("auth.access_ttl", "1h")
            .snapshot();
        let sim = SimConfig::from_snapshot(&cfg).unwrap();
        assert_eq!(sim.base_path, "/api/v2");
        assert!(sim.strict_routes);
        assert_eq!(sim.latency_max, Duration::from_millis(50));
        assert_eq!(sim.storage_dir, Some(PathBuf::from("/tmp/loopback")));
        assert_eq!(sim.paginate_default, 25);
        assert_eq!(sim.tokens.access_token_expires_in, Duration::from_secs(3600));
    }

    #[test]
    fn inverted_latency_window_is_rejected() {
        let cfg = ConfigStore::new()
            .with("latency.min", "2s")
            .with("latency.max", "1s")
            .snapshot();
        let err = SimConfig::from_snapshot(&cfg).unwrap_err();
        assert!(err.to_string().contains("latency.max"));
    }

    #[test]
    fn env_prefix_maps_to_dotted_keys() {
        let mut store = ConfigStore::new();
        store.apply_vars(
            ENV_PREFIX,
            vec![("LOOPBACK__API__BASE_PATH".to_string(), "/mock".to_string())],
        );
        let sim = SimConfig::from_snapshot(&store.snapshot()).unwrap();
        assert_eq!(sim.base_path, "/mock");
    }
}
