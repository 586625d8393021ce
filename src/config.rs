//! Configuration management for cachelimit.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{LimiterError, Result};

/// Prefix for environment overrides, e.g. `CACHELIMIT__CACHE__ADDRESS`.
const ENV_PREFIX: &str = "CACHELIMIT";
/// Separator between nested keys in environment overrides.
const ENV_SEPARATOR: &str = "__";
/// Address variable understood by older deployments.
const LEGACY_ADDRESS_VAR: &str = "LOCAL_CACHE_ADDRESS";

/// Main configuration for cachelimit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheLimitConfig {
    /// Counter cache connection settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Sliding window limiter settings
    #[serde(default)]
    pub limiter: LimiterConfig,
}

/// Counter cache connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// URL every cache command is POSTed to
    #[serde(default = "default_cache_address")]
    pub address: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            address: default_cache_address(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CacheConfig {
    /// Settings for the given address with default timeout.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_cache_address() -> String {
    "http://127.0.0.1:1234".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

/// What to do when setting the retention TTL on a bucket fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Fail the whole admission check
    #[default]
    Strict,
    /// Log a warning and decide anyway
    BestEffort,
}

/// Sliding window limiter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Retention TTL applied to the current bucket, in seconds
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,

    /// Failure handling for the retention TTL
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry_secs(),
            expiry_policy: ExpiryPolicy::default(),
        }
    }
}

fn default_expiry_secs() -> u64 {
    3 * 60 * 60
}

impl CacheLimitConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| LimiterError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load configuration from an optional YAML file, then environment overrides.
    ///
    /// `CACHELIMIT__<SECTION>__<FIELD>` variables win over the file. When no
    /// `CACHELIMIT__CACHE__ADDRESS` is set, `LOCAL_CACHE_ADDRESS` is honoured
    /// for the cache address.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration");
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: CacheLimitConfig = settings.try_deserialize()?;

        let explicit_address = format!("{ENV_PREFIX}{ENV_SEPARATOR}CACHE{ENV_SEPARATOR}ADDRESS");
        if std::env::var_os(explicit_address).is_none() {
            if let Ok(address) = std::env::var(LEGACY_ADDRESS_VAR) {
                loaded.cache.address = address;
            }
        }

        Ok(loaded)
    }
}
