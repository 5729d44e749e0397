//! Configuration management for Trellis.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `trellis.toml` file
//! 3. User config `~/.config/trellis/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend configuration.
    pub backend: BackendConfig,

    /// Query execution configuration.
    pub query: QueryConfig,

    /// Visualizer link configuration.
    pub visualizer: VisualizerConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./trellis.toml` (project local)
    /// 2. `~/.config/trellis/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(kind) = std::env::var("TRELLIS_BACKEND") {
            self.backend.kind = kind;
        }
        if let Ok(path) = std::env::var("TRELLIS_DB_PATH") {
            self.backend.path = path;
        }

        if let Ok(n) = std::env::var("TRELLIS_MAX_CONCURRENCY") {
            if let Ok(n) = n.parse() {
                self.query.max_concurrency = n;
            }
        }
        if let Ok(n) = std::env::var("TRELLIS_MAX_PATH_LENGTH") {
            if let Ok(n) = n.parse() {
                self.query.max_path_length = n;
            }
        }
        if let Ok(flag) = std::env::var("TRELLIS_SECONDARY_HOP") {
            if let Ok(flag) = flag.parse() {
                self.query.secondary_hop = flag;
            }
        }
        if let Ok(ms) = std::env::var("TRELLIS_QUERY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                self.query.timeout_ms = ms;
            }
        }

        if let Ok(url) = std::env::var("TRELLIS_VISUALIZER_URL") {
            self.visualizer.base_url = url;
        }
    }

    /// Reject values the query layer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend.kind.as_str() {
            "memory" | "surreal" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown backend '{}', expected 'memory' or 'surreal'",
                    other
                )))
            }
        }
        if self.query.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "query.max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend name: "memory" or "surreal".
    pub kind: String,

    /// Path to the SurrealDB RocksDB directory.
    pub path: String,

    /// SurrealDB namespace.
    pub namespace: String,

    /// SurrealDB database.
    pub database: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: DEFAULT_BACKEND.to_string(),
            path: DEFAULT_DB_PATH.to_string(),
            namespace: DEFAULT_DB_NAMESPACE.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
        }
    }
}

impl BackendConfig {
    /// Get the database path as a `PathBuf`.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

/// Query execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Upper bound on concurrent backend calls during a fan-out.
    pub max_concurrency: usize,

    /// Upper bound on hops for route search.
    pub max_path_length: usize,

    /// Whether the neighbor resolver follows occurrences to artifacts.
    pub secondary_hop: bool,

    /// Request deadline in milliseconds; 0 means none.
    pub timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            secondary_hop: DEFAULT_SECONDARY_HOP,
            timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }
}

impl QueryConfig {
    /// The request deadline as a duration, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Visualizer link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Base URL; the path is appended as `?path=a,b,c`.
    pub base_url: String,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VISUALIZER_URL.to_string(),
        }
    }
}

impl VisualizerConfig {
    /// Build the visualizer link for an ordered id path.
    pub fn url_for<S: AsRef<str>>(&self, path: &[S]) -> String {
        let ids: Vec<&str> = path.iter().map(|s| s.as_ref()).collect();
        format!("{}/?path={}", self.base_url.trim_end_matches('/'), ids.join(","))
    }
}
