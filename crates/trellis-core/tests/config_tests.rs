use std::time::Duration;

use tempfile::TempDir;
use trellis_core::config::{
    DEFAULT_DB_PATH, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PATH_LENGTH, DEFAULT_VISUALIZER_URL,
};
use trellis_core::query::QueryContext;
use trellis_core::{Config, ConfigError};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.backend.path, DEFAULT_DB_PATH);
    assert_eq!(config.query.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    assert_eq!(config.query.max_path_length, DEFAULT_MAX_PATH_LENGTH);
    assert_eq!(config.visualizer.base_url, DEFAULT_VISUALIZER_URL);
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[backend]
kind = "memory"

[query]
max_concurrency = 2
secondary_hop = false
timeout_ms = 1500
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.backend.kind, "memory");
    assert_eq!(config.query.max_concurrency, 2);
    assert!(!config.query.secondary_hop);
    assert_eq!(config.query.timeout(), Some(Duration::from_millis(1500)));
    // Unset sections keep their defaults.
    assert_eq!(config.query.max_path_length, DEFAULT_MAX_PATH_LENGTH);
    assert_eq!(config.visualizer.base_url, DEFAULT_VISUALIZER_URL);
}

#[test]
fn test_config_from_file_validates() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("trellis.toml");

    std::fs::write(&path, "[query]\nmax_concurrency = 0\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "[query\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::ParseError(_))));

    let missing = temp.path().join("missing.toml");
    assert!(matches!(Config::from_file(&missing), Err(ConfigError::ReadError(_))));
}

#[test]
fn test_default_config_string_round_trips() {
    let rendered = Config::default_config_string();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.backend.kind, Config::default().backend.kind);
    assert_eq!(parsed.query.max_concurrency, DEFAULT_MAX_CONCURRENCY);
}

#[test]
fn test_env_overrides() {
    std::env::set_var("TRELLIS_VISUALIZER_URL", "https://viz.example.com");
    std::env::set_var("TRELLIS_MAX_PATH_LENGTH", "not-a-number");
    let mut config = Config::default();
    config.apply_env_overrides();
    std::env::remove_var("TRELLIS_VISUALIZER_URL");
    std::env::remove_var("TRELLIS_MAX_PATH_LENGTH");

    assert_eq!(config.visualizer.base_url, "https://viz.example.com");
    // Unparseable values are ignored.
    assert_eq!(config.query.max_path_length, DEFAULT_MAX_PATH_LENGTH);
}

#[test]
fn test_query_context_from_config() {
    let mut config = Config::default();
    config.query.max_concurrency = 3;
    let ctx = QueryContext::from_config(&config.query);
    assert_eq!(ctx.max_concurrency(), 3);
    assert!(ctx.check().is_ok());
}
