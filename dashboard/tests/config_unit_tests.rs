//! Tests for loading `main.toml` through the config manager.

use dashboard::errors::ConfigError;
use dashboard::ConfigManager;
use std::fs;
use tempfile::TempDir;
use test_case::test_case;

fn write_main_toml(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.toml"), contents).unwrap();
    dir
}

fn dir_arg(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

#[tokio::test]
async fn test_loads_full_config() {
    let dir = write_main_toml(
        r#"
api_base_url = "https://traffic.example.com"
token_path = "/var/lib/dashboard/token"
request_timeout_seconds = 30
max_retries = 4
retry_backoff_millis = 250
default_window_days = 30
preload_concurrency = 8
preload_on_start = false
"#,
    );

    let manager = ConfigManager::new(dir_arg(&dir)).await.unwrap();
    let config = manager.get_current_config();

    assert_eq!(config.api_base_url, "https://traffic.example.com");
    assert_eq!(config.token_path, "/var/lib/dashboard/token");
    assert_eq!(config.request_timeout_seconds, 30);
    assert_eq!(config.max_retries, 4);
    assert_eq!(config.retry_backoff_millis, 250);
    assert_eq!(config.default_window_days, 30);
    assert_eq!(config.preload_concurrency, 8);
    assert!(!config.preload_on_start);
}

#[tokio::test]
async fn test_missing_main_toml_fails() {
    let dir = TempDir::new().unwrap();

    let err = ConfigManager::new(dir_arg(&dir)).await.err().unwrap();

    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::LoadFailed { path, .. }) => assert!(path.ends_with("main.toml")),
        other => panic!("expected LoadFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_toml_fails() {
    let dir = write_main_toml("api_base_url = ");

    let err = ConfigManager::new(dir_arg(&dir)).await.err().unwrap();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ParseError { .. })
    ));
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test_case(r#"api_base_url = """#, "api_base_url" ; "empty base url")]
#[test_case(r#"api_base_url = "ftp://traffic.example.com""#, "api_base_url" ; "non http base url")]
#[test_case("api_base_url = \"http://localhost\"\ndefault_window_days = 0", "default_window_days" ; "zero window")]
#[test_case("api_base_url = \"http://localhost\"\npreload_concurrency = 0", "preload_concurrency" ; "zero concurrency")]
#[tokio::test]
async fn test_invalid_values_are_rejected(contents: &str, field: &str) {
    let dir = write_main_toml(contents);

    let err = ConfigManager::new(dir_arg(&dir)).await.err().unwrap();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { .. })
    ));
    assert!(
        err.to_string().contains(field),
        "error '{}' does not name {}",
        err,
        field
    );
}
