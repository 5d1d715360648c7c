use super::*;
use serial_test::serial;
use std::collections::HashMap;
use tempfile::TempDir;

fn lookup(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let values: HashMap<String, String> = values
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| values.get(key).cloned()
}

#[test]
fn test_app_config_default() {
    let config = AppConfig::default();

    assert_eq!(config.backend.base_url, "http://localhost:8080/api");
    assert_eq!(config.backend.timeout_secs, 10);
    assert_eq!(config.authentication.username, "admin");
    assert!(config.authentication.password.is_none());
}

#[test]
fn test_app_config_load_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("invalid_config.toml");
    fs::write(&config_path, "invalid = toml = syntax").expect("Failed to write invalid TOML");

    let result = AppConfig::load(&config_path);

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Failed to parse configuration file"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_app_config_load_nonexistent_file() {
    let result = AppConfig::load(&PathBuf::from("nonexistent_dashboard.toml"));

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Configuration file not found"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_app_config_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("partial.toml");
    fs::write(&config_path, "[backend]\nbase_url = \"https://hooks.internal/api\"\n")
        .expect("Failed to write config");

    let config = AppConfig::load(&config_path).expect("Failed to load config");

    assert_eq!(config.backend.base_url, "https://hooks.internal/api");
    assert_eq!(config.backend.timeout_secs, 10);
    assert_eq!(config.authentication.username, "admin");
}

#[test]
fn test_app_config_save_and_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("dashboard.toml");

    let mut original = AppConfig::default();
    original.backend.timeout_secs = 0;
    original.authentication.username = "ops".to_string();
    original.save(&config_path).expect("Failed to save config");

    let loaded = AppConfig::load(&config_path).expect("Failed to load config");

    assert_eq!(loaded.backend.timeout_secs, 0);
    assert!(loaded.backend.timeout().is_none());
    assert_eq!(loaded.authentication.username, "ops");
    assert!(loaded.authentication.password.is_none());
}

#[test]
fn test_env_overrides_replace_file_values() {
    let mut config = AppConfig::default();

    config.apply_env_overrides(lookup(&[
        (ENV_BASE_URL, "https://hooks.example.com/api"),
        (ENV_USERNAME, "operator"),
        (ENV_PASSWORD, "s3cret"),
    ]));

    assert_eq!(config.backend.base_url, "https://hooks.example.com/api");
    assert_eq!(config.authentication.username, "operator");
    assert_eq!(config.authentication.password.as_deref(), Some("s3cret"));
}

#[test]
fn test_blank_env_values_are_ignored() {
    let mut config = AppConfig::default();

    config.apply_env_overrides(lookup(&[(ENV_USERNAME, "  ")]));

    assert_eq!(config.authentication.username, "admin");
}

#[test]
fn test_client_config_requires_password() {
    let config = AppConfig::default();

    assert!(matches!(config.client_config(), Err(Error::Config(_))));
}

#[test]
fn test_client_config_rejects_bad_base_url() {
    let mut config = AppConfig::default();
    config.authentication.password = Some("pw".to_string());
    config.backend.base_url = "ftp://example.com".to_string();

    assert!(matches!(
        config.client_config(),
        Err(Error::Api(webhook_client::Error::Validation(_)))
    ));
}

#[test]
fn test_client_config_carries_timeout_and_credentials() {
    let mut config = AppConfig::default();
    config.authentication.password = Some("pw".to_string());
    config.backend.timeout_secs = 3;

    let client_config = config.client_config().expect("Failed to build client config");

    assert_eq!(client_config.timeout, Some(Duration::from_secs(3)));
    assert_eq!(client_config.credentials.username(), "admin");
    assert_eq!(client_config.base_url.as_str(), "http://localhost:8080/api");
}

#[test]
fn test_password_never_printed() {
    let mut config = AppConfig::default();
    config.authentication.password = Some("hunter2".to_string());

    let debug_output = format!("{:?}", config);
    let shown = toml::to_string_pretty(&config.redacted()).expect("Failed to serialize");

    assert!(!debug_output.contains("hunter2"));
    assert!(!shown.contains("hunter2"));
    assert!(shown.contains(REDACTED));
}

#[test]
fn test_get_config_path_default() {
    let path = get_config_path(None);
    assert!(path.ends_with(DEFAULT_CONFIG_FILENAME));
    assert_eq!(
        get_config_path(Some("/tmp/custom.toml")),
        PathBuf::from("/tmp/custom.toml")
    );
}

#[test]
#[serial]
fn test_load_effective_applies_process_environment() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("dashboard.toml");
    AppConfig::default()
        .save(&config_path)
        .expect("Failed to save config");

    std::env::set_var(ENV_PASSWORD, "from-env");
    let result = AppConfig::load_effective(config_path.to_str());
    std::env::remove_var(ENV_PASSWORD);

    let config = result.expect("Failed to load config");
    assert_eq!(config.authentication.password.as_deref(), Some("from-env"));
}

#[test]
#[serial]
fn test_load_effective_requires_explicit_file_to_exist() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let missing = temp_dir.path().join("missing.toml");

    let result = AppConfig::load_effective(missing.to_str());

    assert!(matches!(result, Err(Error::Config(_))));
}
