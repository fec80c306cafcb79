use insight::utils::toml_config::{ConfigError, ConfigManager, InsightConfig};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const BASE_CONFIG: &str = r#"
[server]
port = 9100

[providers.local]
type = "ollama"
default_model = "llama3.2"

[models.default]
provider = "local"
model = "llama3.2"

[coach]
max_conversation_turns = 12
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(BASE_CONFIG);
    let config = InsightConfig::load(file.path()).unwrap();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.api.prefix, "/api/v1");
    assert_eq!(config.coach.max_conversation_turns, 12);
    assert_eq!(config.coach.summary_after_messages, 4);
    assert!(!config.router.strict_validation);
}

#[test]
fn test_load_rejects_dangling_provider() {
    let file = write_config(
        r#"
[models.default]
provider = "nowhere"
model = "llama3.2"
"#,
    );

    let err = InsightConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingProvider(ref p, ref m) if p == "nowhere" && m == "default"));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let file = write_config("[server\nport = ");
    assert!(matches!(
        InsightConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_manager_reload_picks_up_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("insight.toml");
    fs::write(&path, BASE_CONFIG).unwrap();

    let manager = ConfigManager::new(&path).unwrap();
    assert_eq!(manager.config().server.port, 9100);

    fs::write(&path, BASE_CONFIG.replace("9100", "9200")).unwrap();
    manager.reload().unwrap();
    assert_eq!(manager.config().server.port, 9200);
}

#[test]
fn test_manager_keeps_config_when_reload_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("insight.toml");
    fs::write(&path, BASE_CONFIG).unwrap();

    let manager = ConfigManager::new(&path).unwrap();
    fs::write(&path, "not = [valid").unwrap();

    assert!(manager.reload().is_err());
    assert_eq!(manager.config().server.port, 9100);
}

#[test]
fn test_manager_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = ConfigManager::new(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_api_key_from_environment() {
    std::env::set_var("INSIGHT_CONFIG_TESTS_KEY", "k-123");
    let file = write_config(
        r#"
[api]
api_key_env = "INSIGHT_CONFIG_TESTS_KEY"
"#,
    );

    let config = InsightConfig::load(file.path()).unwrap();
    assert_eq!(config.api_key().unwrap().as_deref(), Some("k-123"));
    assert_eq!(InsightConfig::default().api_key().unwrap(), None);
}

#[test]
fn test_tool_overrides() {
    let file = write_config(
        r#"
[tools.web_search]
enabled = false

[tools.data_analysis]
timeout_secs = 5
"#,
    );

    let config = InsightConfig::load(file.path()).unwrap();
    assert!(!config.is_tool_enabled("web_search"));
    assert!(config.is_tool_enabled("document_analysis"));
    assert_eq!(config.tool_timeout("data_analysis").as_secs(), 5);
    assert_eq!(config.tool_timeout("business_metrics").as_secs(), 30);
}
