//! Integration tests for config load/save and path resolution.

use aibot_client::config::{self, Backend, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
use aibot_client::conversation::DEFAULT_GREETING;
use aibot_client::speech::RecognizerOptions;
use aibot_client::Config;
use predicates::prelude::*;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
chat:
  backend: relay
  greeting: "Hi, ask me anything."
gemini:
  base_url: "http://localhost:9000/v1beta"
  model: "gemini-2.0-flash"
  api_key_env: "MY_GEMINI_KEY"
relay:
  url: "ws://localhost:8765"
speech:
  lang: "de-DE"
  interim_results: false
  command: "whisper-stream"
  args:
    - "--model"
    - "base"
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.backend(), Backend::Relay);
    assert_eq!(cfg.greeting(), "Hi, ask me anything.");
    assert_eq!(cfg.base_url(), "http://localhost:9000/v1beta");
    assert_eq!(cfg.model(), "gemini-2.0-flash");
    assert_eq!(cfg.api_key_env(), "MY_GEMINI_KEY");
    assert_eq!(cfg.relay.url.as_deref(), Some("ws://localhost:8765"));
    assert_eq!(cfg.speech.command.as_deref(), Some("whisper-stream"));
    assert_eq!(cfg.speech.args, vec!["--model", "base"]);

    let options = RecognizerOptions::from(&cfg.speech);
    assert_eq!(options.lang, "de-DE");
    assert!(options.continuous);
    assert!(!options.interim_results);
}

#[test]
fn empty_sections_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "chat: {}\n").unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.backend(), Backend::Gemini);
    assert_eq!(cfg.greeting(), DEFAULT_GREETING);
    assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    assert_eq!(cfg.model(), DEFAULT_MODEL);
    assert_eq!(cfg.api_key_env(), DEFAULT_API_KEY_ENV);
    assert_eq!(RecognizerOptions::from(&cfg.speech), RecognizerOptions::default());
}

#[test]
fn missing_file_loads_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config::load_or_default(&dir.path().join("absent.yaml")).expect("default config");
    assert_eq!(cfg.backend(), Backend::Gemini);
    assert!(cfg.relay.url.is_none());

    let err = config::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().starts_with("IO error:"));
}

#[test]
fn malformed_yaml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "chat:\n  backend: [not, a, backend]\n").unwrap();

    let err = config::load_or_default(&config_path).unwrap_err();
    assert!(err.to_string().starts_with("YAML error:"));
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("aibot");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut config = Config::default();
    config.chat.backend = Some(Backend::Relay);
    config.relay.url = Some("ws://localhost:8765".into());

    config::save(&config_path, &config).expect("save should succeed");
    let pred = predicates::path::exists();
    assert!(
        pred.eval(&config_path),
        "config file should exist after save"
    );
    assert!(config_dir.exists(), "config directory should be created");
}

#[test]
fn round_trip_preserves_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    let yaml = r#"
chat:
  backend: gemini
gemini:
  model: "gemini-2.5-pro"
  system_instruction: "Answer in one sentence."
speech:
  continuous: false
"#;
    std::fs::write(&config_path, yaml).unwrap();

    let loaded = config::load(&config_path).expect("load should succeed");
    config::save(&config_path, &loaded).expect("save should succeed");

    let contents = std::fs::read_to_string(&config_path).unwrap();
    let pred = predicates::str::contains("backend: gemini");
    assert!(pred.eval(&contents), "saved file should contain backend");
    let pred = predicates::str::contains("system_instruction");
    assert!(
        pred.eval(&contents),
        "saved file should contain system_instruction"
    );
    let pred = predicates::str::contains("base_url").not();
    assert!(pred.eval(&contents), "unset fields should not be written");

    let reloaded = config::load(&config_path).expect("reload should succeed");
    assert_eq!(reloaded.model(), loaded.model());
    assert_eq!(reloaded.system_instruction(), "Answer in one sentence.");
    assert_eq!(reloaded.speech.continuous, Some(false));
}

#[test]
fn explicit_config_path_wins() {
    let explicit = std::path::Path::new("/tmp/elsewhere.yaml");
    assert_eq!(
        config::resolve_config_path(Some(explicit)).as_deref(),
        Some(explicit)
    );
}

/// Config path resolves to `~/.aibot/config.yaml` using the current platform's home dir.
/// We override the HOME env var to a temp dir to verify the resolution.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    // Override HOME (Unix) / USERPROFILE (Windows) temporarily.
    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    // Restore.
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    let expected = dir.path().join(".aibot").join("config.yaml");
    assert_eq!(path, expected);
}
