//! Client config load/save for `~/.aibot/config.yaml`.
//! Sections: chat.*, gemini.*, relay.*, speech.*. Every field is optional.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful and friendly AI assistant. Be concise, helpful, and provide code examples when relevant.";
pub const DEFAULT_LANG: &str = "en-US";

/// Which chat service to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Gemini,
    Relay,
}

/// Chat section (backend, greeting).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ChatSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

/// Gemini section (base_url, model, system_instruction, api_key_env).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct GeminiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Relay section (url).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RelaySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Speech section (lang, continuous, interim_results, command, args).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SpeechSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interim_results: Option<bool>,
    /// External speech-to-text program used by terminal front-ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Full config.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub speech: SpeechSection,
}

impl Config {
    pub fn backend(&self) -> Backend {
        self.chat.backend.unwrap_or_default()
    }

    pub fn greeting(&self) -> &str {
        self.chat
            .greeting
            .as_deref()
            .unwrap_or(crate::conversation::DEFAULT_GREETING)
    }

    pub fn base_url(&self) -> &str {
        self.gemini.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.gemini.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn system_instruction(&self) -> &str {
        self.gemini
            .system_instruction
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    pub fn api_key_env(&self) -> &str {
        self.gemini
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }
}

/// Returns the default config file path: `~/.aibot/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".aibot").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Resolve the config path: explicit path, then `AIBOT_CONFIG`, then the default.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(val) = std::env::var_os("AIBOT_CONFIG") {
        return Some(PathBuf::from(val));
    }
    default_config_path()
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load config, treating a missing file as the default config.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
