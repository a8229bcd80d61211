// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Mode, Style, DEFAULT_MAX_ATTEMPTS, DEFAULT_THRESHOLD};
use crate::services::providers::{DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

const CONFIG_VERSION: &str = "1";
const LLM_KEY_NAME: &str = "llm";
const BACKUPS_TO_KEEP: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config IO error ({context}): {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(context: &'static str) -> impl FnOnce(std::io::Error) -> ConfigError {
    move |source| ConfigError::Io { context, source }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            llm: LlmConfig::default(),
            defaults: DefaultsConfig::default(),
            api_keys: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Request knobs used when the caller leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub mode: Mode,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            style: Style::default(),
            mode: Mode::default(),
        }
    }
}

fn default_version() -> String { CONFIG_VERSION.to_string() }
fn default_api_url() -> String { DEFAULT_API_URL.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_timeout() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_threshold() -> f64 { DEFAULT_THRESHOLD }
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("humanly"))
    }

    /// Store at the default location, if the platform has one.
    pub fn open_default() -> Option<Self> {
        Self::default_config_dir().map(Self::new)
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(io_err("create config dir"))
    }

    /// Load configuration from file; a missing file yields defaults.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(io_err("read config"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content).map_err(io_err("write config"))
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_dir.join("backups")
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).map_err(io_err("create backup dir"))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(io_err("create backup"))?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_TO_KEEP)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(io_err("read backup dir"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Get the LLM API key from config file
    pub fn get_api_key(&self) -> Result<Option<String>, ConfigError> {
        let config = self.load()?;
        Ok(config
            .api_keys
            .get(LLM_KEY_NAME)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }

    /// Store the LLM API key in config file
    pub fn set_api_key(&self, key: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.insert(LLM_KEY_NAME.to_string(), key.to_string());
        self.save(&config)
    }

    /// Delete the LLM API key from config file
    pub fn delete_api_key(&self) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.remove(LLM_KEY_NAME);
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.defaults.threshold, 30.0);
        assert_eq!(config.defaults.max_attempts, 10);
        assert_eq!(config.defaults.mode, Mode::Balanced);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"llm":{"model":"mixtral"},"defaults":{"style":"casual"}}"#).unwrap();
        assert_eq!(parsed.llm.model, "mixtral");
        assert_eq!(parsed.llm.api_url, DEFAULT_API_URL);
        assert_eq!(parsed.defaults.style, Style::Casual);
        assert_eq!(parsed.defaults.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_config_serialization_is_camel_case() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains("\"timeoutSecs\""));
        assert!(json.contains("\"maxAttempts\""));
        assert!(json.contains("\"apiKeys\""));
    }

    #[test]
    fn test_api_key_roundtrip_and_backups() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        assert_eq!(store.get_api_key().unwrap(), None);
        store.set_api_key("sk-test").unwrap();
        assert_eq!(store.get_api_key().unwrap(), Some("sk-test".to_string()));

        store.delete_api_key().unwrap();
        assert_eq!(store.get_api_key().unwrap(), None);

        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert!(backups >= 1);
    }

    #[test]
    fn test_corrupt_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        assert!(matches!(store.load(), Err(ConfigError::Json(_))));
    }
}
