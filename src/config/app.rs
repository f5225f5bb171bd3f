use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://192.168.101.51:8000/api";
const PROJECT_CONFIG_FILE: &str = "fighter-select.toml";
const GLOBAL_CONFIG_DIR: &str = ".fighter-select";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub app: AppSection,
}

/// Backend REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport-level request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Durable session storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key holding the bearer token
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Key holding the serialized user record
    #[serde(default = "default_user_key")]
    pub user_key: String,

    /// SQLite file; `~/.fighter-select/storage.db` when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long a transient message stays visible
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSection {
    /// Log full request and response bodies
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_token_key() -> String {
    "tekken_token".to_string()
}

fn default_user_key() -> String {
    "tekken_user".to_string()
}

fn default_message_timeout_ms() -> u64 {
    5_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            user_key: default_user_key(),
            db_path: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            message_timeout_ms: default_message_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl UiConfig {
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration with precedence: env > project file > global file > defaults.
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();
        if let Ok(home) = std::env::var("HOME") {
            layers.push(
                PathBuf::from(home)
                    .join(GLOBAL_CONFIG_DIR)
                    .join("config.toml"),
            );
        }
        layers.push(PathBuf::from(PROJECT_CONFIG_FILE));

        let mut merged = toml::Table::new();
        for path in &layers {
            if let Some(table) = read_table(path)? {
                debug!(path = %path.display(), "loaded config file");
                merge_tables(&mut merged, table);
            }
        }

        let mut config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .context("invalid configuration")?;
        config.apply_env();
        Ok(config)
    }

    /// Parse a single TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("FIGHTER_SELECT_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(flag) = std::env::var("FIGHTER_SELECT_DEBUG") {
            self.app.debug_mode = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let table = raw
        .parse::<toml::Table>()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(table))
}

/// Later layers win; nested tables merge key by key.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
