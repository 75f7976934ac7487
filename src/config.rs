//! User configuration management

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reminder::scanner::DEFAULT_HORIZON_HOURS;

pub const APP_NAME: &str = "todo-reminder";
const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "todos.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file; defaults to `todos.json` in the app directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,

    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            notify_timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_horizon_hours() -> u32 {
    DEFAULT_HORIZON_HOURS as u32
}

fn default_notify_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Send a notice whenever a task is added
    #[serde(default = "default_true")]
    pub notify_on_add: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            webhook_url: None,
            notify_on_add: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load `config.toml` from `dir`; a missing file yields defaults.
    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(load_config(dir)?.unwrap_or_default())
    }

    pub fn store_path(&self, dir: &Path) -> PathBuf {
        match &self.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => dir.join(path),
            None => dir.join(STORE_FILE),
        }
    }

    pub fn horizon(&self) -> Duration {
        Duration::hours(i64::from(self.reminder.horizon_hours))
    }

    pub fn notify_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reminder.notify_timeout_secs)
    }
}

/// `$XDG_CONFIG_HOME/todo-reminder` on Linux, `~/.todo-reminder` elsewhere.
pub fn get_app_dir() -> Result<PathBuf> {
    #[cfg(target_os = "linux")]
    let dir = dirs::config_dir()
        .context("Cannot find config directory")?
        .join(APP_NAME);

    #[cfg(not(target_os = "linux"))]
    let dir = dirs::home_dir()
        .context("Cannot find home directory")?
        .join(format!(".{}", APP_NAME));

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create app directory {}", dir.display()))?;
    Ok(dir)
}

pub fn load_config(dir: &Path) -> Result<Option<Config>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_config(dir: &Path, config: &Config) -> Result<()> {
    fs::create_dir_all(dir)?;
    let content = toml::to_string_pretty(config)?;
    fs::write(dir.join(CONFIG_FILE), content)?;
    Ok(())
}
