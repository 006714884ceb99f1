use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the bot's REST API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    #[serde(default = "default_queue_interval_ms")]
    pub queue_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// How many messages one fetch asks for (initial load and "load more").
    #[serde(default = "default_message_limit")]
    pub message_limit: u32,
}

/// Where view templates and sub-component fragments come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSourceKind {
    /// Fragments compiled into the binary.
    #[default]
    Embedded,
    /// `<dir>/<name>.html` on the local filesystem.
    Directory,
    /// `GET <base_url>/<name>.html`.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub source: TemplateSourceKind,
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_templates_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Path opened when the panel starts (`/`, `/history.html`, `/channels.html`).
    #[serde(default = "default_start_path")]
    pub start_path: String,
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            queue_interval_ms: default_queue_interval_ms(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            message_limit: default_message_limit(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            source: TemplateSourceKind::default(),
            dir: default_templates_dir(),
            base_url: default_templates_url(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            start_path: default_start_path(),
            toast_secs: default_toast_secs(),
        }
    }
}

impl PollingConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms.max(250))
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_millis(self.queue_interval_ms.max(250))
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_status_interval_ms() -> u64 {
    5_000
}

fn default_queue_interval_ms() -> u64 {
    10_000
}

fn default_page_size() -> u32 {
    20
}

fn default_message_limit() -> u32 {
    50
}

fn default_templates_dir() -> PathBuf {
    platform::config_dir().join("components")
}

fn default_templates_url() -> String {
    "http://127.0.0.1:8080/components".to_string()
}

fn default_start_path() -> String {
    "/".to_string()
}

fn default_toast_secs() -> u64 {
    3
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.polling.status_interval(), Duration::from_secs(5));
        assert_eq!(config.polling.queue_interval(), Duration::from_secs(10));
        assert_eq!(config.history.page_size, 20);
        assert_eq!(config.templates.source, TemplateSourceKind::Embedded);
        assert!(config.templates.dir.ends_with("botpanel/components"));
        assert_eq!(config.ui.start_path, "/");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"http://bot.local:9000\"\n\n[templates]\nsource = \"remote\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://bot.local:9000");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.templates.source, TemplateSourceKind::Remote);
        assert_eq!(config.channels.message_limit, 50);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.history.page_size = 35;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.history.page_size, 35);
    }
}
