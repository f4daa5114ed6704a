//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default port of the progress API.
pub const DEFAULT_PORT: u16 = 3001;

/// Default shared admin password.
pub const DEFAULT_ADMIN_PASSWORD: &str = "love123";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub story: StoryConfig,
}

/// Progress API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("love-quests/love-quests.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// How the client reaches the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteMode {
    /// Talk to a progress API over HTTP.
    Http(String),
    /// Open `server.db_path` directly.
    Embedded,
    /// Never contact a remote; local cache only.
    Offline,
}

/// Client-side remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the progress API. When unset, the database at
    /// `server.db_path` is used directly.
    #[serde(default)]
    pub url: Option<String>,

    /// Skip the remote store entirely.
    #[serde(default)]
    pub offline: bool,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            offline: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn mode(&self) -> RemoteMode {
        if self.offline {
            return RemoteMode::Offline;
        }
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => RemoteMode::Http(url.to_string()),
            _ => RemoteMode::Embedded,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("love-quests"))
        .unwrap_or_else(|| PathBuf::from(".love-quests-cache"))
}

/// Admin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: default_admin_password(),
        }
    }
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

/// Story generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// The other person named in generated stories.
    #[serde(default = "default_your_name")]
    pub your_name: String,

    #[serde(default = "default_story_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            your_name: default_your_name(),
            timeout_ms: default_story_timeout_ms(),
        }
    }
}

impl StoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_your_name() -> String {
    "Your Name".to_string()
}

fn default_story_timeout_ms() -> u64 {
    60_000
}

impl Config {
    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
