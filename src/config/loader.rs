//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
    /// Explicit config file, applied above project and user tiers
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from the process environment.
    pub fn discover() -> Self {
        Self::discover_with(|key| std::env::var(key).ok())
    }

    /// Discover configuration paths using `env` to read variables.
    pub fn discover_with(env: impl Fn(&str) -> Option<String>) -> Self {
        // User dir: LOVE_QUESTS_USER_DIR or ~/.love-quests
        let user_dir = env("LOVE_QUESTS_USER_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".love-quests")));

        // Project dir: LOVE_QUESTS_PROJECT_DIR or $CWD/love-quests
        let project_dir = env("LOVE_QUESTS_PROJECT_DIR")
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("love-quests")));

        Self {
            project_dir,
            user_dir,
            explicit_file: env("LOVE_QUESTS_CONFIG_PATH").map(PathBuf::from),
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    pub fn with_explicit_file(mut self, file: Option<PathBuf>) -> Self {
        if file.is_some() {
            self.explicit_file = file;
        }
        self
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration with explicit paths, reading overrides from the process environment.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with(paths, |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and environment lookup.
    pub fn load_with(paths: ConfigPaths, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut configs: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        // Project, then user. Unreadable optional tiers are skipped with a warning.
        let tier_files = [
            paths.project_dir.as_ref().map(|d| d.join("config.yaml")),
            paths.user_dir.as_ref().map(|d| d.join("config.yaml")),
        ];
        for file in tier_files.into_iter().flatten() {
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    configs.push(value);
                    sources.push(file);
                }
                Err(e) => warn!("Ignoring config file {}: {:#}", file.display(), e),
            }
        }

        // An explicitly named file must load.
        if let Some(ref file) = paths.explicit_file {
            configs.push(read_yaml(file)?);
            sources.push(file.clone());
        }

        let merged = deep_merge_all(configs);
        let mut config: Config =
            serde_json::from_value(merged).context("invalid configuration")?;

        Self::apply_env_overrides(&mut config, env);
        debug!(?sources, "configuration loaded");

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = env("LOVE_QUESTS_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = env("LOVE_QUESTS_HOST") {
            config.server.host = host;
        }

        if let Some(port) = env("LOVE_QUESTS_PORT") {
            match port.trim().parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring LOVE_QUESTS_PORT={:?}: not a port number", port),
            }
        }

        if let Some(url) = env("LOVE_QUESTS_REMOTE_URL") {
            config.remote.url = Some(url);
        }

        if let Some(dir) = env("LOVE_QUESTS_CACHE_DIR") {
            config.cache.dir = PathBuf::from(dir);
        }

        if let Some(password) = env("LOVE_QUESTS_ADMIN_PASSWORD") {
            config.admin.password = password;
        }

        if let Some(key) = env("GEMINI_API_KEY").or_else(|| env("API_KEY")) {
            config.story.api_key = Some(key);
        }

        if let Some(name) = env("LOVE_QUESTS_YOUR_NAME") {
            config.story.your_name = name;
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &Path, body: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("config.yaml"), body).unwrap();
    }

    #[test]
    fn test_config_paths_discover() {
        let env: HashMap<&str, &str> = [
            ("LOVE_QUESTS_USER_DIR", "/tmp/u"),
            ("LOVE_QUESTS_CONFIG_PATH", "/tmp/c.yaml"),
        ]
        .into();
        let paths = ConfigPaths::discover_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(paths.user_dir, Some(PathBuf::from("/tmp/u")));
        assert_eq!(paths.project_dir, Some(PathBuf::from("love-quests")));
        assert_eq!(paths.explicit_file, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );
        let loader = ConfigLoader::load_with(paths, no_env).unwrap();
        assert_eq!(loader.config().server.port, 3001);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        let user = temp.path().join("user");
        write(&project, "server:\n  port: 4000\n  host: 0.0.0.0\n");
        write(&user, "server:\n  port: 5000\n");

        let loader =
            ConfigLoader::load_with(ConfigPaths::with_dirs(Some(project), Some(user)), no_env)
                .unwrap();
        let config = loader.config();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(loader.sources().len(), 2);
    }

    #[test]
    fn test_explicit_file_wins_over_tiers() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        write(&project, "admin:\n  password: fromproject\n");
        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&explicit, "admin:\n  password: fromexplicit\n").unwrap();

        let paths =
            ConfigPaths::with_dirs(Some(project), None).with_explicit_file(Some(explicit));
        let config = ConfigLoader::load_with(paths, no_env).unwrap().into_config();
        assert_eq!(config.admin.password, "fromexplicit");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(None, None)
            .with_explicit_file(Some(temp.path().join("nope.yaml")));
        assert!(ConfigLoader::load_with(paths, no_env).is_err());
    }

    #[test]
    fn test_broken_project_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        write(&project, "server: [not, a, map\n");
        let config = ConfigLoader::load_with(ConfigPaths::with_dirs(Some(project), None), no_env)
            .unwrap()
            .into_config();
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let env: HashMap<&str, &str> = [
            ("LOVE_QUESTS_PORT", "8081"),
            ("LOVE_QUESTS_REMOTE_URL", "http://pi:3001"),
            ("API_KEY", "k1"),
            ("LOVE_QUESTS_ADMIN_PASSWORD", "secret"),
        ]
        .into();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("p")), None);
        let config = ConfigLoader::load_with(paths, |k| env.get(k).map(|v| v.to_string()))
            .unwrap()
            .into_config();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.remote.url.as_deref(), Some("http://pi:3001"));
        assert_eq!(config.story.api_key.as_deref(), Some("k1"));
        assert_eq!(config.admin.password, "secret");
    }

    #[test]
    fn test_bad_port_env_is_ignored() {
        let paths = ConfigPaths::with_dirs(None, None);
        let config = ConfigLoader::load_with(paths, |k| {
            (k == "LOVE_QUESTS_PORT").then(|| "abc".to_string())
        })
        .unwrap()
        .into_config();
        assert_eq!(config.server.port, 3001);
    }
}
