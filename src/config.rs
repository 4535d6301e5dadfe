//! Configuration loading and management.
//!
//! Resolution order, later tiers overriding earlier ones:
//! 1. Built-in defaults
//! 2. The first config file found: an explicit path, `./task-api.yaml`, or
//!    `<user config dir>/task-api/config.yaml`
//! 3. Environment variables `TASK_API_DB_PATH`, `TASK_API_HOST`, `TASK_API_PORT`
//!
//! Command-line flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "task-api.yaml";

/// Server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".task-api/tasks.db")
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Config file locations searched when no explicit path is given.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("task-api").join("config.yaml"));
        }
        paths
    }

    /// Resolve the full configuration.
    ///
    /// An explicit path must exist and parse. Otherwise the first search path
    /// that exists is used, falling back to defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::load(path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TASK_API_*` overrides from the given variable lookup.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = var("TASK_API_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = var("TASK_API_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("TASK_API_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid TASK_API_PORT: {}", port))?;
        }

        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .with_context(|| format!("invalid bind address: {}", addr))
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.db_path, PathBuf::from(".task-api/tasks.db"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 9001\n").unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  host: 0.0.0.0\n  db_path: /tmp/t.db\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/t.db"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::resolve(Some(dir.path().join("nope.yaml").as_path())).is_err());
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("TASK_API_DB_PATH", "data/tasks.db"),
            ("TASK_API_PORT", "8081"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.db_path, PathBuf::from("data/tasks.db"));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn invalid_env_port_is_rejected() {
        let mut config = Config::default();
        assert!(
            config
                .apply_env(|key| (key == "TASK_API_PORT").then(|| "http".to_string()))
                .is_err()
        );
    }

    #[test]
    fn bind_addr_parses() {
        let addr = Config::default().bind_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.db_path = dir.path().join("nested/deeper/tasks.db");
        config.ensure_db_dir().unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
