// Optional CLI configuration file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Which persistence adapter backs the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Json => write!(f, "json"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend: {} (expected json/sqlite)", other)),
        }
    }
}

/// Settings read from `<config dir>/todostore/config.yaml`. A missing or
/// malformed file degrades to defaults, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    pub backend: Backend,
}

impl Config {
    /// Location of the config file, if a config directory exists on this
    /// platform.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("todostore").join("config.yaml"))
    }

    /// Load the config file, falling back to defaults when it is absent
    /// or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = ?path, error = %e, "malformed config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Store directory used when neither the CLI nor the config file
    /// provides one.
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("todostore")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Json);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config =
            serde_yaml::from_str("store_path: /tmp/tasks\nbackend: sqlite\n").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/tasks")));
    }

    #[test]
    fn test_parse_partial_config_fills_defaults() {
        let config: Config = serde_yaml::from_str("backend: sqlite\n").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("json".parse::<Backend>().unwrap(), Backend::Json);
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("postgres".parse::<Backend>().is_err());
    }
}
