//! User configuration, read from `wog.toml` in the platform config directory.
//!
//! ```toml
//! prompt = "wog $ "
//!
//! [history]
//! file = ".cli.json"
//! size = 100
//! debounce-ms = 1000
//! ```
//!
//! Every key is optional.

use crate::{history, paths};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Prompt shown before each line. A colored default is used when unset.
    pub prompt: Option<String>,
    pub history: HistoryConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct HistoryConfig {
    pub file: PathBuf,
    pub size: usize,
    pub debounce_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: paths::history_file(),
            size: history::DEFAULT_HISTORY_SIZE,
            debounce_ms: history::DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl HistoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load the config file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load the config file from the platform config directory, if there is
    /// one.
    pub fn load_default() -> Result<Self, ConfigError> {
        match paths::config_file() {
            Ok(path) => Self::load(&path),
            Err(e) => {
                log::debug!("no config directory available: {}", e);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load(&dir.path().join("wog.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.history.size, 100);
        assert_eq!(config.history.file, PathBuf::from(".cli.json"));
        assert_eq!(config.history.debounce(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wog.toml");
        fs::write(&path, "prompt = \"> \"\n\n[history]\nsize = 20\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.prompt.as_deref(), Some("> "));
        assert_eq!(config.history.size, 20);
        assert_eq!(config.history.debounce_ms, 1000);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wog.toml");
        fs::write(&path, "[history]\nsize = \"lots\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
