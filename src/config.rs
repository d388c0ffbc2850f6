//! Configuration for the tracker server and board.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DoomieError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoomieConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Document store location.
    pub storage: StorageConfig,
    /// Done event change notifications.
    pub events: EventsConfig,
    /// Client board settings.
    pub board: BoardConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9000,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: crate::doomie_dirs::database_file(),
        }
    }
}

/// Change notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Changes buffered per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
    /// Seconds between SSE keep-alive comments.
    pub keep_alive_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: crate::notifier::DEFAULT_CAPACITY,
            keep_alive_secs: 15,
        }
    }
}

/// Board (client) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Base URL of the tracker server.
    pub server_url: String,
    /// How long a task stays active once its period elapses, in milliseconds.
    pub active_dwell_ms: u64,
    /// Number of recent done events kept in the feed.
    pub feed_limit: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:9000".to_owned(),
            active_dwell_ms: crate::activity::DEFAULT_DWELL_MS,
            feed_limit: 50,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Write daily rolling log files here instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "doomie=info".to_owned(),
            log_dir: None,
        }
    }
}

impl DoomieConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DoomieError::Config(e.to_string()))
    }

    /// Load `path` if given, else the default config file if it exists, else
    /// the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DoomieError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::doomie_dirs::config_file()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = DoomieConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.board.active_dwell_ms, 1000);
        assert!(config.events.channel_capacity > 0);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: DoomieConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [board]
            active_dwell_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.board.active_dwell_ms, 250);
        assert_eq!(config.board.server_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DoomieConfig::default();
        config.server.port = 0;
        config.storage.db_path = dir.path().join("test.db");
        config.logging.log_dir = Some(dir.path().join("logs"));
        config.save_to_file(&path).unwrap();

        let loaded = DoomieConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(DoomieConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = DoomieConfig::from_file(std::path::Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(DoomieError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            DoomieConfig::from_file(&path),
            Err(DoomieError::Config(_))
        ));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = DoomieConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
