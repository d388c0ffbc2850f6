//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate locations.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/doomie/` | `~/.local/share/doomie/` |
//! | Config | `~/Library/Application Support/doomie/` | `~/.config/doomie/` |
//!
//! # Environment Overrides
//!
//! - `DOOMIE_DATA_DIR` overrides [`data_dir`]
//! - `DOOMIE_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root: the database and rolling logs live here.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DOOMIE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("doomie"))
        .unwrap_or_else(|| PathBuf::from("/tmp/doomie-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DOOMIE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("doomie"))
        .unwrap_or_else(|| PathBuf::from("/tmp/doomie-config"))
}

/// Default database file (`data_dir()/doomie.db`).
#[must_use]
pub fn database_file() -> PathBuf {
    data_dir().join("doomie.db")
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_nonempty() {
        assert!(!data_dir().as_os_str().is_empty());
    }

    #[test]
    fn config_file_ends_with_config_toml() {
        let path = config_file();
        let s = path.to_string_lossy();
        assert!(s.ends_with("config.toml"), "config_file: {s}");
    }

    #[test]
    fn database_and_logs_live_under_data_dir() {
        let data = data_dir();
        assert!(database_file().starts_with(&data));
        assert!(logs_dir().starts_with(&data));
        assert_eq!(
            database_file().file_name().and_then(|n| n.to_str()),
            Some("doomie.db")
        );
    }
}
