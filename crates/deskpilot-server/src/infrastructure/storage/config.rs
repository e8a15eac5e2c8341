//! TOML configuration for the deskpilot server.
//!
//! Looked up at `--config <path>` when given, otherwise in the platform
//! config directory:
//! - Windows:  `%APPDATA%\deskpilot\config.toml`
//! - macOS:    `~/Library/Application Support/deskpilot/config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/deskpilot/config.toml` or `~/.config/deskpilot/config.toml`
//!
//! Every field may be omitted:
//!
//! ```toml
//! [server]
//! log_level = "debug"
//!
//! [timing]
//! pointer_settle_ms = 10
//! click_interval_ms = 10
//! keystroke_interval_ms = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::automate::DriverTimings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"deskpilot_server=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Delays between native calls, in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "default_pointer_settle_ms")]
    pub pointer_settle_ms: u64,
    #[serde(default = "default_click_interval_ms")]
    pub click_interval_ms: u64,
    #[serde(default)]
    pub keystroke_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_pointer_settle_ms() -> u64 {
    10
}
fn default_click_interval_ms() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pointer_settle_ms: default_pointer_settle_ms(),
            click_interval_ms: default_click_interval_ms(),
            keystroke_interval_ms: 0,
        }
    }
}

impl TimingConfig {
    pub fn driver_timings(&self) -> DriverTimings {
        DriverTimings {
            pointer_settle: Duration::from_millis(self.pointer_settle_ms),
            click_interval: Duration::from_millis(self.click_interval_ms),
            keystroke_interval: Duration::from_millis(self.keystroke_interval_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses configuration text.
pub fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the file at `path`, or defaults if it does not exist.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found", and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the platform config file; defaults when there is no config
/// directory or no file.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    match config_file_path() {
        Some(path) => load_config_from(&path),
        None => Ok(AppConfig::default()),
    }
}

/// Full path of the platform config file, if the platform has a config dir.
pub fn config_file_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join("config.toml"))
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("deskpilot"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("deskpilot"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("deskpilot")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        parse_config(content, Path::new("config.toml"))
    }

    #[test]
    fn test_default_timings_match_driver_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.timing.driver_timings(), DriverTimings::default());
        assert_eq!(cfg.server.log_level, "info");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_timing_section_keeps_other_defaults() {
        // Arrange
        let content = "[timing]\nclick_interval_ms = 50\n";

        // Act
        let cfg = parse(content).unwrap();

        // Assert
        assert_eq!(cfg.timing.click_interval_ms, 50);
        assert_eq!(cfg.timing.pointer_settle_ms, 10);
        assert_eq!(cfg.timing.keystroke_interval_ms, 0);
        assert_eq!(cfg.server.log_level, "info");
    }

    #[test]
    fn test_timings_convert_to_durations() {
        let cfg = parse("[timing]\npointer_settle_ms = 5\nkeystroke_interval_ms = 2\n").unwrap();
        let timings = cfg.timing.driver_timings();
        assert_eq!(timings.pointer_settle, Duration::from_millis(5));
        assert_eq!(timings.click_interval, Duration::from_millis(10));
        assert_eq!(timings.keystroke_interval, Duration::from_millis(2));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = parse("[timing\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_wrong_value_type_is_a_parse_error() {
        let err = parse("[timing]\nclick_interval_ms = \"fast\"\n").unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("deskpilot-test-absent").join("config.toml");
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_existing_file_is_read() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("deskpilot-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[server]\nlog_level = \"debug\"\n").unwrap();

        // Act
        let cfg = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(cfg.server.log_level, "debug");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
