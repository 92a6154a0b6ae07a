//! Configuration for rawkeys.
//!
//! Settings come from built-in defaults, an optional TOML file named with
//! `--config`, and command-line flags, in increasing priority. Nothing is
//! read implicitly: without `--config` no file is touched.
//!
//! # Configuration File
//!
//! ```toml
//! # Byte that ends the session (a single ASCII character)
//! quit_key = "q"
//!
//! # Read timeout in milliseconds, rounded up to tenths of a second
//! timeout_ms = 100
//!
//! # Log filter, used only together with --log
//! log_level = "info"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::core::termios::MAX_TIMEOUT_MS;
use crate::core::ReadTimeout;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Quit key must be a single ASCII character, got {0:?}")]
    QuitKey(char),

    #[error("Timeout must be between 1 and {} ms, got {0}", MAX_TIMEOUT_MS)]
    Timeout(u64),

    #[error("Invalid log level {0:?}")]
    LogLevel(String),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Byte that ends the session
    pub quit_key: char,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Log filter directive (e.g. "info", "rawkeys=trace")
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quit_key: 'q',
            timeout_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render as TOML
    pub fn to_toml(&self) -> String {
        // Three scalar fields; serialisation cannot fail
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every field, so errors surface before raw mode is entered
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quit_byte()?;
        self.read_timeout()?;
        self.log_filter()?;
        Ok(())
    }

    pub fn quit_byte(&self) -> Result<u8, ConfigError> {
        if self.quit_key.is_ascii() {
            Ok(self.quit_key as u8)
        } else {
            Err(ConfigError::QuitKey(self.quit_key))
        }
    }

    pub fn read_timeout(&self) -> Result<ReadTimeout, ConfigError> {
        ReadTimeout::from_millis(self.timeout_ms).ok_or(ConfigError::Timeout(self.timeout_ms))
    }

    /// Log filter built from `log_level` (never from the environment)
    pub fn log_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
