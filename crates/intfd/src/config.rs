//! Configuration file support for intfd.
//!
//! Loads and validates the daemon configuration from TOML.
//! Default location: /etc/sonic/intfd.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IntfdError, IntfdResult};
use crate::tables::{DEFAULT_LOCK_NAME, DEFAULT_SUBSYSTEM};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/intfd.toml";

/// Store access configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Name of the write lock the daemon must hold
    #[serde(default = "default_lock_name")]
    pub lock_name: String,

    /// Longest wait for a change batch, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// JSON snapshot loaded into the in-memory store at startup
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

/// System-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Subsystem row carrying the maximum MTU
    #[serde(default = "default_subsystem")]
    pub subsystem: String,
}

/// Forwarding-state arbiter settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Block forwarding until `hw_status:ready` is true
    #[serde(default)]
    pub require_hw_ready: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Complete intfd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntfdConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub arbiter: ArbiterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_lock_name() -> String {
    DEFAULT_LOCK_NAME.to_string()
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_subsystem() -> String {
    DEFAULT_SUBSYSTEM.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_name: default_lock_name(),
            poll_timeout_ms: default_poll_timeout_ms(),
            snapshot: None,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            subsystem: default_subsystem(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl IntfdConfig {
    /// Load configuration from file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> IntfdResult<Option<Self>> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)
                    .map_err(|e| IntfdError::config_file(path, e.to_string()))?;
                config.validate()?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IntfdError::Io(e)),
        }
    }

    /// Poll timeout as a Duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.store.poll_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> IntfdResult<()> {
        if self.store.lock_name.is_empty() {
            return Err(IntfdError::invalid_config(
                "store.lock_name",
                "must not be empty",
            ));
        }
        if self.store.poll_timeout_ms == 0 {
            return Err(IntfdError::invalid_config(
                "store.poll_timeout_ms",
                "must be > 0",
            ));
        }
        if self.system.subsystem.is_empty() {
            return Err(IntfdError::invalid_config(
                "system.subsystem",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
