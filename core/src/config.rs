//! Runtime configuration.
//!
//! Defaults are usable as-is; a JSON document or the `LINCHPIN_*`
//! environment variables can override them.

use crate::errors::{LinchpinError, LinchpinResult};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`LogConfig::level`].
pub const ENV_LOG_LEVEL: &str = "LINCHPIN_LOG_LEVEL";
/// Environment variable overriding [`NotifierConfig::worker_threads`].
pub const ENV_NOTIFY_THREADS: &str = "LINCHPIN_NOTIFY_THREADS";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
const WRITE_STYLES: [&str; 3] = ["auto", "always", "never"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub log: LogConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `LINCHPIN_LOG` is unset.
    pub level: String,
    /// Terminal colouring: `auto`, `always` or `never`.
    pub write_style: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            write_style: "auto".to_string(),
        }
    }
}

/// Settings for the pool that delivers context notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub worker_threads: usize,
    pub thread_name_prefix: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(1),
            thread_name_prefix: "linchpin-notify".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> LinchpinResult<Self> {
        let config: RuntimeConfig =
            serde_json::from_str(json).map_err(|e| LinchpinError::Configuration {
                code: "LINCHPIN_CONFIG_PARSE_FAILED".to_string(),
                message: format!("Invalid configuration document: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the `LINCHPIN_*` environment variables.
    pub fn from_env() -> LinchpinResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LinchpinResult<Self> {
        let mut config = RuntimeConfig::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log.level = level;
        }
        if let Some(threads) = lookup(ENV_NOTIFY_THREADS) {
            config.notifier.worker_threads =
                threads
                    .trim()
                    .parse()
                    .map_err(|_| LinchpinError::Configuration {
                        code: "LINCHPIN_CONFIG_INVALID_THREADS".to_string(),
                        message: format!(
                            "{} must be a positive integer, got '{}'",
                            ENV_NOTIFY_THREADS, threads
                        ),
                    })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LinchpinResult<()> {
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(LinchpinError::Configuration {
                code: "LINCHPIN_CONFIG_INVALID_LOG_LEVEL".to_string(),
                message: format!(
                    "Invalid log level: {}. Use off, error, warn, info, debug or trace",
                    self.log.level
                ),
            });
        }
        if !WRITE_STYLES.contains(&self.log.write_style.as_str()) {
            return Err(LinchpinError::Configuration {
                code: "LINCHPIN_CONFIG_INVALID_WRITE_STYLE".to_string(),
                message: format!("Invalid write style: {}", self.log.write_style),
            });
        }
        if self.notifier.worker_threads == 0 {
            return Err(LinchpinError::Configuration {
                code: "LINCHPIN_CONFIG_INVALID_THREADS".to_string(),
                message: "Notifier needs at least one worker thread".to_string(),
            });
        }
        if self.notifier.thread_name_prefix.is_empty() {
            return Err(LinchpinError::Configuration {
                code: "LINCHPIN_CONFIG_EMPTY_THREAD_NAME".to_string(),
                message: "Notifier thread name prefix cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
