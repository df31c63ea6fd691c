//! Logger installation.
//!
//! The library itself only emits through the `log` macros; binaries and
//! tests call [`init_logging`] once to install an `env_logger` backend.

use crate::config::LogConfig;
use crate::errors::{LinchpinError, LinchpinResult};
use env_logger::{Builder, Env, WriteStyle};

/// Environment variable holding an `env_logger` filter that overrides
/// [`LogConfig::level`].
pub const ENV_LOG_FILTER: &str = "LINCHPIN_LOG";

/// Install the global logger described by `config`.
///
/// Fails with `LINCHPIN_LOGGER_ALREADY_INITIALIZED` when a logger is
/// already installed.
pub fn init_logging(config: &LogConfig) -> LinchpinResult<()> {
    builder(config)
        .try_init()
        .map_err(|e| LinchpinError::System {
            code: "LINCHPIN_LOGGER_ALREADY_INITIALIZED".to_string(),
            message: format!("Logger already installed: {}", e),
        })?;
    log::info!("Logging initialized with level: {}", config.level);
    Ok(())
}

fn builder(config: &LogConfig) -> Builder {
    let env = Env::new()
        .filter_or(ENV_LOG_FILTER, config.level.to_lowercase())
        .write_style(format!("{}_STYLE", ENV_LOG_FILTER));
    let mut builder = Builder::from_env(env);
    builder.write_style(parse_write_style(&config.write_style));
    builder
}

fn parse_write_style(style: &str) -> WriteStyle {
    match style {
        "always" => WriteStyle::Always,
        "never" => WriteStyle::Never,
        _ => WriteStyle::Auto,
    }
}
