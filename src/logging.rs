//! Tracing subscriber setup
//!
//! Human-readable output by default, JSON lines with `--json-logs`. When a
//! log file is given, the same events are appended to it as well. `RUST_LOG`
//! takes precedence over the configured level.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Result;

/// Default filter directive
pub const DEFAULT_LEVEL: &str = "sweeparr=info";

/// Logging options collected from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,

    /// Optional file to append log lines to
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl LoggingConfig {
    /// Filter from `RUST_LOG`, falling back to `level`
    pub fn env_filter(&self) -> Result<EnvFilter> {
        Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.level))?)
    }
}

/// Install the global subscriber
///
/// Fails if the log file cannot be opened or the level is not a valid
/// filter directive. Must be called at most once per process.
///
/// # Examples
///
/// ```no_run
/// use sweeparr::logging::{init_logging, LoggingConfig};
///
/// init_logging(&LoggingConfig {
///     json_format: true,
///     ..LoggingConfig::default()
/// })
/// .unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if config.json_format {
        let stdout_layer = fmt::layer().json().with_current_span(true);
        let file_layer = file.map(|file| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file)
        });
        registry.with(stdout_layer).with(file_layer).try_init()?;
    } else {
        let stdout_layer = fmt::layer().with_target(true).with_level(true);
        let file_layer = file.map(|file| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file)
        });
        registry.with(stdout_layer).with(file_layer).try_init()?;
    }

    Ok(())
}
