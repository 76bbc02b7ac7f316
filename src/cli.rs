//! Command-line interface definition for sweeparr
//!
//! Every global option also reads an environment variable, so the service
//! can be configured entirely from a container environment.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::{LoggingConfig, DEFAULT_LEVEL};

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// sweeparr - delete watched TV episodes from Sonarr
///
/// Receives Plex webhooks, records watched episodes, and removes them from
/// Sonarr once their grace period allows.
#[derive(Parser, Debug, Clone)]
#[command(name = "sweeparr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the policy configuration file (JSON, or YAML by extension)
    #[arg(short, long, global = true, env = "SWEEPARR_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Path to the watched-event database
    #[arg(long, global = true, env = "SWEEPARR_DB", default_value = "watched.db")]
    pub db: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "SWEEPARR_LOG_LEVEL", default_value = DEFAULT_LEVEL)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SWEEPARR_JSON_LOGS")]
    pub json_logs: bool,

    /// Also append logs to this file
    #[arg(long, global = true, env = "SWEEPARR_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the webhook server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "SWEEPARR_BIND", default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Show the most recently watched episodes
    History {
        /// Maximum number of rows
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: u32,
    },

    /// Parse and validate the configuration, then print the effective policy
    CheckConfig,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `serve` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_else(|| Commands::Serve {
            bind: std::env::var("SWEEPARR_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
        })
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            json_format: self.json_logs,
            file_path: self.log_file.clone(),
        }
    }
}
