//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// adrflow - turn a feature request into an Architecture Decision Record
#[derive(Parser)]
#[command(
    name = "adrflow",
    about = "Conversational Architecture Decision Record generator",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new planning conversation
    New {
        /// The feature request to decide on
        feature: String,

        /// File whose contents are given to the agent as codebase context
        #[arg(long, value_name = "FILE")]
        context_file: Option<PathBuf>,

        /// Session id to save under (generated when omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Resume a saved conversation
    Resume {
        /// Session id
        session: String,
    },

    /// List saved sessions
    Sessions,

    /// Show a saved session
    Show {
        /// Session id
        session: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("adrflow")
        .join("logs")
        .join("adrflow.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key status and the log location
pub fn generate_after_help(api_key_env: &str) -> String {
    debug!(%api_key_env, "generate_after_help: called");
    let icon = if std::env::var(api_key_env).is_ok() {
        "\u{2705}"
    } else {
        "\u{274C}"
    };

    let mut help = String::new();
    help.push_str("API Key:\n");
    help.push_str(&format!("  {} {}\n", icon, api_key_env));
    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
