//! Command-line Interface and Logging
//!
//! Argument parsing for `cconnect-sms` and tracing setup. Logs go to stderr
//! so command output on stdout stays clean.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Cosmic Connect SMS command-line interface
#[derive(Parser, Debug)]
#[command(name = "cconnect-sms")]
#[command(about = "Inspect SMS links and conversations for Cosmic Connect", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable JSON structured logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Show timestamps in logs
    #[arg(long, global = true)]
    pub timestamps: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse an sms: URI and show its recipients and body
    ParseUri {
        uri: String,

        /// Also print the send request packet
        #[arg(long)]
        packet: bool,
    },

    /// Normalize a phone number, optionally with ;phone-context=...
    Normalize { number: String },

    /// Wrap URLs in text with anchors
    Linkify { text: String },

    /// Render an epoch-millisecond timestamp
    FormatTime {
        epoch_ms: i64,

        /// Reference time in epoch milliseconds (defaults to now)
        #[arg(long, value_name = "MS")]
        now: Option<i64>,

        /// Use the short form
        #[arg(long)]
        short: bool,
    },

    /// Group the messages of a cconnect.sms.messages packet into threads
    Threads {
        /// Packet file, or - for stdin
        input: PathBuf,

        /// Only show this conversation
        #[arg(short, long)]
        thread_id: Option<i64>,

        /// Reference time in epoch milliseconds (defaults to now)
        #[arg(long, value_name = "MS")]
        now: Option<i64>,
    },

    /// List conversations in a cconnect.sms.messages packet, newest first
    Conversations {
        /// Packet file, or - for stdin
        input: PathBuf,

        /// Maximum number of conversations (defaults to the config value)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Reference time in epoch milliseconds (defaults to now)
        #[arg(long, value_name = "MS")]
        now: Option<i64>,
    },

    /// Show the effective configuration
    DumpConfig,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on CLI configuration
pub fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli.log_level.parse::<Level>().with_context(|| {
        format!(
            "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
            cli.log_level
        )
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.as_str()))
        .context("Failed to create log filter")?;

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    match (cli.json_logs, cli.timestamps) {
        (true, true) => subscriber.json().init(),
        (true, false) => subscriber.without_time().json().init(),
        (false, true) => subscriber.init(),
        (false, false) => subscriber.without_time().init(),
    }

    debug!(
        "Logging initialized: level={}, json={}, timestamps={}",
        log_level, cli.json_logs, cli.timestamps
    );

    Ok(())
}
