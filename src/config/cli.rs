//! Command-line options.
//!
//! The binary exposes two subcommands:
//! - `serve` runs the relay HTTP server
//! - `scan` uploads a file to a running relay and prints the verdict

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_UPSTREAM_URL, HTTP_TIMEOUT_SECS, MAX_UPLOAD_BYTES,
    POLL_INTERVAL, POLL_MAX_ATTEMPTS, POLL_MAX_DELAY_SECS,
};
use crate::config::types::{ApiKey, Config, LogFormat, LogLevel};
use crate::models::EngineAllowList;
use crate::poll::{Backoff, PollPolicy};

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(name = "scan_relay", version, about = "Relay file scans to VirusTotal")]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the relay HTTP server
    Serve(ServeArgs),
    /// Upload a file to a running relay and print the scan summary
    Scan(ScanArgs),
}

/// Backoff shape between analysis queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackoffKind {
    /// Same delay before every query
    Fixed,
    /// Delay doubles up to a cap
    Exponential,
}

/// Options for `serve`.
#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// Base URL of the upstream scanning API
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    /// Comma-separated engine names to report (default: Microsoft,Bitdefender,Kaspersky,McAfee,Sophos)
    #[arg(long, value_delimiter = ',')]
    pub engines: Option<Vec<String>>,

    /// Seconds between analysis queries
    #[arg(long, default_value_t = POLL_INTERVAL.as_secs())]
    pub poll_interval_secs: u64,

    /// Maximum analysis queries per scan before giving up
    #[arg(long, default_value_t = POLL_MAX_ATTEMPTS)]
    pub poll_max_attempts: usize,

    /// Backoff between analysis queries
    #[arg(long, value_enum, default_value_t = BackoffKind::Fixed)]
    pub backoff: BackoffKind,

    /// Per-request timeout for upstream calls in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Directory for staged uploads (default: system temp dir)
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    #[arg(long, default_value_t = MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServeArgs {
    /// Builds the library `Config`. The caller validates the result.
    pub fn into_config(self, api_key: ApiKey) -> Config {
        let engines = match self.engines {
            Some(names) => EngineAllowList::new(names),
            None => EngineAllowList::default(),
        };
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: Duration::from_secs(POLL_MAX_DELAY_SECS),
            },
        };

        Config {
            bind_addr: self.bind,
            upstream_url: self.upstream_url,
            api_key,
            engines,
            poll: PollPolicy {
                interval: Duration::from_secs(self.poll_interval_secs),
                max_attempts: self.poll_max_attempts,
                backoff,
            },
            timeout_seconds: self.timeout_seconds,
            staging_dir: self.staging_dir.unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Options for `scan`.
#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// File to scan
    pub file: PathBuf,

    /// Base URL of a running relay
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub server: String,

    /// Overall timeout for each relay call in seconds (the result call blocks until the scan ends)
    #[arg(long, default_value_t = 600)]
    pub timeout_seconds: u64,
}
