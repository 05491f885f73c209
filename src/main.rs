//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `scan_relay` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use scan_relay::client::{render_summary, run_scan};
use scan_relay::config::{ApiKey, Cli, Command};
use scan_relay::initialization::init_logger_with;
use scan_relay::run_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load VT_API_KEY and friends from .env in the current directory, falling
    // back to a .env next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    match cli.command {
        Command::Serve(args) => {
            let served = async move {
                let api_key = ApiKey::from_env().context("Missing upstream API key")?;
                run_server(args.into_config(api_key)).await
            }
            .await;
            if let Err(e) = served {
                eprintln!("scan_relay error: {:#}", e);
                process::exit(1);
            }
            Ok(())
        }
        Command::Scan(args) => match run_scan(&args).await {
            Ok(summary) => {
                print!("{}", render_summary(&summary));
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ Scan failed: {}", e);
                process::exit(1);
            }
        },
    }
}
