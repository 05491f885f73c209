//! scan_relay library: relay file uploads to VirusTotal and summarize the verdicts
//!
//! The relay exposes two endpoints: one accepts a file upload and submits it to
//! the upstream scanning API, the other polls the upstream until the analysis
//! completes and returns a summary restricted to a fixed set of engines.
//!
//! # Example
//!
//! ```no_run
//! use scan_relay::config::ApiKey;
//! use scan_relay::{run_server, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), anyhow::Error> {
//! let config = Config {
//!     api_key: ApiKey::from_env()?,
//!     ..Default::default()
//! };
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod client;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod models;
pub mod poll;
pub mod server;
pub mod submit;
pub mod upstream;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use models::{EngineAllowList, ScanHandle, ScanSummary};
pub use run::{build_state, run_server, run_server_on};

mod run {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;

    use crate::app::{
        log_category_breakdown, log_relay_counters, shutdown_gracefully, spawn_counter_logging,
        wait_for_shutdown_signal,
    };
    use crate::config::{Config, STATUS_LOGGING_INTERVAL_SECS};
    use crate::error_handling::ProcessingStats;
    use crate::initialization::{init_scan_service, init_staging_dir};
    use crate::poll::{Poller, SingleFlight};
    use crate::server::{router, start_server, AppState};
    use crate::submit::SubmissionRelay;

    /// Validates `config` and builds the shared server state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the staging directory
    /// cannot be prepared, or the upstream client cannot be built.
    pub fn build_state(config: &Config) -> Result<AppState> {
        config.validate().context("Invalid configuration")?;
        init_staging_dir(&config.staging_dir).context("Failed to prepare staging directory")?;
        let service = init_scan_service(config).context("Failed to initialize upstream client")?;

        let stats = Arc::new(ProcessingStats::new());
        let relay = SubmissionRelay::new(Arc::clone(&service), config.staging_dir.clone());
        let poller = Poller::new(
            service,
            Arc::new(config.engines.clone()),
            config.poll,
            Arc::clone(&stats),
        );
        let polls = SingleFlight::new(poller, Arc::clone(&stats));

        log::debug!("Relay configuration: {:?}", config);
        Ok(AppState::new(relay, polls, stats))
    }

    /// Runs the relay on `config.bind_addr` until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails, the address cannot be bound,
    /// or the server stops abnormally.
    pub async fn run_server(config: Config) -> Result<()> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind relay server to {}", config.bind_addr))?;

        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            signal_cancel.cancel();
        });

        run_server_on(listener, config, cancel).await
    }

    /// Runs the relay on an already bound `listener` until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails or the server stops abnormally.
    pub async fn run_server_on(
        listener: TcpListener,
        config: Config,
        cancel: CancellationToken,
    ) -> Result<()> {
        let state = build_state(&config)?;
        log::info!(
            "Relaying to {} for engines [{}], polling up to {} times",
            config.upstream_url,
            config.engines.iter().collect::<Vec<_>>().join(", "),
            config.poll.max_attempts
        );

        let logging_task = spawn_counter_logging(
            Arc::clone(&state.stats),
            *state.start_time,
            Duration::from_secs(STATUS_LOGGING_INTERVAL_SECS),
            cancel.child_token(),
        );
        let start_time: Instant = *state.start_time;
        let stats = Arc::clone(&state.stats);

        let app = router(state, config.max_upload_bytes);
        let served = start_server(listener, app, cancel.clone()).await;

        shutdown_gracefully(cancel, Some(logging_task)).await;
        log_relay_counters(start_time, &stats);
        log_category_breakdown(&stats);
        served
    }
}
