//! Periodic relay counter logging.

use log::info;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};

/// Logs a one-line summary of the relay counters.
pub fn log_relay_counters(start_time: Instant, stats: &ProcessingStats) {
    info!(
        "Up {:.0}s: {} files submitted, {} polls ({} coalesced), {} safe / {} unsafe, {} errors, {} warnings",
        start_time.elapsed().as_secs_f64(),
        stats.get_info_count(InfoType::FileSubmitted),
        stats.get_info_count(InfoType::PollStarted),
        stats.get_info_count(InfoType::PollCoalesced),
        stats.get_info_count(InfoType::ScanSafe),
        stats.get_info_count(InfoType::ScanUnsafe),
        stats.total_errors(),
        stats.total_warnings()
    );
}

/// Logs every non-zero error, warning and info category.
pub fn log_category_breakdown(stats: &ProcessingStats) {
    for line in category_breakdown(stats) {
        info!("{}", line);
    }
}

fn category_breakdown(stats: &ProcessingStats) -> Vec<String> {
    let mut lines = Vec::new();

    let total_errors = stats.total_errors();
    if total_errors > 0 {
        lines.push(format!("Error counts ({} total):", total_errors));
        for error_type in ErrorType::iter() {
            let count = stats.get_error_count(error_type);
            if count > 0 {
                lines.push(format!("   {}: {}", error_type.as_str(), count));
            }
        }
    }

    let total_warnings = stats.total_warnings();
    if total_warnings > 0 {
        lines.push(format!("Warning counts ({} total):", total_warnings));
        for warning_type in WarningType::iter() {
            let count = stats.get_warning_count(warning_type);
            if count > 0 {
                lines.push(format!("   {}: {}", warning_type.as_str(), count));
            }
        }
    }

    let total_info = stats.total_info();
    if total_info > 0 {
        lines.push(format!("Info counts ({} total):", total_info));
        for info_type in InfoType::iter() {
            let count = stats.get_info_count(info_type);
            if count > 0 {
                lines.push(format!("   {}: {}", info_type.as_str(), count));
            }
        }
    }

    lines
}

/// Spawns a task that logs the relay counters every `interval` until `cancel` fires.
pub fn spawn_counter_logging(
    stats: Arc<ProcessingStats>,
    start_time: Instant,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => log_relay_counters(start_time, &stats),
            }
        }
    })
}
