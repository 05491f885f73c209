//! Prometheus metrics handler.

use std::fmt::Write;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use strum::IntoEnumIterator;

use super::super::types::AppState;
use crate::error_handling::{ErrorType, InfoType, WarningType};

/// Prometheus-compatible metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let stats = &state.stats;

    let mut metrics = format!(
        r#"# HELP scan_relay_uptime_seconds Seconds since the relay started
# TYPE scan_relay_uptime_seconds gauge
scan_relay_uptime_seconds {}

# HELP scan_relay_in_flight_polls Analyses with a poll loop currently running
# TYPE scan_relay_in_flight_polls gauge
scan_relay_in_flight_polls {}

# HELP scan_relay_errors_total Total number of errors returned to callers
# TYPE scan_relay_errors_total counter
scan_relay_errors_total {}

# HELP scan_relay_warnings_total Total number of warnings encountered
# TYPE scan_relay_warnings_total counter
scan_relay_warnings_total {}

# HELP scan_relay_info_total Total number of info events
# TYPE scan_relay_info_total counter
scan_relay_info_total {}

# HELP scan_relay_events_total Relay events by kind and category
# TYPE scan_relay_events_total counter
"#,
        state.start_time.elapsed().as_secs_f64(),
        state.polls.in_flight(),
        stats.total_errors(),
        stats.total_warnings(),
        stats.total_info()
    );

    // Writing into a String cannot fail.
    for error in ErrorType::iter() {
        let _ = writeln!(
            metrics,
            "scan_relay_events_total{{kind=\"error\",category=\"{:?}\"}} {}",
            error,
            stats.get_error_count(error)
        );
    }
    for warning in WarningType::iter() {
        let _ = writeln!(
            metrics,
            "scan_relay_events_total{{kind=\"warning\",category=\"{:?}\"}} {}",
            warning,
            stats.get_warning_count(warning)
        );
    }
    for info in InfoType::iter() {
        let _ = writeln!(
            metrics,
            "scan_relay_events_total{{kind=\"info\",category=\"{:?}\"}} {}",
            info,
            stats.get_info_count(info)
        );
    }

    (StatusCode::OK, metrics).into_response()
}
