//! JSON status handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::types::{AppState, ErrorCounts, InfoCounts, StatusResponse, WarningCounts};
use crate::error_handling::{ErrorType, InfoType, WarningType};

/// JSON status endpoint with relay counters
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let stats = &state.stats;

    let response = StatusResponse {
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        in_flight_polls: state.polls.in_flight(),
        errors: ErrorCounts {
            total: stats.total_errors(),
            invalid_upload: stats.get_error_count(ErrorType::InvalidUpload)
                + stats.get_error_count(ErrorType::SubmissionEmptyPayload),
            submission_rejected: stats.get_error_count(ErrorType::SubmissionRejected),
            submission_other: stats.get_error_count(ErrorType::SubmissionStagingError)
                + stats.get_error_count(ErrorType::SubmissionMissingHandle)
                + stats.get_error_count(ErrorType::SubmissionTransportError),
            poll_timeout: stats.get_error_count(ErrorType::PollTimeout),
            poll_upstream: stats.get_error_count(ErrorType::PollTransportError)
                + stats.get_error_count(ErrorType::PollHttpStatusError)
                + stats.get_error_count(ErrorType::PollDecodeError),
            poll_interrupted: stats.get_error_count(ErrorType::PollInterrupted),
        },
        warnings: WarningCounts {
            total: stats.total_warnings(),
            unknown_analysis_status: stats.get_warning_count(WarningType::UnknownAnalysisStatus),
            empty_verdict_set: stats.get_warning_count(WarningType::EmptyVerdictSet),
        },
        info: InfoCounts {
            total: stats.total_info(),
            files_submitted: stats.get_info_count(InfoType::FileSubmitted),
            polls_started: stats.get_info_count(InfoType::PollStarted),
            polls_coalesced: stats.get_info_count(InfoType::PollCoalesced),
            scans_safe: stats.get_info_count(InfoType::ScanSafe),
            scans_unsafe: stats.get_info_count(InfoType::ScanUnsafe),
        },
    };

    let json = match serde_json::to_string_pretty(&response) {
        Ok(json) => json,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialize status: {}", e),
            )
                .into_response();
        }
    };

    (StatusCode::OK, [("content-type", "application/json")], json).into_response()
}
