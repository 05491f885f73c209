//! Error categorization.
//!
//! Maps relay errors onto the counted `ErrorType` categories and onto the HTTP
//! status the relay answers with.

use axum::http::StatusCode;

use super::stats::ProcessingStats;
use super::types::{ErrorType, PollError, SubmissionError, UpstreamError};

/// Categorizes a submission failure.
pub fn categorize_submission_error(error: &SubmissionError) -> ErrorType {
    match error {
        SubmissionError::EmptyPayload => ErrorType::SubmissionEmptyPayload,
        SubmissionError::Staging(_) => ErrorType::SubmissionStagingError,
        SubmissionError::Rejected { .. } => ErrorType::SubmissionRejected,
        SubmissionError::MissingHandle => ErrorType::SubmissionMissingHandle,
        SubmissionError::Upstream(_) => ErrorType::SubmissionTransportError,
    }
}

/// Categorizes a poll failure.
pub fn categorize_poll_error(error: &PollError) -> ErrorType {
    match error {
        PollError::Timeout { .. } => ErrorType::PollTimeout,
        PollError::Interrupted { .. } => ErrorType::PollInterrupted,
        PollError::Transport { source, .. } => match source {
            UpstreamError::Status { .. } => ErrorType::PollHttpStatusError,
            UpstreamError::Decode(_) => ErrorType::PollDecodeError,
            UpstreamError::Transport(_) | UpstreamError::InvalidEndpoint(_) => {
                ErrorType::PollTransportError
            }
        },
    }
}

/// HTTP status the upload endpoint answers with for a submission failure.
pub fn submission_status_code(error: &SubmissionError) -> StatusCode {
    match error {
        SubmissionError::EmptyPayload => StatusCode::BAD_REQUEST,
        SubmissionError::Upstream(UpstreamError::Transport(_)) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status the result endpoint answers with for a poll failure.
pub fn poll_status_code(error: &PollError) -> StatusCode {
    match error {
        PollError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PollError::Transport { .. } => StatusCode::BAD_GATEWAY,
        PollError::Interrupted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Records a submission failure in `stats`.
pub fn record_submission_error(stats: &ProcessingStats, error: &SubmissionError) {
    stats.increment_error(categorize_submission_error(error));
}

/// Records a poll failure in `stats`.
pub fn record_poll_error(stats: &ProcessingStats, error: &PollError) {
    stats.increment_error(categorize_poll_error(error));
}
