//! Relay server data structures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error_handling::ProcessingStats;
use crate::models::ErrorDetail;
use crate::poll::SingleFlight;
use crate::submit::SubmissionRelay;

/// Shared state for the relay server
#[derive(Clone)]
pub struct AppState {
    pub relay: SubmissionRelay,
    pub polls: SingleFlight,
    pub stats: Arc<ProcessingStats>,
    pub start_time: Arc<Instant>,
}

impl AppState {
    pub fn new(relay: SubmissionRelay, polls: SingleFlight, stats: Arc<ProcessingStats>) -> Self {
        Self {
            relay,
            polls,
            stats,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// An error answer: a status code and a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorDetail {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

/// JSON response for `/status` endpoint
#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_seconds: f64,
    pub in_flight_polls: usize,
    pub errors: ErrorCounts,
    pub warnings: WarningCounts,
    pub info: InfoCounts,
}

#[derive(Serialize)]
pub struct ErrorCounts {
    pub total: usize,
    pub invalid_upload: usize,
    pub submission_rejected: usize,
    pub submission_other: usize,
    pub poll_timeout: usize,
    pub poll_upstream: usize,
    pub poll_interrupted: usize,
}

#[derive(Serialize)]
pub struct WarningCounts {
    pub total: usize,
    pub unknown_analysis_status: usize,
    pub empty_verdict_set: usize,
}

#[derive(Serialize)]
pub struct InfoCounts {
    pub total: usize,
    pub files_submitted: usize,
    pub polls_started: usize,
    pub polls_coalesced: usize,
    pub scans_safe: usize,
    pub scans_unsafe: usize,
}
