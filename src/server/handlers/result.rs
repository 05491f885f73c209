//! Poll-and-summarize handler.

use axum::extract::{Path, State};
use axum::Json;

use super::super::types::{ApiError, AppState};
use crate::error_handling::{poll_status_code, record_poll_error};
use crate::models::{ScanHandle, ScanSummary};

/// `GET /get-result/{file_id}`: waits for the analysis and returns its summary.
///
/// Concurrent requests for one `file_id` share a single upstream poll loop.
pub async fn result_handler(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ScanSummary>, ApiError> {
    let handle = ScanHandle::new(file_id);
    match state.polls.poll(handle.clone()).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            log::error!("Result for analysis {} failed: {}", handle, e);
            record_poll_error(&state.stats, &e);
            Err(ApiError::new(poll_status_code(&e), e.to_string()))
        }
    }
}
