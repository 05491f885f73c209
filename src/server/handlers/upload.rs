//! Upload-and-submit handler.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::Json;

use super::super::types::{ApiError, AppState};
use crate::config::{DEFAULT_UPLOAD_NAME, UPLOAD_FIELD};
use crate::error_handling::{record_submission_error, submission_status_code, ErrorType, InfoType};
use crate::models::UploadAccepted;

/// `POST /scan-file/`: stages the `file` part and submits it upstream.
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadAccepted>, ApiError> {
    let (file_name, payload) = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart).await,
        Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
    }
    .inspect_err(|e| {
        log::warn!("Rejected upload request: {}", e.detail);
        state.stats.increment_error(ErrorType::InvalidUpload);
    })?;

    match state.relay.submit(&file_name, payload).await {
        Ok(handle) => {
            state.stats.increment_info(InfoType::FileSubmitted);
            Ok(Json(UploadAccepted::new(handle)))
        }
        Err(e) => {
            log::error!("Submission of {} failed: {}", file_name, e);
            record_submission_error(&state.stats, &e);
            Err(ApiError::new(submission_status_code(&e), e.to_string()))
        }
    }
}

/// Returns the client file name and bytes of the first `file` part.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let payload = field.bytes().await.map_err(multipart_error)?;
        return Ok((file_name, payload));
    }
    Err(ApiError::bad_request(format!(
        "No file provided (expected multipart field `{}`)",
        UPLOAD_FIELD
    )))
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}
