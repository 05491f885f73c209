//! Scan submission relay.
//!
//! Stages an uploaded payload on disk, forwards it to the scanning service
//! once, and extracts the analysis handle from the response.

mod staging;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;

use crate::error_handling::SubmissionError;
use crate::models::ScanHandle;
use crate::upstream::ScanService;

pub use staging::{calculate_sha256, StagedUpload};

/// Forwards uploads to a `ScanService`.
#[derive(Clone)]
pub struct SubmissionRelay {
    service: Arc<dyn ScanService>,
    staging_dir: PathBuf,
}

impl SubmissionRelay {
    pub fn new(service: Arc<dyn ScanService>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            staging_dir: staging_dir.into(),
        }
    }

    /// Submits `payload` for analysis and returns its handle.
    ///
    /// The upstream is contacted at most once. The staged copy is removed before
    /// this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `EmptyPayload` if `payload` is empty (the upstream is not contacted)
    /// - `Staging` if the payload cannot be written to or read from disk
    /// - `Rejected` if the upstream answers with a non-success status
    /// - `MissingHandle` if a success response has no `data.id`
    /// - `Upstream` for transport or decode failures
    pub async fn submit(
        &self,
        file_name: &str,
        payload: Bytes,
    ) -> Result<ScanHandle, SubmissionError> {
        if payload.is_empty() {
            return Err(SubmissionError::EmptyPayload);
        }

        let staged =
            StagedUpload::stage(self.staging_dir.clone(), file_name.to_string(), payload).await?;
        log::info!(
            "Upload received: {} ({} bytes, sha256 {})",
            staged.file_name(),
            staged.size(),
            staged.sha256()
        );

        let result = self.forward(&staged).await;
        if let Err(e) = staged.cleanup() {
            log::debug!("Staged upload cleanup failed: {}", e);
        }
        result
    }

    async fn forward(&self, staged: &StagedUpload) -> Result<ScanHandle, SubmissionError> {
        let bytes = staged.read().await?;
        let response = self.service.upload(staged.file_name(), bytes).await?;

        let handle = response
            .analysis_id()
            .map(ScanHandle::new)
            .ok_or(SubmissionError::MissingHandle)?;
        log::info!("Submitted {} as analysis {}", staged.file_name(), handle);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::UpstreamError;
    use crate::upstream::{AnalysisResponse, UploadData, UploadResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers every upload with a fixed result and remembers what it saw.
    struct FixedUpload {
        response: Result<UploadResponse, UpstreamError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl FixedUpload {
        fn new(response: Result<UploadResponse, UpstreamError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ScanService for FixedUpload {
        async fn upload(
            &self,
            file_name: &str,
            payload: Vec<u8>,
        ) -> Result<UploadResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((file_name.to_string(), payload));
            self.response.clone()
        }

        async fn analysis(&self, _handle: &ScanHandle) -> Result<AnalysisResponse, UpstreamError> {
            unreachable!("submission never polls")
        }
    }

    fn with_id(id: &str) -> UploadResponse {
        UploadResponse {
            data: Some(UploadData {
                id: Some(id.to_string()),
                data_type: Some("analysis".to_string()),
            }),
        }
    }

    fn staged_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_submit_returns_handle_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let service = FixedUpload::new(Ok(with_id("abc==")));
        let relay = SubmissionRelay::new(service.clone(), dir.path());

        let handle = relay.submit("doc.pdf", Bytes::from_static(b"%PDF")).await.unwrap();

        assert_eq!(handle, ScanHandle::new("abc=="));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        let seen = service.seen.lock().unwrap();
        assert_eq!(seen[0], ("doc.pdf".to_string(), b"%PDF".to_vec()));
        assert_eq!(staged_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_submit_rejected_yields_error_not_handle() {
        let dir = TempDir::new().unwrap();
        let service = FixedUpload::new(Err(UpstreamError::Status {
            status: 403,
            body: "QuotaExceededError".to_string(),
        }));
        let relay = SubmissionRelay::new(service.clone(), dir.path());

        let err = relay.submit("doc.pdf", Bytes::from_static(b"%PDF")).await.unwrap_err();

        match err {
            SubmissionError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "QuotaExceededError");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 1, "no retry");
        assert_eq!(staged_files(&dir), 0, "staged file removed on failure");
    }

    #[tokio::test]
    async fn test_submit_missing_handle() {
        let dir = TempDir::new().unwrap();
        let service = FixedUpload::new(Ok(UploadResponse::default()));
        let relay = SubmissionRelay::new(service, dir.path());

        let err = relay.submit("doc.pdf", Bytes::from_static(b"%PDF")).await.unwrap_err();
        assert!(matches!(err, SubmissionError::MissingHandle));
        assert_eq!(staged_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_submit_empty_payload_skips_upstream() {
        let dir = TempDir::new().unwrap();
        let service = FixedUpload::new(Ok(with_id("never")));
        let relay = SubmissionRelay::new(service.clone(), dir.path());

        let err = relay.submit("empty.pdf", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::EmptyPayload));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_staging_failure() {
        let dir = TempDir::new().unwrap();
        let service = FixedUpload::new(Ok(with_id("never")));
        let relay = SubmissionRelay::new(service.clone(), dir.path().join("missing"));

        let err = relay.submit("doc.pdf", Bytes::from_static(b"%PDF")).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Staging(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }
}
