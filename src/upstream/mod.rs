//! Client side of the upstream scanning API.
//!
//! `ScanService` is the seam between the relay and VirusTotal: the submission
//! relay and the poll loop only see the trait, `VirusTotalClient` implements it
//! over `reqwest`, and tests substitute scripted fakes.

mod types;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use url::Url;

use crate::config::{ApiKey, API_KEY_HEADER, UPLOAD_FIELD};
use crate::error_handling::UpstreamError;
use crate::models::ScanHandle;

pub use types::{
    AnalysisAttributes, AnalysisData, AnalysisResponse, AnalysisStatus, EngineResult, UploadData,
    UploadResponse,
};

/// Operations the relay needs from the scanning service.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Uploads one file for analysis. Called at most once per submission.
    async fn upload(&self, file_name: &str, payload: Vec<u8>)
        -> Result<UploadResponse, UpstreamError>;

    /// Fetches the current state of an analysis. One call is one upstream query.
    async fn analysis(&self, handle: &ScanHandle) -> Result<AnalysisResponse, UpstreamError>;
}

/// `ScanService` backed by the VirusTotal v3 REST API.
#[derive(Debug, Clone)]
pub struct VirusTotalClient {
    client: Arc<reqwest::Client>,
    base_url: Url,
    api_key: ApiKey,
}

impl VirusTotalClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a `url::ParseError` if `base_url` is not an absolute URL.
    pub fn new(
        client: Arc<reqwest::Client>,
        base_url: &str,
        api_key: ApiKey,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            api_key,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turns a non-success response into `UpstreamError::Status`, keeping the raw body text.
async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ScanService for VirusTotalClient {
    async fn upload(
        &self,
        file_name: &str,
        payload: Vec<u8>,
    ) -> Result<UploadResponse, UpstreamError> {
        let url = self.endpoint(&["files"])?;
        let form = Form::new().part(
            UPLOAD_FIELD,
            Part::bytes(payload).file_name(file_name.to_string()),
        );

        log::debug!("POST {} ({})", url, file_name);
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<UploadResponse>().await?)
    }

    async fn analysis(&self, handle: &ScanHandle) -> Result<AnalysisResponse, UpstreamError> {
        let url = self.endpoint(&["analyses", handle.as_str()])?;

        log::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<AnalysisResponse>().await?)
    }
}
