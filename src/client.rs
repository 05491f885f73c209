//! The `scan` client: uploads a file to a running relay, waits for the result,
//! and renders it for a terminal.

use std::path::Path;
use std::time::Duration;

use colored::*;
use reqwest::multipart::{Form, Part};
use reqwest::{ClientBuilder, Response};
use url::Url;

use crate::config::{ScanArgs, DEFAULT_UPLOAD_NAME, TCP_CONNECT_TIMEOUT_SECS, UPLOAD_FIELD};
use crate::error_handling::ClientError;
use crate::models::{is_clean_category, ErrorDetail, ScanHandle, ScanSummary, UploadAccepted};

/// HTTP client for the relay's upload and result endpoints.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RelayClient {
    /// Creates a client for the relay at `server`.
    ///
    /// `timeout` bounds each request, including the blocking result call.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(server)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidServerUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Uploads `payload` and returns the relay's `file_id`.
    pub async fn upload(&self, file_name: &str, payload: Vec<u8>) -> Result<ScanHandle, ClientError> {
        let form = Form::new().part(
            UPLOAD_FIELD,
            Part::bytes(payload).file_name(file_name.to_string()),
        );
        let response = self
            .client
            .post(self.endpoint(&["scan-file", ""]))
            .multipart(form)
            .send()
            .await?;
        let accepted: UploadAccepted = check_status(response).await?.json().await?;
        Ok(accepted.file_id)
    }

    /// Waits for the analysis of `handle` and returns its summary.
    pub async fn result(&self, handle: &ScanHandle) -> Result<ScanSummary, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["get-result", handle.as_str()]))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorDetail>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    Err(ClientError::Relay {
        status: status.as_u16(),
        detail,
    })
}

/// Uploads `args.file` to the relay and waits for its summary.
///
/// Progress goes to stderr so stdout only carries the rendered result.
pub async fn run_scan(args: &ScanArgs) -> Result<ScanSummary, ClientError> {
    let payload = tokio::fs::read(&args.file)
        .await
        .map_err(|source| ClientError::ReadFile {
            path: args.file.display().to_string(),
            source,
        })?;
    let file_name = upload_name(&args.file);
    let client = RelayClient::new(&args.server, Duration::from_secs(args.timeout_seconds))?;

    eprintln!(
        "{}",
        format!("⏳ Uploading {} ({} bytes)...", file_name, payload.len()).dimmed()
    );
    let handle = client.upload(&file_name, payload).await?;

    eprintln!(
        "{}",
        format!("⏳ Waiting for analysis {}...", handle).dimmed()
    );
    client.result(&handle).await
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_UPLOAD_NAME)
        .to_string()
}

/// Renders stats, engine verdicts and a safe/unsafe badge.
pub fn render_summary(summary: &ScanSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Scan statistics".bold()));
    for (category, count) in &summary.stats {
        out.push_str(&format!("  {:<20} {}\n", category, count));
    }

    out.push_str(&format!("\n{}\n", "Engine verdicts".bold()));
    if summary.detailed_results.is_empty() {
        out.push_str(&format!("  {}\n", "(no selected engine reported)".dimmed()));
    }
    for (engine, category) in &summary.detailed_results {
        let category = if is_clean_category(category) {
            category.green()
        } else {
            category.red()
        };
        out.push_str(&format!("  {:<20} {}\n", engine, category));
    }

    let badge = if summary.safe {
        "✅ SAFE".green().bold()
    } else {
        "❌ UNSAFE".red().bold()
    };
    out.push_str(&format!("\n{}\n", badge));
    out
}
