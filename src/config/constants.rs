//! Configuration constants.
//!
//! This module defines the operational constants used throughout the relay,
//! including polling cadence, timeouts, size limits and upstream endpoints.

use std::time::Duration;

/// Environment variable holding the VirusTotal API key.
/// There is deliberately no fallback value; startup fails if it is unset.
pub const API_KEY_ENV: &str = "VT_API_KEY";

/// Header carrying the API key on every upstream request.
pub const API_KEY_HEADER: &str = "x-apikey";

/// Base URL of the VirusTotal v3 REST API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://www.virustotal.com/api/v3";

/// Default bind address for the relay HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Engines whose verdicts are surfaced when no `--engines` flag is given.
/// VirusTotal runs 70+ engines; a short list keeps the summary readable.
pub const DEFAULT_ENGINES: [&str; 5] = ["Microsoft", "Bitdefender", "Kaspersky", "McAfee", "Sophos"];

/// Categories that still count as a clean verdict.
pub const SAFE_CATEGORIES: [&str; 2] = ["undetected", "timeout"];

/// Status string the upstream reports once an analysis is finished.
pub const COMPLETED_STATUS: &str = "completed";

// Polling
/// Delay between two analysis queries (first delay for exponential backoff).
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Upper bound on analysis queries per poll loop (initial query included).
/// 100 queries at 3s spans roughly five minutes, well past typical scan times.
pub const POLL_MAX_ATTEMPTS: usize = 100;
/// Cap on a single delay when exponential backoff is selected.
pub const POLL_MAX_DELAY_SECS: u64 = 30;
/// Growth factor between consecutive delays for exponential backoff.
pub const POLL_BACKOFF_FACTOR: u64 = 2;

// Network operation timeouts
/// Per-request timeout for upstream calls in seconds.
/// Uploads of large files dominate this budget.
pub const HTTP_TIMEOUT_SECS: u64 = 120;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;

// Body size limits
/// Maximum accepted upload in bytes (32MB, the limit of the `/files` endpoint).
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Multipart field carrying the upload, both towards the relay and the upstream.
pub const UPLOAD_FIELD: &str = "file";

/// Message returned with a successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";

/// Fallback file name when the multipart part carries none.
pub const DEFAULT_UPLOAD_NAME: &str = "upload.bin";

/// Prefix for staged upload files.
pub const STAGING_FILE_PREFIX: &str = "scan-relay-";

/// Interval between periodic relay counter log lines, in seconds
pub const STATUS_LOGGING_INTERVAL_SECS: u64 = 60;
