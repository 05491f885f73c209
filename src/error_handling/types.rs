//! Error type definitions.
//!
//! This module defines the relay's error enums and the error, warning, and info
//! categories counted by `ProcessingStats`.

use std::sync::Arc;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::ScanHandle;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The upstream base URL could not be parsed.
    #[error("Upstream URL error: {0}")]
    UpstreamUrlError(#[from] url::ParseError),

    /// The staging directory is missing or not writable.
    #[error("Staging directory error: {0}")]
    StagingDirError(String),
}

/// A failed exchange with the upstream scanning API.
///
/// `Clone` so a single poll outcome can be handed to every waiter.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request to upstream failed: {0}")]
    Transport(#[source] Arc<ReqwestError>),

    /// The upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The body was not the JSON shape we expect.
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),

    /// An endpoint URL could not be built from the base URL.
    #[error("invalid upstream endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<ReqwestError> for UpstreamError {
    fn from(e: ReqwestError) -> Self {
        if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else {
            UpstreamError::Transport(Arc::new(e))
        }
    }
}

/// Failure to hand a payload to the upstream.
///
/// The upstream is contacted at most once per submission, so none of these are
/// retried.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// Nothing to scan.
    #[error("Uploaded file is empty")]
    EmptyPayload,

    /// Writing or reading the staged copy failed.
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    /// The upstream rejected the upload.
    #[error("Error scanning file: {body} (HTTP {status})")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Raw error text from the upstream
        body: String,
    },

    /// A success response without `data.id`.
    #[error("Failed to retrieve file scan ID")]
    MissingHandle,

    /// Transport or decode failure talking to the upstream.
    #[error("Error scanning file: {0}")]
    Upstream(#[source] UpstreamError),
}

impl From<UpstreamError> for SubmissionError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, body } => SubmissionError::Rejected { status, body },
            other => SubmissionError::Upstream(other),
        }
    }
}

/// Failure to obtain a completed analysis.
#[derive(Error, Debug, Clone)]
pub enum PollError {
    /// A query failed or returned something unusable. Fatal for the poll loop.
    #[error("Failed to fetch analysis {handle}: {source}")]
    Transport {
        /// Analysis being polled
        handle: ScanHandle,
        /// Underlying upstream failure
        #[source]
        source: UpstreamError,
    },

    /// The retry budget ran out before the analysis completed.
    #[error("Analysis {handle} did not complete after {attempts} queries")]
    Timeout {
        /// Analysis being polled
        handle: ScanHandle,
        /// Queries issued before giving up
        attempts: usize,
    },

    /// The background poll task died before producing an outcome.
    #[error("Polling analysis {handle} was interrupted: {message}")]
    Interrupted {
        /// Analysis being polled
        handle: ScanHandle,
        /// Why the task ended
        message: String,
    },
}

/// Failure of the `scan` client talking to a relay.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The file to scan could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `--server` is not a usable base URL.
    #[error("Invalid relay URL: {0}")]
    InvalidServerUrl(#[from] url::ParseError),

    /// The relay could not be reached or its answer could not be read.
    #[error("Request to relay failed: {0}")]
    Http(#[from] ReqwestError),

    /// The relay answered with an error.
    #[error("Relay returned HTTP {status}: {detail}")]
    Relay {
        /// HTTP status code
        status: u16,
        /// The relay's `detail` message, or the raw body
        detail: String,
    },
}

/// Types of errors counted by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Upload handling
    InvalidUpload,
    SubmissionEmptyPayload,
    SubmissionStagingError,
    // Upstream submit
    SubmissionRejected,
    SubmissionMissingHandle,
    SubmissionTransportError,
    // Upstream poll
    PollTransportError,
    PollHttpStatusError,
    PollDecodeError,
    PollTimeout,
    PollInterrupted,
}

/// Types of warnings counted by the relay.
///
/// Warnings do not fail a request but deserve attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    UnknownAnalysisStatus, // status other than queued / in-progress / completed
    EmptyVerdictSet,       // no allow-listed engine reported, verdict is vacuously safe
}

/// Informational events counted by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    FileSubmitted,
    PollStarted,
    PollCoalesced, // joined an in-flight poll for the same handle
    ScanSafe,
    ScanUnsafe,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidUpload => "Invalid upload request",
            ErrorType::SubmissionEmptyPayload => "Empty upload",
            ErrorType::SubmissionStagingError => "Upload staging error",
            ErrorType::SubmissionRejected => "Upstream rejected upload",
            ErrorType::SubmissionMissingHandle => "Upstream returned no scan ID",
            ErrorType::SubmissionTransportError => "Upstream upload transport error",
            ErrorType::PollTransportError => "Upstream poll transport error",
            ErrorType::PollHttpStatusError => "Upstream poll HTTP error",
            ErrorType::PollDecodeError => "Upstream poll decode error",
            ErrorType::PollTimeout => "Analysis did not complete in time",
            ErrorType::PollInterrupted => "Poll task interrupted",
        }
    }
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::UnknownAnalysisStatus => "Unknown analysis status",
            WarningType::EmptyVerdictSet => "No allow-listed engine reported",
        }
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::FileSubmitted => "File submitted",
            InfoType::PollStarted => "Poll loop started",
            InfoType::PollCoalesced => "Poll joined in-flight loop",
            InfoType::ScanSafe => "Scan reported safe",
            InfoType::ScanUnsafe => "Scan reported unsafe",
        }
    }
}
