//! Error handling and relay statistics.
//!
//! This module provides:
//! - Error type definitions for submission, polling, and initialization
//! - Relay statistics tracking (errors, warnings, info metrics)
//! - Mapping from errors to counted categories and HTTP status codes
//!
//! Counted categories are split into:
//! - **Errors**: Failures returned to a caller
//! - **Warnings**: Suspicious but non-fatal observations
//! - **Info**: Notable events (submissions, coalesced polls, verdicts)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_poll_error, categorize_submission_error, poll_status_code, record_poll_error,
    record_submission_error, submission_status_code,
};
pub use stats::ProcessingStats;
pub use types::{
    ClientError, ErrorType, InfoType, InitializationError, PollError, SubmissionError,
    UpstreamError, WarningType,
};
