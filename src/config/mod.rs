//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (poll cadence, timeouts, limits, etc.)
//! - The library `Config` and its validation
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::{BackoffKind, Cli, Command, ScanArgs, ServeArgs};
pub use constants::*;
pub use types::{ApiKey, Config, ConfigValidationError, LogFormat, LogLevel};
