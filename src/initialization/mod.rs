//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources the relay
//! runs on:
//! - Logger
//! - HTTP client (with timeouts)
//! - Upstream scan service
//! - Staging directory

mod client;
mod logger;

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::upstream::{ScanService, VirusTotalClient};

pub use client::init_client;
pub use logger::init_logger_with;

/// Builds the upstream scan service from `config`.
///
/// # Errors
///
/// Returns `HttpClientError` if the HTTP client cannot be built, or
/// `UpstreamUrlError` if `config.upstream_url` does not parse.
pub fn init_scan_service(config: &Config) -> Result<Arc<dyn ScanService>, InitializationError> {
    let client = init_client(config)?;
    let service = VirusTotalClient::new(client, &config.upstream_url, config.api_key.clone())?;
    Ok(Arc::new(service))
}

/// Ensures the staging directory exists and is a directory.
///
/// # Errors
///
/// Returns `StagingDirError` if it cannot be created or is not a directory.
pub fn init_staging_dir(dir: &Path) -> Result<(), InitializationError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        InitializationError::StagingDirError(format!("{}: {}", dir.display(), e))
    })?;
    if !dir.is_dir() {
        return Err(InitializationError::StagingDirError(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}
