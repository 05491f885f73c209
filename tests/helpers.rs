// Shared test helpers for starting a relay against a mock upstream.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::time::Duration;

use httptest::Server;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use scan_relay::config::ApiKey;
use scan_relay::poll::{Backoff, PollPolicy};
use scan_relay::{run_server_on, Config};

/// API key the relay sends upstream in tests.
#[allow(dead_code)]
pub const TEST_API_KEY: &str = "test-key";

/// A relay running on an ephemeral port.
#[allow(dead_code)] // Used by other test files
pub struct TestRelay {
    pub base_url: String,
    pub staging: TempDir,
    cancel: CancellationToken,
    task: JoinHandle<anyhow::Result<()>>,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Number of files left in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path())
            .expect("staging dir should exist")
            .count()
    }

    /// Stops the relay and waits for it to exit cleanly.
    pub async fn stop(self) {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("relay should stop after cancel")
            .expect("relay task should not panic")
            .expect("relay should exit without error");
    }
}

/// Poll policy with millisecond delays.
#[allow(dead_code)]
pub fn fast_poll(interval_ms: u64, max_attempts: usize) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(interval_ms),
        max_attempts,
        backoff: Backoff::Fixed,
    }
}

/// Starts a relay whose upstream is `upstream` (rooted at `/api/v3`).
#[allow(dead_code)]
pub async fn start_relay(upstream: &Server, poll: PollPolicy) -> TestRelay {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let config = Config {
        api_key: ApiKey::new(TEST_API_KEY),
        upstream_url: upstream.url_str("/api/v3"),
        poll,
        timeout_seconds: 10,
        staging_dir: staging.path().to_path_buf(),
        ..Default::default()
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_server_on(listener, config, cancel.clone()));

    TestRelay {
        base_url: format!("http://{}", addr),
        staging,
        cancel,
        task,
    }
}

/// Upstream body of `POST /files`.
#[allow(dead_code)]
pub fn upload_body(id: &str) -> Value {
    json!({"data": {"id": id, "type": "analysis"}})
}

/// Upstream body of a non-terminal `GET /analyses/{id}`.
#[allow(dead_code)]
pub fn analysis_status(status: &str) -> Value {
    json!({"data": {"attributes": {"status": status, "stats": {}, "results": {}}}})
}

/// Upstream body of a completed analysis with the given verdicts.
#[allow(dead_code)]
pub fn analysis_completed(verdicts: &[(&str, &str)]) -> Value {
    let results: serde_json::Map<String, Value> = verdicts
        .iter()
        .map(|(engine, category)| {
            (
                engine.to_string(),
                json!({"category": category, "engine_name": engine, "result": null}),
            )
        })
        .collect();
    json!({
        "data": {
            "type": "analysis",
            "attributes": {
                "status": "completed",
                "stats": {"malicious": 0, "undetected": 5},
                "results": results
            }
        }
    })
}
