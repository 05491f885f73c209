//! HTTP relay server.
//!
//! Provides the relay endpoints:
//! - `POST /scan-file/` - upload a file and submit it for analysis
//! - `GET /get-result/{file_id}` - wait for the analysis and return its summary
//!
//! and the monitoring endpoints:
//! - `/metrics` - Prometheus-compatible metrics
//! - `/status` - JSON status endpoint with relay counters

mod handlers;
mod types;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use handlers::{metrics_handler, result_handler, status_handler, upload_handler};
pub use types::{ApiError, AppState, StatusResponse};

/// Builds the relay router.
///
/// `max_upload_bytes` bounds the request body of the upload endpoint.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/scan-file/", post(upload_handler))
        .route("/scan-file", post(upload_handler))
        .route("/get-result/:file_id", get(result_handler))
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Serves `router` on `listener` until `cancel` fires.
///
/// In-flight requests are allowed to finish after cancellation; no new
/// connections are accepted.
pub async fn start_server(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to read relay server address: {}", e))?;

    log::info!("Relay server listening on http://{}/", addr);
    log::info!("  - Upload: POST http://{}/scan-file/", addr);
    log::info!("  - Result: GET http://{}/get-result/{{file_id}}", addr);
    log::info!("  - Metrics: http://{}/metrics", addr);
    log::info!("  - Status: http://{}/status", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Relay server error: {}", e))?;

    log::info!("Relay server on {} stopped", addr);
    Ok(())
}
