//! Analysis polling.
//!
//! `Poller` drives one bounded poll loop against a `ScanService`: exactly one
//! upstream query per iteration, a delay from the `PollPolicy` schedule between
//! iterations, and a `PollError::Timeout` once the budget is spent.
//! `SingleFlight` makes concurrent requests for the same handle share one loop.

mod policy;
mod single_flight;

use std::sync::Arc;

use crate::error_handling::{InfoType, PollError, ProcessingStats, UpstreamError, WarningType};
use crate::models::{EngineAllowList, ScanHandle, ScanSummary};
use crate::upstream::{AnalysisResponse, ScanService};

pub use policy::{Backoff, PollPolicy};
pub use single_flight::SingleFlight;

/// Polls analyses until they complete or the budget runs out.
#[derive(Clone)]
pub struct Poller {
    service: Arc<dyn ScanService>,
    engines: Arc<EngineAllowList>,
    policy: PollPolicy,
    stats: Arc<ProcessingStats>,
}

impl Poller {
    pub fn new(
        service: Arc<dyn ScanService>,
        engines: Arc<EngineAllowList>,
        policy: PollPolicy,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            service,
            engines,
            policy,
            stats,
        }
    }

    /// Waits for `handle` to complete and summarizes its verdicts.
    ///
    /// Only an exact `completed` status ends the loop successfully. Queued,
    /// in-progress, unknown and missing statuses all keep polling.
    ///
    /// # Errors
    ///
    /// - `PollError::Transport` on the first failed query (transport error,
    ///   non-success status, undecodable body, or a completed analysis without
    ///   `stats`/`results`). Failed queries are not retried.
    /// - `PollError::Timeout` after `max_attempts` non-completed queries.
    pub async fn poll(&self, handle: &ScanHandle) -> Result<ScanSummary, PollError> {
        self.stats.increment_info(InfoType::PollStarted);
        log::debug!(
            "Polling analysis {} (up to {} queries)",
            handle,
            self.policy.max_attempts
        );

        let mut delays = self.policy.delays();
        let mut attempts = 0usize;
        let mut warned_unrecognized = false;

        loop {
            attempts += 1;
            let response = self
                .service
                .analysis(handle)
                .await
                .map_err(|source| PollError::Transport {
                    handle: handle.clone(),
                    source,
                })?;

            let status = response.status();
            if status.is_completed() {
                log::debug!("Analysis {} completed after {} queries", handle, attempts);
                return self.summarize(handle, &response);
            }

            if status.is_unrecognized() && !warned_unrecognized {
                log::warn!(
                    "Analysis {} reported unrecognized status '{}', still polling",
                    handle,
                    status.as_str()
                );
                self.stats
                    .increment_warning(WarningType::UnknownAnalysisStatus);
                warned_unrecognized = true;
            }

            match delays.next() {
                Some(delay) => {
                    log::debug!(
                        "Analysis {} is {} (query {}), next query in {:?}",
                        handle,
                        status.as_str(),
                        attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    log::warn!(
                        "Giving up on analysis {} after {} queries (last status '{}')",
                        handle,
                        attempts,
                        status.as_str()
                    );
                    return Err(PollError::Timeout {
                        handle: handle.clone(),
                        attempts,
                    });
                }
            }
        }
    }

    fn summarize(
        &self,
        handle: &ScanHandle,
        response: &AnalysisResponse,
    ) -> Result<ScanSummary, PollError> {
        let decode_error = |what: &str| PollError::Transport {
            handle: handle.clone(),
            source: UpstreamError::Decode(format!("completed analysis has no `{}`", what)),
        };

        let attributes = response.attributes().ok_or_else(|| decode_error("attributes"))?;
        let stats = attributes.stats.clone().ok_or_else(|| decode_error("stats"))?;
        let results = attributes
            .results
            .as_ref()
            .ok_or_else(|| decode_error("results"))?;

        let summary = ScanSummary::from_results(stats, results, &self.engines).map_err(|engine| {
            PollError::Transport {
                handle: handle.clone(),
                source: UpstreamError::Decode(format!(
                    "engine `{}` reported without a category",
                    engine
                )),
            }
        })?;

        if summary.detailed_results.is_empty() {
            log::warn!(
                "None of the {} allow-listed engines reported on analysis {}; verdict is vacuously safe",
                self.engines.len(),
                handle
            );
            self.stats.increment_warning(WarningType::EmptyVerdictSet);
        }

        if summary.safe {
            self.stats.increment_info(InfoType::ScanSafe);
        } else {
            self.stats.increment_info(InfoType::ScanUnsafe);
        }
        log::info!(
            "Analysis {}: {} ({} engine verdicts)",
            handle,
            if summary.safe { "safe" } else { "unsafe" },
            summary.detailed_results.len()
        );

        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted `ScanService` for poll tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error_handling::UpstreamError;
    use crate::models::ScanHandle;
    use crate::upstream::{AnalysisResponse, ScanService, UploadResponse};

    /// Replays analysis responses in order; the last one repeats forever.
    pub struct ScriptedAnalyses {
        script: Mutex<VecDeque<Result<AnalysisResponse, UpstreamError>>>,
        queries: AtomicUsize,
    }

    impl ScriptedAnalyses {
        pub fn new(script: Vec<Result<AnalysisResponse, UpstreamError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                queries: AtomicUsize::new(0),
            }
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScanService for ScriptedAnalyses {
        async fn upload(
            &self,
            _file_name: &str,
            _payload: Vec<u8>,
        ) -> Result<UploadResponse, UpstreamError> {
            unreachable!("polling never uploads")
        }

        async fn analysis(&self, _handle: &ScanHandle) -> Result<AnalysisResponse, UpstreamError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    pub fn status(status: &str) -> AnalysisResponse {
        serde_json::from_value(json!({"data": {"attributes": {"status": status}}})).unwrap()
    }

    pub fn completed(verdicts: &[(&str, &str)]) -> AnalysisResponse {
        let results: serde_json::Map<String, serde_json::Value> = verdicts
            .iter()
            .map(|(engine, category)| {
                (
                    engine.to_string(),
                    json!({"category": category, "engine_name": engine}),
                )
            })
            .collect();
        serde_json::from_value(json!({
            "data": {"attributes": {
                "status": "completed",
                "stats": {"malicious": 1, "undetected": 60, "timeout": 1},
                "results": results
            }}
        }))
        .unwrap()
    }
}
