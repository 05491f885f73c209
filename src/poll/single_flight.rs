//! One poll loop per analysis handle.
//!
//! The first request for a handle spawns the loop as a tokio task and parks a
//! shared future for it in the in-flight map; later requests for the same
//! handle await that future instead of starting their own loop. The task
//! removes its entry when it finishes, so nothing is cached past completion.
//! Because the loop runs in its own task, a caller that disconnects does not
//! cancel it for the others.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error_handling::{InfoType, PollError, ProcessingStats};
use crate::models::{ScanHandle, ScanSummary};

use super::Poller;

type SharedPoll = Shared<BoxFuture<'static, Result<ScanSummary, PollError>>>;
type InFlight = Arc<Mutex<HashMap<ScanHandle, SharedPoll>>>;

/// Coalesces concurrent polls of the same handle.
#[derive(Clone)]
pub struct SingleFlight {
    poller: Arc<Poller>,
    stats: Arc<ProcessingStats>,
    in_flight: InFlight,
}

impl SingleFlight {
    pub fn new(poller: Poller, stats: Arc<ProcessingStats>) -> Self {
        Self {
            poller: Arc::new(poller),
            stats,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of handles with a loop currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Polls `handle`, joining an in-flight loop for it if there is one.
    pub async fn poll(&self, handle: ScanHandle) -> Result<ScanSummary, PollError> {
        let shared = {
            let mut map = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match map.get(&handle) {
                Some(existing) => {
                    log::debug!("Joining in-flight poll for analysis {}", handle);
                    self.stats.increment_info(InfoType::PollCoalesced);
                    existing.clone()
                }
                None => {
                    // The map lock is held until the entry is inserted, so the
                    // task cannot remove it before it exists.
                    let shared = self.spawn_loop(handle.clone());
                    map.insert(handle, shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    fn spawn_loop(&self, handle: ScanHandle) -> SharedPoll {
        let poller = Arc::clone(&self.poller);
        let in_flight = Arc::clone(&self.in_flight);
        let key = handle.clone();

        let task = tokio::spawn(async move {
            let result = poller.poll(&key).await;
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    log::error!("Poll task for analysis {} failed: {}", handle, join_error);
                    Err(PollError::Interrupted {
                        handle,
                        message: join_error.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}
