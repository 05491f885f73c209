//! Server lifecycle helpers.
//!
//! This module provides signal-driven shutdown and the periodic counter log
//! used while the relay server runs.

pub mod logging;
pub mod shutdown;

// Re-export public API
pub use logging::{log_category_breakdown, log_relay_counters, spawn_counter_logging};
pub use shutdown::{shutdown_gracefully, wait_for_shutdown_signal};
