//! Relay server HTTP handlers.

mod metrics;
mod result;
mod status;
mod upload;

pub use metrics::metrics_handler;
pub use result::result_handler;
pub use status::status_handler;
pub use upload::upload_handler;
