//! Observability module
//!
//! Logging and metrics for configuration loads.

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
