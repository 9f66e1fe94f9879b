//! Observability
//!
//! Structured logging and Prometheus metrics.

mod logging;
pub mod metrics;

pub use logging::{LOG_FORMATS, env_filter, init_tracing};
pub use metrics::{MetricsError, init_metrics};
