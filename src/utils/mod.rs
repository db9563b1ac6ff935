//! # Utility Modules
//!
//! Supporting utilities shared across the crate.
//!
//! ## Components
//! - **Logging**: Structured logging setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe codec counters

pub mod logging;
pub mod metrics;

pub use metrics::{global_metrics, CodecMetrics, MetricsSnapshot};
