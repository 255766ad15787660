//! Telemetry for the output validation engine
//!
//! Prometheus counters and histograms for verdicts, structural error kinds
//! and semantic paths. Logging goes through `tracing` directly; this module
//! never installs a subscriber.

pub mod metrics;

pub use metrics::{EngineMetrics, ValidationTimer};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
