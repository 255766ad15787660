//! Prometheus metrics for the output validation engine
//!
//! - `output_validation_verdicts_total` (counter) - verdicts by kind, level, result
//! - `output_validation_structural_errors_total` (counter) - errors by kind token
//! - `output_validation_semantic_outcomes_total` (counter) - which semantic path produced the result
//! - `output_validation_remote_duration_seconds` (histogram) - remote reasoning latency
//! - `output_validation_validation_duration_seconds` (histogram) - end-to-end latency by level
//! - `output_validation_active_validations` (gauge)
//!
//! # Example
//!
//! ```rust,no_run
//! use output_validation::telemetry::EngineMetrics;
//!
//! let metrics = EngineMetrics::new().unwrap();
//! metrics.record_verdict("summary", "standard", true);
//! println!("{}", metrics.gather_text().unwrap());
//! ```

use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};
use crate::contracts::ErrorKind;
use crate::engine::orchestrator::SemanticPath;

const NAMESPACE: &str = "output_validation";

/// Kinds with their own label value; anything else is counted as `other`
const KNOWN_KINDS: &[&str] = &["generic", "recommendation", "summary", "classification"];

/// Engine metrics registered into a Prometheus registry
pub struct EngineMetrics {
    registry: Arc<Registry>,
    verdicts_total: CounterVec,
    structural_errors_total: CounterVec,
    semantic_outcomes_total: CounterVec,
    remote_duration_seconds: Histogram,
    validation_duration_seconds: HistogramVec,
    active_validations: Gauge,
}

impl EngineMetrics {
    /// Create metrics in a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create metrics and register them with an existing registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let verdicts_total = CounterVec::new(
            Opts::new("verdicts_total", "Total number of validation verdicts")
                .namespace(NAMESPACE),
            &["kind", "level", "result"],
        )?;

        let structural_errors_total = CounterVec::new(
            Opts::new(
                "structural_errors_total",
                "Total number of structural errors by kind",
            )
            .namespace(NAMESPACE),
            &["error_kind"],
        )?;

        let semantic_outcomes_total = CounterVec::new(
            Opts::new(
                "semantic_outcomes_total",
                "Semantic validation results by the path that produced them",
            )
            .namespace(NAMESPACE),
            &["path"],
        )?;

        let remote_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "remote_duration_seconds",
                "Reasoning service call duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        )?;

        let validation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "validation_duration_seconds",
                "End-to-end validation duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 20.0]),
            &["level"],
        )?;

        let active_validations = Gauge::with_opts(
            Opts::new(
                "active_validations",
                "Number of validations currently in progress",
            )
            .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(verdicts_total.clone()))?;
        registry.register(Box::new(structural_errors_total.clone()))?;
        registry.register(Box::new(semantic_outcomes_total.clone()))?;
        registry.register(Box::new(remote_duration_seconds.clone()))?;
        registry.register(Box::new(validation_duration_seconds.clone()))?;
        registry.register(Box::new(active_validations.clone()))?;

        Ok(Self {
            registry,
            verdicts_total,
            structural_errors_total,
            semantic_outcomes_total,
            remote_duration_seconds,
            validation_duration_seconds,
            active_validations,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn record_verdict(&self, kind: &str, level: &str, valid: bool) {
        let result = if valid { "valid" } else { "invalid" };
        self.verdicts_total
            .with_label_values(&[kind_label(kind), level, result])
            .inc();
    }

    pub fn record_structural_error(&self, kind: ErrorKind) {
        self.structural_errors_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_semantic_path(&self, path: SemanticPath) {
        self.semantic_outcomes_total
            .with_label_values(&[path.as_str()])
            .inc();
    }

    pub fn observe_remote_duration(&self, duration_secs: f64) {
        self.remote_duration_seconds.observe(duration_secs);
    }

    /// Start a validation timer; records duration and active count on drop
    pub fn start_timer(&self, level: &str) -> ValidationTimer<'_> {
        self.active_validations.inc();
        ValidationTimer {
            start: Instant::now(),
            level: level.to_string(),
            metrics: self,
        }
    }

    /// Encode all metrics in the text exposition format
    pub fn gather_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encoding(e.to_string()))
    }
}

fn kind_label(kind: &str) -> &str {
    if KNOWN_KINDS.contains(&kind) {
        kind
    } else {
        "other"
    }
}

/// RAII guard for timing validations
pub struct ValidationTimer<'a> {
    start: Instant,
    level: String,
    metrics: &'a EngineMetrics,
}

impl ValidationTimer<'_> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for ValidationTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .validation_duration_seconds
            .with_label_values(&[self.level.as_str()])
            .observe(self.start.elapsed().as_secs_f64());
        self.metrics.active_validations.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_counter_and_text() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_verdict("summary", "standard", true);
        metrics.record_verdict("summary", "standard", false);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("output_validation_verdicts_total"));
        assert!(text.contains("result=\"invalid\""));
    }

    #[test]
    fn test_unknown_kinds_collapse_to_other() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_verdict("poem-2024-11-02", "basic", true);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("kind=\"other\""));
        assert!(!text.contains("poem-2024-11-02"));
    }

    #[test]
    fn test_structural_and_semantic_counters() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_structural_error(ErrorKind::OutOfRange);
        metrics.record_semantic_path(SemanticPath::Timeout);
        metrics.observe_remote_duration(0.3);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("error_kind=\"out_of_range\""));
        assert!(text.contains("path=\"timeout\""));
        assert!(text.contains("output_validation_remote_duration_seconds"));
    }

    #[test]
    fn test_validation_timer() {
        let metrics = EngineMetrics::new().unwrap();
        {
            let timer = metrics.start_timer("strict");
            assert!(timer.elapsed_secs() >= 0.0);
        }
        let text = metrics.gather_text().unwrap();
        assert!(text.contains("output_validation_validation_duration_seconds_count{level=\"strict\"} 1"));
        assert!(text.contains("output_validation_active_validations 0"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Arc::new(Registry::new());
        assert!(EngineMetrics::with_registry(Arc::clone(&registry)).is_ok());
        assert!(EngineMetrics::with_registry(registry).is_err());
    }
}
