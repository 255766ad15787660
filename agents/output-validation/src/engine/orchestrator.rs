//! Semantic validation orchestrator
//!
//! Decides between the remote reasoning service and the local heuristic
//! validator, bounds the remote call with a hard timeout, and normalizes
//! whatever comes back into one [`SemanticResult`].
//!
//! The remote stage is a `Result<RemoteOutcome, DegradeReason>` pipeline:
//! an `Err` always means "fall back to the heuristic validator", with the
//! reason logged and counted. A timeout is not a degrade reason; it is
//! reported as its own fixed result.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::heuristic::HeuristicValidator;
use crate::client::{ClientError, PromptContext, ReasoningHandle, ReasoningService};
use crate::config::EngineConfig;
use crate::contracts::schemas::json_type_name;
use crate::contracts::{Schema, SemanticResult, StructuralError, ValidationLevel};
use crate::telemetry::EngineMetrics;

/// Why the remote path was abandoned in favour of the heuristic validator
#[derive(Debug, Clone, PartialEq)]
pub enum DegradeReason {
    /// No usable reasoning service handle
    ServiceUnavailable,
    /// The service answered with something that is not a semantic verdict
    MalformedResponse(String),
    /// Transport, status or configuration failure
    RemoteFailure(String),
}

impl DegradeReason {
    pub fn path(&self) -> SemanticPath {
        match self {
            DegradeReason::ServiceUnavailable => SemanticPath::DegradedUnavailable,
            DegradeReason::MalformedResponse(_) => SemanticPath::DegradedMalformed,
            DegradeReason::RemoteFailure(_) => SemanticPath::DegradedFailure,
        }
    }
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::ServiceUnavailable => write!(f, "reasoning service unavailable"),
            DegradeReason::MalformedResponse(detail) => {
                write!(f, "malformed remote response: {}", detail)
            }
            DegradeReason::RemoteFailure(detail) => write!(f, "remote call failed: {}", detail),
        }
    }
}

impl From<ClientError> for DegradeReason {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Decode(detail) => DegradeReason::MalformedResponse(detail),
            ClientError::NotConfigured(_) => DegradeReason::ServiceUnavailable,
            other => DegradeReason::RemoteFailure(other.to_string()),
        }
    }
}

/// Which path produced a semantic result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticPath {
    /// Remote service answered in time with a usable verdict
    Remote,
    /// No reasoning service configured at all
    Heuristic,
    DegradedUnavailable,
    DegradedMalformed,
    DegradedFailure,
    Timeout,
    /// Input guard answered without consulting either validator
    ShortCircuit,
}

impl SemanticPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticPath::Remote => "remote",
            SemanticPath::Heuristic => "heuristic",
            SemanticPath::DegradedUnavailable => "degraded_unavailable",
            SemanticPath::DegradedMalformed => "degraded_malformed",
            SemanticPath::DegradedFailure => "degraded_failure",
            SemanticPath::Timeout => "timeout",
            SemanticPath::ShortCircuit => "short_circuit",
        }
    }
}

impl fmt::Display for SemanticPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a remote call that did not degrade
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Answered(SemanticResult),
    TimedOut,
}

/// Remote verdict as received; every field may be missing or null
#[derive(Debug, Deserialize)]
struct RemoteSemanticResult {
    is_semantically_valid: Option<bool>,
    semantic_score: Option<f64>,
    issues: Option<Vec<String>>,
    suggestions: Option<Vec<String>>,
}

/// Normalize a raw remote verdict.
///
/// Missing or null validity and score default to `true` and `1.0`; a score
/// outside `[0, 1]` is clamped. Anything that is not an object, or carries
/// a field of the wrong type, is malformed.
pub fn normalize_remote(value: Value) -> Result<SemanticResult, DegradeReason> {
    if !value.is_object() {
        return Err(DegradeReason::MalformedResponse(format!(
            "expected a JSON object, found {}",
            json_type_name(&value)
        )));
    }

    let remote: RemoteSemanticResult = serde_json::from_value(value)
        .map_err(|e| DegradeReason::MalformedResponse(e.to_string()))?;

    Ok(SemanticResult {
        is_semantically_valid: remote.is_semantically_valid.unwrap_or(true),
        semantic_score: remote.semantic_score.unwrap_or(1.0).clamp(0.0, 1.0),
        issues: remote.issues.unwrap_or_default(),
        suggestions: remote.suggestions.unwrap_or_default(),
    })
}

/// Chooses and runs the semantic validation path
pub struct SemanticOrchestrator {
    handle: Arc<ReasoningHandle>,
    heuristic: HeuristicValidator,
    budget: Duration,
    metrics: Option<Arc<EngineMetrics>>,
}

impl SemanticOrchestrator {
    pub fn new(handle: Arc<ReasoningHandle>, budget: Duration) -> Self {
        Self {
            handle,
            heuristic: HeuristicValidator::new(),
            budget,
            metrics: None,
        }
    }

    /// Orchestrator with a lazily initialized chat client
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(ReasoningHandle::from_config(config)),
            Duration::from_millis(config.semantic_timeout_ms.max(1)),
        )
        .with_heuristic(HeuristicValidator::new().with_strict_thresholds(config.strict_heuristics))
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicValidator) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handle(&self) -> &Arc<ReasoningHandle> {
        &self.handle
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Semantic validation for a structurally valid record
    pub async fn validate_semantics(
        &self,
        kind: &str,
        level: ValidationLevel,
        data: &Value,
        schema: &Value,
    ) -> SemanticResult {
        self.validate_semantics_with_errors(kind, level, data, schema, &[])
            .await
    }

    /// Semantic validation that also carries structural errors, used by the
    /// strict escalation path
    pub async fn validate_semantics_with_errors(
        &self,
        kind: &str,
        level: ValidationLevel,
        data: &Value,
        schema: &Value,
        structural_errors: &[StructuralError],
    ) -> SemanticResult {
        let (result, path) = self
            .evaluate(kind, level, data, schema, structural_errors)
            .await;
        if let Some(metrics) = &self.metrics {
            metrics.record_semantic_path(path);
        }
        tracing::debug!(
            kind = kind,
            level = %level,
            path = %path,
            valid = result.is_semantically_valid,
            score = result.semantic_score,
            "Semantic validation finished"
        );
        result
    }

    /// Run the decision tree, reporting which path produced the result
    pub async fn evaluate(
        &self,
        kind: &str,
        level: ValidationLevel,
        data: &Value,
        schema: &Value,
        structural_errors: &[StructuralError],
    ) -> (SemanticResult, SemanticPath) {
        let (data_map, schema_map) = match (data.as_object(), schema.as_object()) {
            (Some(data_map), Some(schema_map)) => (data_map, schema_map),
            _ => {
                tracing::warn!(
                    data_type = json_type_name(data),
                    schema_type = json_type_name(schema),
                    "Invalid semantic validation input"
                );
                return (
                    SemanticResult::rejected(
                        vec![
                            "Invalid input format. Both data and schema must be valid JSON objects."
                                .to_string(),
                        ],
                        vec!["Ensure both data and schema are valid JSON objects.".to_string()],
                    ),
                    SemanticPath::ShortCircuit,
                );
            }
        };

        if data_map.is_empty() || schema_map.is_empty() {
            let mut issues = Vec::new();
            let mut suggestions = Vec::new();
            if data_map.is_empty() {
                issues.push("The provided data is empty".to_string());
                suggestions.push("Provide actual content to validate".to_string());
            }
            if schema_map.is_empty() {
                issues.push("The provided schema is empty".to_string());
                suggestions.push("Define a schema with fields and validation rules".to_string());
            }
            return (
                SemanticResult::rejected(issues, suggestions),
                SemanticPath::ShortCircuit,
            );
        }

        let service = match self.handle.get() {
            Some(service) => service,
            None if !self.handle.is_configured() => {
                return (
                    self.run_heuristic(kind, level, data_map, schema, structural_errors),
                    SemanticPath::Heuristic,
                );
            }
            None => {
                return self.degrade(
                    DegradeReason::ServiceUnavailable,
                    kind,
                    level,
                    data_map,
                    schema,
                    structural_errors,
                );
            }
        };

        let context = PromptContext::new(kind, level, schema.clone(), data.clone())
            .with_structural_errors(structural_errors.to_vec());

        match self.try_remote(service.as_ref(), &context).await {
            Ok(RemoteOutcome::Answered(result)) => (result, SemanticPath::Remote),
            Ok(RemoteOutcome::TimedOut) => (SemanticResult::timed_out(), SemanticPath::Timeout),
            Err(reason) => self.degrade(reason, kind, level, data_map, schema, structural_errors),
        }
    }

    /// Call the remote service under the time budget
    pub async fn try_remote(
        &self,
        service: &dyn ReasoningService,
        context: &PromptContext,
    ) -> Result<RemoteOutcome, DegradeReason> {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.budget, service.run(context)).await;
        let elapsed = start.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.observe_remote_duration(elapsed.as_secs_f64());
        }

        match outcome {
            Err(_) => {
                tracing::warn!(
                    service = service.name(),
                    kind = %context.kind,
                    level = %context.level,
                    budget_ms = self.budget.as_millis() as u64,
                    "Semantic validation timed out"
                );
                Ok(RemoteOutcome::TimedOut)
            }
            Ok(Err(e)) => Err(DegradeReason::from(e)),
            Ok(Ok(value)) => {
                tracing::debug!(
                    service = service.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Reasoning service answered"
                );
                normalize_remote(value).map(RemoteOutcome::Answered)
            }
        }
    }

    fn degrade(
        &self,
        reason: DegradeReason,
        kind: &str,
        level: ValidationLevel,
        data: &Map<String, Value>,
        schema: &Value,
        structural_errors: &[StructuralError],
    ) -> (SemanticResult, SemanticPath) {
        tracing::warn!(
            kind = kind,
            level = %level,
            reason = %reason,
            "Semantic validation degraded to heuristic"
        );
        let path = reason.path();
        (
            self.run_heuristic(kind, level, data, schema, structural_errors),
            path,
        )
    }

    fn run_heuristic(
        &self,
        kind: &str,
        level: ValidationLevel,
        data: &Map<String, Value>,
        schema: &Value,
        structural_errors: &[StructuralError],
    ) -> SemanticResult {
        match Schema::from_json(schema) {
            Ok(schema) => self
                .heuristic
                .evaluate(kind, level, data, &schema, structural_errors),
            Err(e) => SemanticResult::rejected(
                vec![format!("Schema could not be interpreted: {}", e)],
                vec!["Fix the schema definition".to_string()],
            ),
        }
    }
}

impl fmt::Debug for SemanticOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticOrchestrator")
            .field("handle", &self.handle)
            .field("heuristic", &self.heuristic)
            .field("budget", &self.budget)
            .finish()
    }
}
