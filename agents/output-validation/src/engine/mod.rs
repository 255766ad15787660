//! Validation Engine for AI-produced records
//!
//! This module composes the two validation phases:
//!
//! 1. [`compiler`] turns a [`Schema`] into a [`CompiledValidator`]
//! 2. [`runner`] executes it against the record
//! 3. [`orchestrator`] runs semantic validation (remote or heuristic)
//! 4. [`aggregate`] combines both into a [`ValidationVerdict`]
//!
//! Structural validation strictly precedes semantic validation. Each call
//! compiles its own validator; nothing but the reasoning handle is shared
//! between calls.

pub mod aggregate;
pub mod compiler;
pub mod heuristic;
pub mod orchestrator;
pub mod rules;
pub mod runner;

pub use compiler::{compile, CompiledField, CompiledValidator, FieldKind};
pub use heuristic::HeuristicValidator;
pub use orchestrator::{DegradeReason, SemanticOrchestrator, SemanticPath};

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::contracts::schemas::json_type_name;
use crate::contracts::{
    FieldType, Schema, StructuralResult, ValidationLevel, ValidationRequest, ValidationVerdict,
};
use crate::error::{EngineError, Result};
use crate::telemetry::EngineMetrics;
use crate::AGENT_VERSION;

/// Validation kinds with dedicated prompt wording and heuristics
pub const VALIDATION_KINDS: &[&str] = &["generic", "recommendation", "summary", "classification"];

/// The end-to-end validation engine
pub struct ValidationEngine {
    orchestrator: SemanticOrchestrator,
    metrics: Option<Arc<EngineMetrics>>,
}

impl ValidationEngine {
    /// Create an engine from configuration.
    ///
    /// The reasoning client is not built here; it is initialized lazily on
    /// the first semantic validation.
    pub fn new(config: &EngineConfig) -> Self {
        let engine = Self::with_orchestrator(SemanticOrchestrator::from_config(config));
        if !config.enable_metrics {
            return engine;
        }
        match EngineMetrics::new() {
            Ok(metrics) => engine.with_metrics(Arc::new(metrics)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register metrics, continuing without");
                engine
            }
        }
    }

    /// Create an engine from environment configuration
    pub fn from_env() -> Self {
        Self::new(&EngineConfig::from_env())
    }

    /// Create an engine around an existing orchestrator
    pub fn with_orchestrator(orchestrator: SemanticOrchestrator) -> Self {
        Self {
            orchestrator,
            metrics: None,
        }
    }

    /// Attach metrics to the engine and its orchestrator
    pub fn with_metrics(self, metrics: Arc<EngineMetrics>) -> Self {
        let Self { orchestrator, .. } = self;
        Self {
            orchestrator: orchestrator.with_metrics(Arc::clone(&metrics)),
            metrics: Some(metrics),
        }
    }

    pub fn orchestrator(&self) -> &SemanticOrchestrator {
        &self.orchestrator
    }

    pub fn metrics(&self) -> Option<&Arc<EngineMetrics>> {
        self.metrics.as_ref()
    }

    /// Structural phase only: normalize the schema, compile and run it.
    ///
    /// Returns the normalized record when valid, the input unchanged when not.
    pub fn check_structure(&self, data: &Value, schema: &Value) -> Result<(StructuralResult, Value)> {
        ensure_object("data", data)?;
        let schema = Schema::from_json(schema)?;
        let validator = compile(&schema)?;
        runner::run(&validator, data)
    }

    /// Validate a record against its schema.
    ///
    /// Errors only for a schema that cannot be compiled or input that is not
    /// a JSON object; every data-quality problem ends up in the verdict.
    pub async fn validate(&self, request: &ValidationRequest) -> Result<ValidationVerdict> {
        let span = tracing::info_span!(
            "validate",
            validation_id = %Uuid::new_v4(),
            kind = %request.kind,
            level = %request.level,
        );
        self.validate_inner(request).instrument(span).await
    }

    async fn validate_inner(&self, request: &ValidationRequest) -> Result<ValidationVerdict> {
        let level = request.level;
        let _timer = self.metrics.as_ref().map(|m| m.start_timer(level.as_str()));

        ensure_object("data", &request.data)?;
        ensure_object("schema", &request.schema)?;

        let (structural, _normalized) = self.check_structure(&request.data, &request.schema)?;

        if let Some(metrics) = &self.metrics {
            for error in &structural.errors {
                metrics.record_structural_error(error.kind);
            }
        }
        tracing::debug!(
            valid = structural.is_structurally_valid,
            errors = structural.errors.len(),
            "Structural validation finished"
        );

        let escalated_errors = if structural.is_structurally_valid {
            Vec::new()
        } else {
            structural.errors.clone()
        };

        let verdict = aggregate::aggregate(structural, level, || {
            self.orchestrator.validate_semantics_with_errors(
                &request.kind,
                level,
                &request.data,
                &request.schema,
                &escalated_errors,
            )
        })
        .await;

        if let Some(metrics) = &self.metrics {
            metrics.record_verdict(&request.kind, level.as_str(), verdict.is_valid);
        }
        tracing::info!(
            valid = verdict.is_valid,
            semantic = verdict.semantic.is_some(),
            "Validation complete"
        );

        Ok(verdict)
    }

    /// Describe what the engine accepts
    pub fn capabilities() -> Value {
        let types: Vec<&str> = [
            FieldType::String,
            FieldType::Number,
            FieldType::Integer,
            FieldType::Boolean,
            FieldType::Array,
            FieldType::Object,
        ]
        .iter()
        .map(FieldType::as_str)
        .collect();
        let levels: Vec<&str> = ValidationLevel::all().iter().map(|l| l.as_str()).collect();

        json!({
            "version": AGENT_VERSION,
            "supported_formats": ["email", "date"],
            "supported_types": types,
            "validation_kinds": VALIDATION_KINDS,
            "validation_levels": levels,
            "schema_constraints": {
                "string": ["min_length", "max_length", "pattern", "format"],
                "number": ["min", "max"],
                "integer": ["min", "max"],
                "array": ["min_length", "max_length", "items"],
                "object": ["properties"],
                "all": ["required", "description"]
            },
            "example_request": {
                "data": {"name": "John Smith", "email": "john@example.com"},
                "schema": {
                    "name": {"type": "string", "required": true},
                    "email": {"type": "string", "required": true, "format": "email"}
                },
                "type": "generic",
                "level": "standard"
            }
        })
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

fn ensure_object(what: &str, value: &Value) -> Result<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(EngineError::input_shape(format!(
            "{} must be a JSON object, found {}",
            what,
            json_type_name(value)
        )))
    }
}
