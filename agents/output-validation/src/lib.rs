//! Output Validation Engine
//!
//! Validates records produced by AI models (or any untrusted producer)
//! against a caller-supplied schema, in two stages:
//!
//! - **Structural validation**: type, format, range, pattern and name-content
//!   checks compiled at request time from the schema description
//! - **Semantic validation**: a judgment of whether the data makes sense,
//!   delegated to a remote reasoning service under a hard timeout, with a
//!   deterministic heuristic validator as fallback
//!
//! ## Architecture
//!
//! 1. **Contracts** (`contracts/`): wire-level request, result and schema types.
//!
//! 2. **Engine** (`engine/`): schema compiler, structural runner, heuristic
//!    validator, semantic orchestrator and result aggregation.
//!
//! 3. **Client** (`client/`): the reasoning service seam and its lazily
//!    initialized handle, plus an HTTP chat-completions implementation.
//!
//! 4. **Telemetry** (`telemetry/`): Prometheus metrics.
//!
//! 5. **CLI** (`cli/`): `validate` and `capabilities` commands.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Validate a record against a schema
//! output-validate validate --data record.json --schema schema.yaml --kind summary --level strict
//!
//! # Structural validation only
//! output-validate validate --data record.json --schema schema.json --structure-only --format json
//!
//! # Describe supported types, formats and levels
//! output-validate capabilities
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use output_validation::{EngineConfig, ValidationEngine, ValidationLevel, ValidationRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = ValidationEngine::new(&EngineConfig::from_env());
//!
//!     let request = ValidationRequest::new(
//!         json!({"email": "user@example.com"}),
//!         json!({"email": {"type": "string", "required": true, "format": "email"}}),
//!     )
//!     .with_level(ValidationLevel::Strict);
//!
//!     let verdict = engine.validate(&request).await.unwrap();
//!     println!("{}", serde_json::to_string_pretty(&verdict).unwrap());
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use client::{
    ChatReasoningClient, ClientError, HandleStatus, PromptContext, ReasoningHandle,
    ReasoningService,
};
pub use config::EngineConfig;
pub use contracts::{
    ErrorKind, FieldSpec, FieldType, Schema, SemanticResult, StructuralError, StructuralResult,
    ValidationLevel, ValidationRequest, ValidationVerdict,
};
pub use engine::rules::{validate_name_content, NameRejection};
pub use engine::{
    compile, CompiledValidator, DegradeReason, HeuristicValidator, SemanticOrchestrator,
    SemanticPath, ValidationEngine,
};
pub use error::{EngineError, Result};
pub use telemetry::{EngineMetrics, TelemetryError};

pub use cli::{ExitCode, OutputFormat, ValidateCli, ValidateCommands};

/// Engine version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine identifier
pub const AGENT_ID: &str = "output-validation-engine";

/// Run the CLI application
///
/// This is the main entry point for the CLI binary.
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use output_validation::{run_cli, ValidateCli};
///
/// #[tokio::main]
/// async fn main() {
///     let cli = ValidateCli::parse();
///     let exit_code = run_cli(cli).await;
///     std::process::exit(exit_code.into());
/// }
/// ```
pub async fn run_cli(cli: ValidateCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
