//! CLI command definitions for the output validation engine

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use super::output::{OutputFormat, VerdictOutput};
use super::ExitCode;
use crate::config::EngineConfig;
use crate::contracts::{ValidationLevel, ValidationRequest};
use crate::engine::ValidationEngine;
use crate::error::{EngineError, Result};

/// Output validation CLI
///
/// Validate AI-produced records against a schema, structurally and
/// semantically.
#[derive(Parser, Debug)]
#[command(name = "output-validate")]
#[command(about = "Validate AI-produced records against a schema", long_about = None)]
#[command(version)]
pub struct ValidateCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: ValidateCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum ValidateCommands {
    /// Validate a record against a schema
    ///
    /// Semantic validation uses the reasoning service configured through
    /// the environment (OPENAI_API_KEY, REASONING_ENDPOINT) and falls back
    /// to local heuristics when none is available.
    Validate {
        /// Path to the record (json, yaml or toml)
        #[arg(short, long)]
        data: PathBuf,

        /// Path to the schema (json, yaml or toml)
        #[arg(short, long)]
        schema: PathBuf,

        /// Validation kind (generic, recommendation, summary, classification, ...)
        #[arg(short, long, default_value = "generic")]
        kind: String,

        /// Validation level (structure_only, basic, standard, strict)
        #[arg(short, long, default_value = "standard")]
        level: String,

        /// Output format for the verdict
        #[arg(long, value_enum, default_value = "table")]
        format: Option<OutputFormat>,

        /// Skip semantic validation regardless of --level
        #[arg(long)]
        structure_only: bool,
    },

    /// Describe supported types, formats, kinds and levels
    Capabilities {
        #[arg(long, value_enum, default_value = "json")]
        format: Option<OutputFormat>,
    },
}

/// Execute the validate command
pub async fn execute_validate(
    data: PathBuf,
    schema: PathBuf,
    kind: String,
    level: String,
    format: Option<OutputFormat>,
    structure_only: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let level = if structure_only {
        ValidationLevel::StructureOnly
    } else {
        level.parse().map_err(EngineError::InvalidInput)?
    };

    let data_value = load_document(&data)?;
    let schema_value = load_document(&schema)?;

    let engine = ValidationEngine::new(&EngineConfig::from_env());
    let request = ValidationRequest::new(data_value, schema_value)
        .with_kind(kind)
        .with_level(level);

    let verdict = engine.validate(&request).await?;

    if !quiet {
        VerdictOutput::new(&request, &verdict).render(format.unwrap_or_default())?;
    }

    Ok(ExitCode::from_verdict(verdict.is_valid))
}

/// Execute the capabilities command
pub fn execute_capabilities(format: Option<OutputFormat>) -> Result<ExitCode> {
    let capabilities = ValidationEngine::capabilities();
    let rendered = match format.unwrap_or(OutputFormat::Json) {
        OutputFormat::Yaml => serde_yaml::to_string(&capabilities)
            .map_err(|e| EngineError::SerializationError(e.to_string()))?,
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(&capabilities)
            .map_err(|e| EngineError::SerializationError(e.to_string()))?,
    };
    println!("{}", rendered);
    Ok(ExitCode::Success)
}

fn load_document(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EngineError::file_error(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    parse_document(path, &content)
}

/// Parse a document based on its extension
fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| EngineError::parse_error(format!("Invalid JSON: {}", e))),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| EngineError::parse_error(format!("Invalid YAML: {}", e))),
        "toml" => {
            let toml_value: toml::Value = toml::from_str(content)
                .map_err(|e| EngineError::parse_error(format!("Invalid TOML: {}", e)))?;
            serde_json::to_value(toml_value)
                .map_err(|e| EngineError::parse_error(format!("Conversion error: {}", e)))
        }
        _ => Err(EngineError::invalid_input(format!(
            "Unsupported file format: {}. Supported formats: json, yaml, yml, toml",
            extension
        ))),
    }
}
