//! CLI module for the output validation engine
//!
//! Thin command-line surface over [`ValidationEngine`](crate::engine::ValidationEngine):
//! validate a record file against a schema file, or describe the engine's
//! capabilities.

pub mod commands;
pub mod output;

pub use commands::{ValidateCli, ValidateCommands};
pub use output::{OutputFormat, VerdictOutput};

use crate::error::EngineError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Record is valid
    Success = 0,
    /// Record is invalid
    ValidationError = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Schema could not be compiled
    SchemaError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a completed verdict
    pub fn from_verdict(is_valid: bool) -> Self {
        if is_valid {
            ExitCode::Success
        } else {
            ExitCode::ValidationError
        }
    }

    /// Exit code for an error that prevented a verdict
    pub fn from_error(err: &EngineError) -> Self {
        match err {
            EngineError::SchemaCompile { .. } => ExitCode::SchemaError,
            EngineError::FileError(_) => ExitCode::FileError,
            EngineError::InputShape(_)
            | EngineError::InvalidInput(_)
            | EngineError::ParseError(_) => ExitCode::InvalidInput,
            EngineError::SerializationError(_) | EngineError::Internal(_) => {
                ExitCode::InternalError
            }
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: ValidateCli) -> Result<ExitCode, EngineError> {
    match cli.command {
        ValidateCommands::Validate {
            data,
            schema,
            kind,
            level,
            format,
            structure_only,
        } => {
            commands::execute_validate(data, schema, kind, level, format, structure_only, cli.quiet)
                .await
        }
        ValidateCommands::Capabilities { format } => commands::execute_capabilities(format),
    }
}
