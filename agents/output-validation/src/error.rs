//! Error types for the output validation engine
//!
//! Only conditions that make a verdict impossible are errors: a schema that
//! cannot be compiled, or input that is not a JSON object. Bad data is never
//! an error; it is reported inside the verdict.

use thiserror::Error;

/// Main error type for engine and CLI operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Schema references something that cannot be compiled
    #[error("Invalid schema at '{field}': {reason}")]
    SchemaCompile { field: String, reason: String },

    /// Data or schema is not a JSON object
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    /// Invalid arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Input document parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Output serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create a schema compile error for a field path
    pub fn schema_compile(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::SchemaCompile {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an input shape error
    pub fn input_shape(msg: impl Into<String>) -> Self {
        EngineError::InputShape(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        EngineError::FileError(msg.into())
    }

    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        EngineError::ParseError(msg.into())
    }

    /// Check if this is a caller error (4xx-equivalent) rather than internal
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EngineError::SchemaCompile { .. }
                | EngineError::InputShape(_)
                | EngineError::InvalidInput(_)
                | EngineError::FileError(_)
                | EngineError::ParseError(_)
        )
    }

    /// Stable token for metrics and machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SchemaCompile { .. } => "invalid_schema",
            EngineError::InputShape(_) => "invalid_input_shape",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::FileError(_) => "file_error",
            EngineError::ParseError(_) => "parse_error",
            EngineError::SerializationError(_) => "serialization_error",
            EngineError::Internal(_) => "internal_error",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ParseError(format!("TOML error: {}", err))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
