//! Output Validation Contract Definitions
//!
//! Wire-level types shared by the engine, the CLI and any caller embedding
//! the library behind its own transport.
//!
//! # Design Principles
//!
//! - **Always a verdict**: bad data is a normal outcome, reported in full
//! - **Stateless**: each validation call is independent
//! - **Explainable**: every structural failure carries a location, a kind
//!   token, the raw message and a human suggestion

pub mod schemas;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use schemas::{FieldSpec, FieldType, Schema};

/// Strictness requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    /// Structural validation only, semantic phase skipped
    StructureOnly,
    Basic,
    #[default]
    Standard,
    /// Also runs the semantic phase when structural validation failed
    Strict,
}

impl ValidationLevel {
    /// Whether the semantic phase runs at all
    pub fn runs_semantic(&self) -> bool {
        !matches!(self, ValidationLevel::StructureOnly)
    }

    /// Whether semantic evaluation is forced despite structural failure
    pub fn forces_escalation(&self) -> bool {
        matches!(self, ValidationLevel::Strict)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::StructureOnly => "structure_only",
            ValidationLevel::Basic => "basic",
            ValidationLevel::Standard => "standard",
            ValidationLevel::Strict => "strict",
        }
    }

    pub fn all() -> [ValidationLevel; 4] {
        [
            ValidationLevel::StructureOnly,
            ValidationLevel::Basic,
            ValidationLevel::Standard,
            ValidationLevel::Strict,
        ]
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structure_only" | "structure-only" => Ok(ValidationLevel::StructureOnly),
            "basic" => Ok(ValidationLevel::Basic),
            "standard" => Ok(ValidationLevel::Standard),
            "strict" => Ok(ValidationLevel::Strict),
            other => Err(format!(
                "Unknown validation level: {} (expected structure_only, basic, standard or strict)",
                other
            )),
        }
    }
}

/// Kind token of a structural failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingRequired,
    WrongType,
    PatternMismatch,
    FormatInvalid,
    OutOfRange,
    LengthViolation,
    NameContentInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequired => "missing_required",
            ErrorKind::WrongType => "wrong_type",
            ErrorKind::PatternMismatch => "pattern_mismatch",
            ErrorKind::FormatInvalid => "format_invalid",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::LengthViolation => "length_violation",
            ErrorKind::NameContentInvalid => "name_content_invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralError {
    /// Dotted field path, e.g. `user.email` or `items.2`
    pub loc: String,

    #[serde(rename = "type")]
    pub kind: ErrorKind,

    /// Raw validator message
    pub msg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Outcome of the structural phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralResult {
    pub is_structurally_valid: bool,

    #[serde(default)]
    pub errors: Vec<StructuralError>,

    /// De-duplicated suggestions in error order; empty when valid
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl StructuralResult {
    pub fn valid() -> Self {
        Self {
            is_structurally_valid: true,
            errors: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Build from a list of errors; valid iff the list is empty
    pub fn from_errors(errors: Vec<StructuralError>) -> Self {
        let mut suggestions: Vec<String> = Vec::new();
        for suggestion in errors.iter().filter_map(|e| e.suggestion.as_ref()) {
            if !suggestions.contains(suggestion) {
                suggestions.push(suggestion.clone());
            }
        }
        Self {
            is_structurally_valid: errors.is_empty(),
            errors,
            suggestions,
        }
    }
}

/// Outcome of the semantic phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticResult {
    pub is_semantically_valid: bool,

    /// Confidence in [0, 1]
    pub semantic_score: f64,

    #[serde(default)]
    pub issues: Vec<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl SemanticResult {
    /// Fixed outcome reported when the remote call exceeds its budget
    pub const TIMEOUT_ISSUE: &'static str = "Semantic validation timed out";

    pub fn valid() -> Self {
        Self {
            is_semantically_valid: true,
            semantic_score: 1.0,
            issues: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Invalid result with score 0.0
    pub fn rejected(issues: Vec<String>, suggestions: Vec<String>) -> Self {
        Self {
            is_semantically_valid: false,
            semantic_score: 0.0,
            issues,
            suggestions,
        }
    }

    /// Linear penalty scoring: 1.0 with no issues, otherwise
    /// `max(0, 1 - 0.1 * issues)`.
    pub fn from_issues(issues: Vec<String>, suggestions: Vec<String>) -> Self {
        let is_valid = issues.is_empty();
        let semantic_score = if is_valid {
            1.0
        } else {
            (1.0 - 0.1 * issues.len() as f64).max(0.0)
        };
        Self {
            is_semantically_valid: is_valid,
            semantic_score,
            issues,
            suggestions,
        }
    }

    pub fn timed_out() -> Self {
        Self::rejected(
            vec![Self::TIMEOUT_ISSUE.to_string()],
            vec!["Try again later or with simpler data or schema".to_string()],
        )
    }
}

/// Final verdict combining both phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,

    #[serde(rename = "structural_validation")]
    pub structural: StructuralResult,

    /// Absent when the semantic phase was skipped
    #[serde(rename = "semantic_validation")]
    pub semantic: Option<SemanticResult>,
}

/// Engine input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Record to validate; must be a JSON object
    #[serde(alias = "content")]
    pub data: serde_json::Value,

    /// Field name -> field definition; must be a JSON object
    pub schema: serde_json::Value,

    /// Validation kind tag (`generic`, `recommendation`, `summary`, ...)
    #[serde(default = "default_kind", rename = "type", alias = "validation_type")]
    pub kind: String,

    #[serde(default, alias = "validation_level")]
    pub level: ValidationLevel,
}

fn default_kind() -> String {
    "generic".to_string()
}

impl ValidationRequest {
    pub fn new(data: serde_json::Value, schema: serde_json::Value) -> Self {
        Self {
            data,
            schema,
            kind: default_kind(),
            level: ValidationLevel::default(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_level(mut self, level: ValidationLevel) -> Self {
        self.level = level;
        self
    }
}
