//! Heuristic semantic validator
//!
//! Deterministic local rules used whenever the remote reasoning service is
//! unavailable or returns something unusable. No I/O, no state: the same
//! inputs always produce the same issues in the same order.

use serde_json::{Map, Value};

use super::rules::{is_name_field, validate_name_content, StringFormat};
use crate::contracts::{Schema, SemanticResult, StructuralError, ValidationLevel};

/// Minimum `recommendation_text` length for `recommendation` outputs
pub const MIN_RECOMMENDATION_CHARS: usize = 20;

/// Minimum `summary` length for `summary` outputs
pub const MIN_SUMMARY_CHARS: usize = 30;

const STRICT_MIN_FIELD_CHARS: usize = 2;

/// Local rule engine producing a [`SemanticResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicValidator {
    strict_thresholds: bool,
}

struct Findings {
    issues: Vec<String>,
    suggestions: Vec<String>,
}

impl Findings {
    fn push(&mut self, issue: String, suggestion: String) {
        self.issues.push(issue);
        self.suggestions.push(suggestion);
    }
}

impl HeuristicValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heighten thresholds when the caller asks for `strict` validation
    pub fn with_strict_thresholds(mut self, enabled: bool) -> Self {
        self.strict_thresholds = enabled;
        self
    }

    /// Evaluate a record.
    ///
    /// `level` only matters when strict thresholds are enabled.
    pub fn evaluate(
        &self,
        kind: &str,
        level: ValidationLevel,
        data: &Map<String, Value>,
        schema: &Schema,
        structural_errors: &[StructuralError],
    ) -> SemanticResult {
        if !structural_errors.is_empty() {
            return SemanticResult::rejected(
                vec!["Failed structural validation".to_string()],
                vec!["Fix structural errors before semantic validation".to_string()],
            );
        }

        let strict = self.strict_thresholds && level == ValidationLevel::Strict;
        let mut findings = Findings {
            issues: Vec::new(),
            suggestions: Vec::new(),
        };

        for field in schema.required_fields() {
            if matches!(data.get(field), None | Some(Value::Null)) {
                findings.push(
                    format!("Required field '{}' is missing", field),
                    format!("Add the required field '{}'", field),
                );
            }
        }

        let texts: Vec<(&str, &str)> = data
            .iter()
            .filter_map(|(field, value)| value.as_str().map(|text| (field.as_str(), text)))
            .collect();

        for (field, text) in &texts {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                findings.push(
                    format!("Field '{}' is empty", field),
                    format!("Provide meaningful content for '{}'", field),
                );
            } else if strict && trimmed.chars().count() < STRICT_MIN_FIELD_CHARS {
                findings.push(
                    format!("Field '{}' is too short", field),
                    format!("Provide more content for '{}'", field),
                );
            }
        }

        for (field, text) in texts.iter().filter(|(_, text)| !text.trim().is_empty()) {
            let tag = schema.get(field).and_then(|spec| spec.format.as_deref());
            for format in StringFormat::for_field(field, tag) {
                if format.check(text.trim()).is_err() {
                    let (issue, suggestion) = format_finding(field, format);
                    findings.push(issue, suggestion);
                }
            }
        }

        for (field, text) in texts.iter().filter(|(_, text)| !text.trim().is_empty()) {
            if is_name_field(field) {
                if let Err(rejection) = validate_name_content(text) {
                    findings.push(
                        format!("Field '{}' does not look like a real name: {}", field, rejection),
                        format!("Provide a real person's name for '{}'", field),
                    );
                }
            }
        }

        let factor = if strict { 2 } else { 1 };
        match kind {
            "recommendation" => {
                let min = MIN_RECOMMENDATION_CHARS * factor;
                if too_short(data.get("recommendation_text"), min) {
                    findings.push(
                        "Recommendation text is too short".to_string(),
                        format!(
                            "Provide more detailed recommendations (at least {} characters)",
                            min
                        ),
                    );
                }
            }
            "summary" => {
                let min = MIN_SUMMARY_CHARS * factor;
                if too_short(data.get("summary"), min) {
                    findings.push(
                        "Summary is too short".to_string(),
                        format!(
                            "Provide a more comprehensive summary (at least {} characters)",
                            min
                        ),
                    );
                }
            }
            _ => {}
        }

        SemanticResult::from_issues(findings.issues, findings.suggestions)
    }
}

fn too_short(value: Option<&Value>, min: usize) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|text| text.chars().count() < min)
}

fn format_finding(field: &str, format: StringFormat) -> (String, String) {
    match format {
        StringFormat::Email => (
            format!("Field '{}' is not a valid email address", field),
            format!("Use an address like user@example.com for '{}'", field),
        ),
        StringFormat::Date => (
            format!("Field '{}' is not a valid date", field),
            format!("Use a real calendar date in YYYY-MM-DD format for '{}'", field),
        ),
        StringFormat::Phone => (
            format!("Field '{}' is not a valid phone number", field),
            format!("Use a phone number with 7 to 15 digits for '{}'", field),
        ),
    }
}
