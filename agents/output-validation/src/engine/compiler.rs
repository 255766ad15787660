//! Schema compiler
//!
//! Turns a normalized [`Schema`] into a [`CompiledValidator`]: a tree of
//! tagged field kinds with their side-constraint checks pre-built (regexes
//! compiled, format checks resolved, name-content opt-in decided). The
//! validator is owned by one validation call and never mutated; the runner
//! executes it against records.

use regex::Regex;

use super::rules::{is_name_field, StringFormat};
use crate::contracts::{FieldSpec, FieldType, Schema};
use crate::error::{EngineError, Result};

/// Executable form of a [`Schema`]
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    pub(crate) fields: Vec<CompiledField>,
}

impl CompiledValidator {
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub required: bool,
    pub kind: FieldKind,
}

/// Tagged dispatch over field kinds
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Accepts any value unchanged
    Any,
    Text(Vec<TextCheck>),
    Number(NumericBounds),
    Integer(NumericBounds),
    Boolean,
    /// Element kind is `None` for heterogeneous sequences
    Array {
        items: Option<Box<FieldKind>>,
        bounds: LengthBounds,
    },
    /// Untyped mapping when no nested properties were declared
    Object(Option<CompiledValidator>),
}

impl FieldKind {
    /// Type name used in wrong-type suggestions
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Text(_) => "string",
            FieldKind::Number(_) => "number",
            FieldKind::Integer(_) => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Array { .. } => "list",
            FieldKind::Object(_) => "object",
        }
    }
}

/// String side-constraints, stored in evaluation order
#[derive(Debug, Clone)]
pub enum TextCheck {
    Format(StringFormat),
    Pattern { regex: Regex, source: String },
    Length(LengthBounds),
    NameContent,
}

/// Inclusive character or item count bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthBounds {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Compile a schema into a validator.
///
/// Constraints that do not apply to a field's type (a pattern on a number,
/// bounds on a string) are ignored. Only a pattern that is not a valid
/// regular expression fails compilation.
pub fn compile(schema: &Schema) -> Result<CompiledValidator> {
    compile_at("", schema)
}

fn compile_at(prefix: &str, schema: &Schema) -> Result<CompiledValidator> {
    let fields = schema
        .iter()
        .map(|(name, spec)| {
            let path = join_path(prefix, name);
            Ok(CompiledField {
                name: name.to_string(),
                required: spec.required,
                kind: compile_kind(&path, Some(name), spec)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledValidator { fields })
}

/// `name` is `None` for array elements, which never opt into name checks
fn compile_kind(path: &str, name: Option<&str>, spec: &FieldSpec) -> Result<FieldKind> {
    let kind = match spec.field_type {
        FieldType::Any => FieldKind::Any,
        FieldType::String => FieldKind::Text(compile_text_checks(path, name, spec)?),
        FieldType::Number => FieldKind::Number(NumericBounds {
            min: spec.min,
            max: spec.max,
        }),
        FieldType::Integer => FieldKind::Integer(NumericBounds {
            min: spec.min,
            max: spec.max,
        }),
        FieldType::Boolean => FieldKind::Boolean,
        FieldType::Array => {
            let items = match spec.items.as_deref() {
                Some(items) if items.field_type != FieldType::Any => Some(Box::new(compile_kind(
                    &format!("{}.items", path),
                    None,
                    items,
                )?)),
                _ => None,
            };
            FieldKind::Array {
                items,
                bounds: LengthBounds {
                    min: spec.min_length,
                    max: spec.max_length,
                },
            }
        }
        FieldType::Object => FieldKind::Object(
            spec.properties
                .as_ref()
                .map(|properties| compile_at(path, properties))
                .transpose()?,
        ),
    };
    Ok(kind)
}

fn compile_text_checks(path: &str, name: Option<&str>, spec: &FieldSpec) -> Result<Vec<TextCheck>> {
    let mut checks = Vec::new();

    if let Some(format) = spec.format.as_deref().and_then(StringFormat::from_tag) {
        checks.push(TextCheck::Format(format));
    }

    if let Some(source) = &spec.pattern {
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
            EngineError::schema_compile(path, format!("invalid pattern '{}': {}", source, e))
        })?;
        checks.push(TextCheck::Pattern {
            regex,
            source: source.clone(),
        });
    }

    let bounds = LengthBounds {
        min: spec.min_length,
        max: spec.max_length,
    };
    if !bounds.is_unbounded() {
        checks.push(TextCheck::Length(bounds));
    }

    if name.is_some_and(is_name_field) {
        checks.push(TextCheck::NameContent);
    }

    Ok(checks)
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_json(schema: serde_json::Value) -> Result<CompiledValidator> {
        compile(&Schema::from_json(&schema)?)
    }

    #[test]
    fn test_text_checks_in_fixed_order() {
        let validator = compile_json(json!({
            "name": {"type": "string", "format": "email", "pattern": "[a-z@.]+", "min_length": 3}
        }))
        .unwrap();

        match &validator.fields()[0].kind {
            FieldKind::Text(checks) => {
                assert!(matches!(checks[0], TextCheck::Format(StringFormat::Email)));
                assert!(matches!(checks[1], TextCheck::Pattern { .. }));
                assert!(matches!(checks[2], TextCheck::Length(_)));
                assert!(matches!(checks[3], TextCheck::NameContent));
            }
            other => panic!("expected text field, got {:?}", other),
        }
    }

    #[test]
    fn test_name_check_only_for_name_vocabulary() {
        let validator = compile_json(json!({
            "title": {"type": "string"},
            "customer_name": {"type": "string"}
        }))
        .unwrap();

        let checks: Vec<usize> = validator
            .fields()
            .iter()
            .map(|f| match &f.kind {
                FieldKind::Text(checks) => checks.len(),
                _ => usize::MAX,
            })
            .collect();
        assert_eq!(checks, vec![0, 1]);
    }

    #[test]
    fn test_inapplicable_constraints_ignored() {
        let validator = compile_json(json!({
            "count": {"type": "integer", "pattern": "[", "format": "email"},
            "label": {"type": "string", "min": 1, "max": 2}
        }))
        .unwrap();
        assert_eq!(validator.len(), 2);
        assert!(matches!(validator.fields()[0].kind, FieldKind::Integer(_)));
        assert!(matches!(&validator.fields()[1].kind, FieldKind::Text(c) if c.is_empty()));
    }

    #[test]
    fn test_invalid_pattern_is_compile_error() {
        let err = compile_json(json!({"code": {"type": "string", "pattern": "("}})).unwrap_err();
        match err {
            EngineError::SchemaCompile { field, .. } => assert_eq!(field, "code"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_degrades_to_any() {
        let validator = compile_json(json!({"id": {"type": "uuid", "required": true}})).unwrap();
        assert!(matches!(validator.fields()[0].kind, FieldKind::Any));
        assert!(validator.fields()[0].required);
    }

    #[test]
    fn test_nested_compile_error_path() {
        let err = compile_json(json!({
            "user": {
                "type": "object",
                "properties": {"zip": {"type": "string", "pattern": "[0-9"}}
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("user.zip"));
    }

    #[test]
    fn test_array_items_any_is_heterogeneous() {
        let validator = compile_json(json!({
            "tags": {"type": "array", "items": {"type": "whatever"}, "max_length": 3}
        }))
        .unwrap();
        match &validator.fields()[0].kind {
            FieldKind::Array { items, bounds } => {
                assert!(items.is_none());
                assert_eq!(bounds.max, Some(3));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }
}
