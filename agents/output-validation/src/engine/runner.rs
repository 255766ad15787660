//! Structural validation runner
//!
//! Executes a [`CompiledValidator`] against a record. Every violated
//! constraint becomes one [`StructuralError`] with a dotted path, a kind
//! token, the raw validator message and a synthesized suggestion. Bad data
//! never fails the call; only a non-object record does.

use serde_json::{Map, Number, Value};

use super::compiler::{
    join_path, CompiledValidator, FieldKind, LengthBounds, NumericBounds, TextCheck,
};
use super::rules::{validate_name_content, StringFormat};
use crate::contracts::schemas::json_type_name;
use crate::contracts::{ErrorKind, StructuralError, StructuralResult};
use crate::error::{EngineError, Result};

/// Context needed to phrase a suggestion for one failure
#[derive(Debug, Clone)]
enum Hint {
    Required,
    Type(&'static str),
    Format(StringFormat),
    Pattern(String),
    Chars(LengthBounds),
    Items(LengthBounds),
    Range(NumericBounds),
    Name,
}

#[derive(Debug, Clone)]
struct Violation {
    path: String,
    kind: ErrorKind,
    message: String,
    hint: Hint,
}

impl Violation {
    fn new(path: &str, kind: ErrorKind, message: impl Into<String>, hint: Hint) -> Self {
        Self {
            path: path.to_string(),
            kind,
            message: message.into(),
            hint,
        }
    }

    fn into_error(self) -> StructuralError {
        let suggestion = suggest(&self.path, &self.hint);
        StructuralError {
            loc: self.path,
            kind: self.kind,
            msg: self.message,
            suggestion: Some(suggestion),
        }
    }
}

/// Run a compiled validator against a record.
///
/// Returns the structural result together with the normalized record when
/// valid, or the unmodified input when not.
pub fn run(validator: &CompiledValidator, record: &Value) -> Result<(StructuralResult, Value)> {
    let map = record.as_object().ok_or_else(|| {
        EngineError::input_shape(format!(
            "data must be a JSON object, found {}",
            json_type_name(record)
        ))
    })?;

    let mut violations = Vec::new();
    let normalized = check_record(validator, "", map, &mut violations);

    if violations.is_empty() {
        Ok((StructuralResult::valid(), Value::Object(normalized)))
    } else {
        let errors = violations.into_iter().map(Violation::into_error).collect();
        Ok((StructuralResult::from_errors(errors), record.clone()))
    }
}

/// Fields not named by the validator are dropped from the result
fn check_record(
    validator: &CompiledValidator,
    prefix: &str,
    record: &Map<String, Value>,
    out: &mut Vec<Violation>,
) -> Map<String, Value> {
    let mut normalized = Map::new();
    for field in validator.fields() {
        let path = join_path(prefix, &field.name);
        let value = match record.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    out.push(Violation::new(
                        &path,
                        ErrorKind::MissingRequired,
                        "Field required",
                        Hint::Required,
                    ));
                }
                Value::Null
            }
            Some(value) => check_value(&field.kind, &path, value, out),
        };
        normalized.insert(field.name.clone(), value);
    }
    normalized
}

fn check_value(kind: &FieldKind, path: &str, value: &Value, out: &mut Vec<Violation>) -> Value {
    match kind {
        FieldKind::Any => value.clone(),
        FieldKind::Text(checks) => match value {
            Value::String(text) => {
                if let Some(violation) = first_text_violation(checks, path, text) {
                    out.push(violation);
                }
                value.clone()
            }
            _ => wrong_type(path, "Input should be a valid string", kind, value, out),
        },
        FieldKind::Number(bounds) => match coerce_number(value) {
            Some(n) => {
                check_range(path, n, bounds, out);
                Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
            }
            None => wrong_type(
                path,
                number_message(value, "number", "unable to parse string as a number"),
                kind,
                value,
                out,
            ),
        },
        FieldKind::Integer(bounds) => match coerce_integer(value) {
            Ok(n) => {
                check_range(path, n as f64, bounds, out);
                Value::from(n)
            }
            Err(message) => wrong_type(path, message, kind, value, out),
        },
        FieldKind::Boolean => match coerce_bool(value) {
            Some(b) => Value::Bool(b),
            None => wrong_type(path, "Input should be a valid boolean", kind, value, out),
        },
        FieldKind::Array { items, bounds } => match value {
            Value::Array(elements) => {
                if let Some(message) = length_violation(elements.len(), bounds, "List", "item") {
                    out.push(Violation::new(
                        path,
                        ErrorKind::LengthViolation,
                        message,
                        Hint::Items(*bounds),
                    ));
                }
                match items {
                    Some(item_kind) => Value::Array(
                        elements
                            .iter()
                            .enumerate()
                            .map(|(i, element)| {
                                check_value(item_kind, &format!("{}.{}", path, i), element, out)
                            })
                            .collect(),
                    ),
                    None => value.clone(),
                }
            }
            _ => wrong_type(path, "Input should be a valid list", kind, value, out),
        },
        FieldKind::Object(nested) => match (value, nested) {
            (Value::Object(map), Some(nested)) => {
                Value::Object(check_record(nested, path, map, out))
            }
            (Value::Object(_), None) => value.clone(),
            _ => wrong_type(path, "Input should be a valid dictionary", kind, value, out),
        },
    }
}

fn wrong_type(
    path: &str,
    message: impl Into<String>,
    kind: &FieldKind,
    value: &Value,
    out: &mut Vec<Violation>,
) -> Value {
    out.push(Violation::new(
        path,
        ErrorKind::WrongType,
        message,
        Hint::Type(kind.type_name()),
    ));
    value.clone()
}

/// Only the first failing check of a string is reported
fn first_text_violation(checks: &[TextCheck], path: &str, text: &str) -> Option<Violation> {
    checks.iter().find_map(|check| match check {
        TextCheck::Format(format) => format.check(text).err().map(|message| {
            Violation::new(path, ErrorKind::FormatInvalid, message, Hint::Format(*format))
        }),
        TextCheck::Pattern { regex, source } => (!regex.is_match(text)).then(|| {
            Violation::new(
                path,
                ErrorKind::PatternMismatch,
                format!("String should match pattern '{}'", source),
                Hint::Pattern(source.clone()),
            )
        }),
        TextCheck::Length(bounds) => {
            length_violation(text.chars().count(), bounds, "String", "character").map(|message| {
                Violation::new(path, ErrorKind::LengthViolation, message, Hint::Chars(*bounds))
            })
        }
        TextCheck::NameContent => validate_name_content(text).err().map(|rejection| {
            Violation::new(
                path,
                ErrorKind::NameContentInvalid,
                format!("Value error, {}", rejection),
                Hint::Name,
            )
        }),
    })
}

fn length_violation(
    count: usize,
    bounds: &LengthBounds,
    subject: &str,
    unit: &str,
) -> Option<String> {
    if let Some(min) = bounds.min.filter(|min| count < *min) {
        return Some(format!(
            "{} should have at least {} {}",
            subject,
            min,
            plural(unit, min)
        ));
    }
    bounds.max.filter(|max| count > *max).map(|max| {
        format!("{} should have at most {} {}", subject, max, plural(unit, max))
    })
}

fn check_range(path: &str, n: f64, bounds: &NumericBounds, out: &mut Vec<Violation>) {
    let message = match (bounds.min, bounds.max) {
        (Some(min), _) if n < min => format!(
            "Input should be greater than or equal to {}",
            format_bound(min)
        ),
        (_, Some(max)) if n > max => format!(
            "Input should be less than or equal to {}",
            format_bound(max)
        ),
        _ => return,
    };
    out.push(Violation::new(
        path,
        ErrorKind::OutOfRange,
        message,
        Hint::Range(*bounds),
    ));
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(f as i64)
                }
                Some(f) if f.fract() != 0.0 => Err(
                    "Input should be a valid integer, got a number with a fractional part"
                        .to_string(),
                ),
                _ => Err("Input should be a valid integer".to_string()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            "Input should be a valid integer, unable to parse string as an integer".to_string()
        }),
        _ => Err("Input should be a valid integer".to_string()),
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" | "y" | "t" => Some(true),
            "false" | "no" | "0" | "off" | "n" | "f" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn number_message(value: &Value, expected: &str, parse_failure: &str) -> String {
    if value.is_string() {
        format!("Input should be a valid {}, {}", expected, parse_failure)
    } else {
        format!("Input should be a valid {}", expected)
    }
}

/// Human suggestion for a failure, derived from its kind and context
fn suggest(path: &str, hint: &Hint) -> String {
    match hint {
        Hint::Required => format!("add the required field '{}'", path),
        Hint::Type("integer") => "must be a whole number".to_string(),
        Hint::Type("list") => "must be a list".to_string(),
        Hint::Type("object") => "must be an object".to_string(),
        Hint::Type(name) => format!("must be a {}", name),
        Hint::Format(StringFormat::Email) => {
            "must be a valid email address, e.g. user@example.com".to_string()
        }
        Hint::Format(StringFormat::Date) => {
            "must be a valid date in YYYY-MM-DD format, e.g. 2024-01-31".to_string()
        }
        Hint::Format(StringFormat::Phone) => format!(
            "must be a phone number with {} to {} digits",
            super::rules::formats::PHONE_DIGITS.start(),
            super::rules::formats::PHONE_DIGITS.end()
        ),
        Hint::Pattern(source) => format!("must match the pattern '{}'", source),
        Hint::Chars(bounds) => describe_count(bounds, "character"),
        Hint::Items(bounds) => describe_count(bounds, "item"),
        Hint::Range(bounds) => match (bounds.min, bounds.max) {
            (Some(min), Some(max)) => format!(
                "must be between {} and {}",
                format_bound(min),
                format_bound(max)
            ),
            (Some(min), None) => format!("must be at least {}", format_bound(min)),
            (None, Some(max)) => format!("must be at most {}", format_bound(max)),
            (None, None) => "must be within the allowed range".to_string(),
        },
        Hint::Name => "must be a real person's name, e.g. John Smith".to_string(),
    }
}

fn describe_count(bounds: &LengthBounds, unit: &str) -> String {
    match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => format!("must have between {} and {} {}s", min, max, unit),
        (Some(min), None) => format!("must have at least {} {}", min, plural(unit, min)),
        (None, Some(max)) => format!("must have at most {} {}", max, plural(unit, max)),
        (None, None) => format!("must have a valid number of {}s", unit),
    }
}

fn plural(unit: &str, count: usize) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}

/// Integral bounds print without a trailing `.0`
fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Schema;
    use crate::engine::compiler::compile;
    use serde_json::json;

    fn run_json(schema: Value, data: Value) -> (StructuralResult, Value) {
        let schema = Schema::from_json(&schema).unwrap();
        let validator = compile(&schema).unwrap();
        run(&validator, &data).unwrap()
    }

    #[test]
    fn test_valid_email() {
        let (result, normalized) = run_json(
            json!({"email": {"type": "string", "required": true, "format": "email"}}),
            json!({"email": "user@example.com"}),
        );
        assert!(result.is_structurally_valid);
        assert!(result.errors.is_empty());
        assert!(result.suggestions.is_empty());
        assert_eq!(normalized, json!({"email": "user@example.com"}));
    }

    #[test]
    fn test_invalid_email() {
        let data = json!({"email": "not-an-email"});
        let (result, returned) = run_json(
            json!({"email": {"type": "string", "required": true, "format": "email"}}),
            data.clone(),
        );
        assert!(!result.is_structurally_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].loc, "email");
        assert_eq!(result.errors[0].kind, ErrorKind::FormatInvalid);
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("must be a valid email address, e.g. user@example.com")
        );
        assert_eq!(returned, data);
    }

    #[test]
    fn test_out_of_range() {
        let (result, _) = run_json(
            json!({"count": {"type": "integer", "required": true, "min": 1, "max": 10}}),
            json!({"count": 20}),
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::OutOfRange);
        assert_eq!(result.errors[0].msg, "Input should be less than or equal to 10");
        assert_eq!(result.suggestions, vec!["must be between 1 and 10".to_string()]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let schema = json!({"count": {"type": "integer", "min": 1, "max": 10}});
        assert!(run_json(schema.clone(), json!({"count": 1})).0.is_structurally_valid);
        assert!(run_json(schema.clone(), json!({"count": 10})).0.is_structurally_valid);
        assert!(!run_json(schema, json!({"count": 0})).0.is_structurally_valid);
    }

    #[test]
    fn test_missing_and_null_required() {
        let schema = json!({"id": {"type": "string", "required": true}});
        for data in [json!({}), json!({"id": null})] {
            let (result, _) = run_json(schema.clone(), data);
            assert_eq!(result.errors[0].kind, ErrorKind::MissingRequired);
            assert_eq!(result.errors[0].msg, "Field required");
            assert_eq!(result.errors[0].loc, "id");
        }
    }

    #[test]
    fn test_wrong_type_suggestion() {
        let (result, _) = run_json(
            json!({"title": {"type": "string"}}),
            json!({"title": 42}),
        );
        assert_eq!(result.errors[0].kind, ErrorKind::WrongType);
        assert_eq!(result.errors[0].msg, "Input should be a valid string");
        assert_eq!(result.errors[0].suggestion.as_deref(), Some("must be a string"));
    }

    #[test]
    fn test_first_failing_string_check_reported() {
        let (result, _) = run_json(
            json!({"email": {"type": "string", "format": "email", "min_length": 50}}),
            json!({"email": "nope"}),
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::FormatInvalid);
    }

    #[test]
    fn test_every_failing_field_reported() {
        let (result, _) = run_json(
            json!({
                "name": {"type": "string", "min_length": 3},
                "price": {"type": "number", "min": 0},
                "qty": {"type": "integer", "max": 100}
            }),
            json!({"name": "A", "price": -5, "qty": 500}),
        );
        let locs: Vec<&str> = result.errors.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(locs, vec!["name", "price", "qty"]);
    }

    #[test]
    fn test_pattern_must_match_fully() {
        let schema = json!({"code": {"type": "string", "pattern": "[A-Z]{3}"}});
        assert!(run_json(schema.clone(), json!({"code": "ABC"})).0.is_structurally_valid);
        let (result, _) = run_json(schema, json!({"code": "ABCD"}));
        assert_eq!(result.errors[0].kind, ErrorKind::PatternMismatch);
        assert_eq!(result.errors[0].msg, "String should match pattern '[A-Z]{3}'");
    }

    #[test]
    fn test_date_format() {
        let schema = json!({"due": {"type": "string", "format": "date"}});
        assert!(run_json(schema.clone(), json!({"due": "2024-02-29"})).0.is_structurally_valid);
        let (result, _) = run_json(schema, json!({"due": "2023-01-45"}));
        assert_eq!(result.errors[0].kind, ErrorKind::FormatInvalid);
    }

    #[test]
    fn test_name_content_check() {
        let schema = json!({"customer_name": {"type": "string"}});
        assert!(run_json(schema.clone(), json!({"customer_name": "John Smith"}))
            .0
            .is_structurally_valid);
        let (result, _) = run_json(schema, json!({"customer_name": "qwertyuiop"}));
        assert_eq!(result.errors[0].kind, ErrorKind::NameContentInvalid);
        assert!(result.errors[0].msg.starts_with("Value error, "));
    }

    #[test]
    fn test_coercion_in_normalized_record() {
        let (result, normalized) = run_json(
            json!({
                "age": {"type": "integer"},
                "price": {"type": "number"},
                "active": {"type": "boolean"},
                "note": {"type": "string"}
            }),
            json!({"age": "42", "price": "9.5", "active": "yes", "extra": 1}),
        );
        assert!(result.is_structurally_valid);
        assert_eq!(
            normalized,
            json!({"age": 42, "price": 9.5, "active": true, "note": null})
        );
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let (result, _) = run_json(json!({"n": {"type": "integer"}}), json!({"n": 1.5}));
        assert_eq!(result.errors[0].kind, ErrorKind::WrongType);
        assert!(result.errors[0].msg.contains("fractional part"));

        let (result, normalized) = run_json(json!({"n": {"type": "integer"}}), json!({"n": 5.0}));
        assert!(result.is_structurally_valid);
        assert_eq!(normalized, json!({"n": 5}));
    }

    #[test]
    fn test_string_never_coerced() {
        let (result, _) = run_json(json!({"s": {"type": "string"}}), json!({"s": true}));
        assert!(!result.is_structurally_valid);
    }

    #[test]
    fn test_array_items_and_length() {
        let schema = json!({
            "scores": {"type": "array", "items": {"type": "integer"}, "min_length": 2}
        });
        let (result, _) = run_json(schema.clone(), json!({"scores": ["x"]}));
        let locs: Vec<&str> = result.errors.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(locs, vec!["scores", "scores.0"]);
        assert_eq!(result.errors[0].kind, ErrorKind::LengthViolation);
        assert_eq!(result.errors[0].msg, "List should have at least 2 items");

        let (result, _) = run_json(schema, json!({"scores": "1,2"}));
        assert_eq!(result.errors[0].kind, ErrorKind::WrongType);
        assert_eq!(result.errors[0].suggestion.as_deref(), Some("must be a list"));
    }

    #[test]
    fn test_nested_paths() {
        let (result, _) = run_json(
            json!({
                "user": {
                    "type": "object",
                    "required": true,
                    "properties": {
                        "email": {"type": "string", "format": "email", "required": true}
                    }
                },
                "order": {
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {"quantity": {"type": "integer", "min": 1}}
                            }
                        }
                    }
                }
            }),
            json!({
                "user": {"email": "broken"},
                "order": {"items": [{"quantity": 2}, {"quantity": 0}]}
            }),
        );
        let locs: Vec<&str> = result.errors.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(locs, vec!["user.email", "order.items.1.quantity"]);
    }

    #[test]
    fn test_non_object_record_is_error() {
        let validator = compile(&Schema::new()).unwrap();
        let err = run(&validator, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, EngineError::InputShape(_)));
    }
}
