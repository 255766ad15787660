//! Schema definitions for record validation
//!
//! A caller describes the expected shape of a record as a JSON mapping of
//! field name to field definition. This module normalizes that mapping into
//! the canonical [`Schema`] / [`FieldSpec`] model at the boundary, so the
//! compiler never has to care how the definition was written.
//!
//! Accepted field keys: `type`, `required`, `description`,
//! `min_length`/`minLength`, `max_length`/`maxLength`, `pattern`, `format`,
//! `min`/`minimum`, `max`/`maximum`, `items`, `properties`. Unknown keys are
//! ignored.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{EngineError, Result};

/// Field types understood by the schema compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Unconstrained; used when `type` is absent or not recognized
    Any,
}

impl FieldType {
    /// Map a schema `type` token. Unrecognized tokens degrade to `Any`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => FieldType::String,
            "number" | "float" | "double" => FieldType::Number,
            "integer" | "int" => FieldType::Integer,
            "boolean" | "bool" => FieldType::Boolean,
            "array" | "list" => FieldType::Array,
            "object" | "dict" | "map" => FieldType::Object,
            _ => FieldType::Any,
        }
    }

    /// Schema token for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    /// Whether numeric bounds apply to this type
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Integer)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints for a single schema field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Minimum character count (strings) or item count (arrays)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum character count (strings) or item count (arrays)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression the whole string must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Semantic string format tag (`email`, `date`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Inclusive lower bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Element definition for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,

    /// Nested field definitions for objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Schema>,
}

impl FieldSpec {
    /// Create an optional field of the given type with no constraints
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            description: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            min: None,
            max: None,
            items: None,
            properties: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_items(mut self, items: FieldSpec) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_properties(mut self, properties: Schema) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Normalize one JSON field definition.
    ///
    /// `path` is only used for error reporting.
    pub fn from_json(path: &str, value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            EngineError::schema_compile(path, "field definition must be an object")
        })?;

        let field_type = match obj.get("type") {
            None | Some(Value::Null) => FieldType::Any,
            Some(Value::String(token)) => FieldType::from_token(token),
            Some(other) => {
                return Err(EngineError::schema_compile(
                    path,
                    format!("'type' must be a string, found {}", json_type_name(other)),
                ))
            }
        };

        let required = match obj.get("required") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(EngineError::schema_compile(
                    path,
                    format!("'required' must be a boolean, found {}", json_type_name(other)),
                ))
            }
        };

        let items = match obj.get("items") {
            None | Some(Value::Null) => None,
            Some(items) => Some(Box::new(Self::from_json(&format!("{}.items", path), items)?)),
        };

        let properties = match obj.get("properties") {
            None | Some(Value::Null) => None,
            Some(props) => Some(Schema::from_json_at(path, props)?),
        };

        Ok(Self {
            field_type,
            required,
            description: string_key(obj, path, &["description"])?,
            min_length: length_key(obj, path, &["min_length", "minLength"])?,
            max_length: length_key(obj, path, &["max_length", "maxLength"])?,
            pattern: string_key(obj, path, &["pattern"])?,
            format: string_key(obj, path, &["format"])?.map(|f| f.to_ascii_lowercase()),
            min: number_key(obj, path, &["min", "minimum"])?,
            max: number_key(obj, path, &["max", "maximum"])?,
            items,
            properties,
        })
    }
}

/// Ordered mapping of field name to [`FieldSpec`]
///
/// Names are unique; re-adding a name replaces the previous definition in
/// place. Declaration order only matters for deterministic error ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field definition
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Add or replace a field definition
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name, spec)),
        }
    }

    /// Normalize a caller-supplied JSON schema description
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_at("", value)
    }

    fn from_json_at(prefix: &str, value: &Value) -> Result<Self> {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None if prefix.is_empty() => {
                return Err(EngineError::input_shape(format!(
                    "schema must be a JSON object, found {}",
                    json_type_name(value)
                )))
            }
            None => {
                return Err(EngineError::schema_compile(
                    prefix,
                    format!("'properties' must be an object, found {}", json_type_name(value)),
                ))
            }
        };

        let mut schema = Schema::new();
        for (name, definition) in obj {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            schema.insert(name.clone(), FieldSpec::from_json(&path, definition)?);
        }
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Names of fields marked `required`, in declaration order
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, spec) in &self.fields {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

/// JSON type name used in messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&'a str]) -> Option<(&'a str, &'a Value)> {
    keys.iter().find_map(|key| match obj.get(*key) {
        None | Some(Value::Null) => None,
        Some(value) => Some((*key, value)),
    })
}

fn string_key(obj: &Map<String, Value>, path: &str, keys: &[&str]) -> Result<Option<String>> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.clone())),
        Some((key, other)) => Err(EngineError::schema_compile(
            path,
            format!("'{}' must be a string, found {}", key, json_type_name(other)),
        )),
    }
}

fn length_key(obj: &Map<String, Value>, path: &str, keys: &[&str]) -> Result<Option<usize>> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((key, value)) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                EngineError::schema_compile(
                    path,
                    format!("'{}' must be a non-negative integer", key),
                )
            }),
    }
}

fn number_key(obj: &Map<String, Value>, path: &str, keys: &[&str]) -> Result<Option<f64>> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((key, value)) => value.as_f64().map(Some).ok_or_else(|| {
            EngineError::schema_compile(path, format!("'{}' must be a number", key))
        }),
    }
}
