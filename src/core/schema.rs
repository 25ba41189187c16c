//! Shallow schema validation for stage outputs.
//!
//! Each stage declares the fields its JSON output must carry. Validation is
//! one pass that collects every violation before failing, so operators see
//! the whole problem at once. Extra fields pass through untouched.

use serde_json::Value;
use thiserror::Error;

use crate::domain::report::StagePayload;

/// Expected runtime kind for a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Boolean,
    String,
    /// Checked as an array only; element types are not inspected
    StringArray,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::String => value.is_string(),
            FieldKind::StringArray => value.is_array(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::String => "string",
            FieldKind::StringArray => "array",
        }
    }
}

/// Runtime kind label for diagnostics.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A required field with its expected kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// One way a payload can violate its stage schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` expected {expected}, found {found}")]
    WrongKind {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Validation failure carrying every violation found, not just the first.
#[derive(Debug, Clone, Error)]
#[error("stage `{stage}` output failed validation: {}", list_violations(.violations))]
pub struct SchemaError {
    pub stage: String,
    pub violations: Vec<SchemaViolation>,
}

fn list_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a decoded stage output against its required fields.
///
/// Returns the payload only when every required field is present with the
/// declared kind; otherwise fails with the full violation list.
pub fn validate(
    stage: &str,
    value: Value,
    required: &[FieldSpec],
) -> Result<StagePayload, SchemaError> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(SchemaError {
                stage: stage.to_string(),
                violations: vec![SchemaViolation::NotAnObject(kind_of(&other))],
            });
        }
    };

    let mut violations = Vec::new();
    for field in required {
        match map.get(field.name) {
            None => violations.push(SchemaViolation::MissingField(field.name.to_string())),
            Some(value) if !field.kind.matches(value) => {
                violations.push(SchemaViolation::WrongKind {
                    field: field.name.to_string(),
                    expected: field.kind.name(),
                    found: kind_of(value),
                });
            }
            Some(_) => {}
        }
    }

    if violations.is_empty() {
        Ok(StagePayload::new(map))
    } else {
        Err(SchemaError {
            stage: stage.to_string(),
            violations,
        })
    }
}
