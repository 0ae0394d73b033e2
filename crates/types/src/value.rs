//! Utility functions for describing configuration values

use serde_json::Value;

/// Coarse kind of a JSON value, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Classify a JSON value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    /// Whether the kind is a scalar (anything but arrays and objects)
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

/// Describe a value for error messages: scalars are rendered as JSON,
/// collections only by their kind.
pub fn describe_value(value: &Value) -> String {
    let kind = ValueKind::of(value);
    if kind == ValueKind::Null {
        "null".to_string()
    } else if kind.is_scalar() {
        format!("{} {}", kind.as_str(), value)
    } else {
        kind.as_str().to_string()
    }
}
