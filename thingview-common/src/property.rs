use core::fmt::Display;

use serde::Deserialize;
use serde_json::Value;

/// Declared JSON type of a property or action field.
///
/// Anything the schema doesn't name (or leaves out) is `Unknown` and is
/// handled as free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Option<String>")]
pub enum PropertyType {
    Boolean,
    Number,
    Integer,
    String,
    Object,
    Array,
    #[default]
    Unknown,
}

impl From<Option<String>> for PropertyType {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("boolean") => Self::Boolean,
            Some("number") => Self::Number,
            Some("integer") => Self::Integer,
            Some("string") => Self::String,
            Some("object") => Self::Object,
            Some("array") => Self::Array,
            _ => Self::Unknown,
        }
    }
}

impl PropertyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
            Self::Unknown => "unknown",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }

    /// Whether `value` may be displayed for a property of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
            Self::String => value.is_string(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Unknown => !value.is_null(),
        }
    }

    /// Parses the text of an input control into a value of this type.
    pub fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            Self::Boolean => match raw.trim() {
                "true" | "on" => Some(Value::Bool(true)),
                "false" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::Number => parse_number(raw, false),
            Self::Integer => parse_number(raw, true),
            Self::String | Self::Unknown => Some(Value::String(raw.to_owned())),
            Self::Object | Self::Array => {
                serde_json::from_str(raw).ok().filter(|value| self.accepts(value))
            }
        }
    }
}

impl Display for PropertyType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn parse_number(raw: &str, integer: bool) -> Option<Value> {
    let n = raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())?;

    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(Value::from(n as i64))
    } else if integer {
        None
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}

/// Text shown for a value; strings are shown without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
