//! Runtime values.

use serde_json::{Map, Value as JsonValue};
use tableau_core::value::{format_number, number, parse_number, to_display_string};

/// Functions callable from expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `custom.get(key)`
    CustomGet,
}

/// An evaluated expression value.
///
/// Mirrors the JavaScript value space closely enough for conditions and
/// templates: `undefined` is distinct from `null`, numbers are `f64` and may
/// be `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing member or explicit `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Array of JSON values
    Array(Vec<JsonValue>),
    /// Plain object
    Object(Map<String, JsonValue>),
    /// The `custom` namespace
    Custom,
    /// A callable builtin
    Function(Builtin),
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(items.clone()),
            JsonValue::Object(map) => Value::Object(map.clone()),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Array(items) => Value::Array(items),
            JsonValue::Object(map) => Value::Object(map),
            JsonValue::String(s) => Value::String(s),
            other => Value::from(&other),
        }
    }
}

impl Value {
    /// JavaScript truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Custom | Value::Function(_) => true,
        }
    }

    /// True for `null` and `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// True for values that are not objects.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// Numeric conversion (`Number(v)`).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_display()),
            Value::Object(_) | Value::Custom | Value::Function(_) => f64::NAN,
        }
    }

    /// String conversion (`String(v)`).
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => to_display_string(&JsonValue::Array(items.clone())),
            Value::Object(_) | Value::Custom => "[object Object]".to_string(),
            Value::Function(_) => "function () { [native code] }".to_string(),
        }
    }

    /// Primitive used by `+`, relational operators and loose equality
    /// against a primitive: objects become their display string.
    pub fn to_primitive(&self) -> Value {
        if self.is_primitive() {
            self.clone()
        } else {
            Value::String(self.to_display())
        }
    }

    /// JSON form. `undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.clone()),
            Value::Object(map) => JsonValue::Object(map.clone()),
            Value::Custom => JsonValue::Object(Map::new()),
        }
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) | Value::Custom => "object",
            Value::Function(_) => "function",
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    if s.trim().is_empty() {
        0.0
    } else {
        parse_number(s).unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_conversions() {
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert_eq!(Value::String(" 12 ".into()).to_number(), 12.0);
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Array(vec![json!(4)]).to_number(), 4.0);
        assert!(Value::Array(vec![json!(1), json!(2)]).to_number().is_nan());
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(Value::Number(3.0).to_display(), "3");
        assert_eq!(Value::Undefined.to_display(), "undefined");
        assert_eq!(Value::Number(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(Value::from(json!({"a": 1})).to_display(), "[object Object]");
    }
}
