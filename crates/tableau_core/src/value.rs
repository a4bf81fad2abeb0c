//! Loose-typing helpers over JSON values.
//!
//! State, custom variables and expression results are all `serde_json::Value`.
//! Documents are hand-edited, so numbers routinely arrive as strings and
//! booleans as `"true"`/`"false"`; these helpers apply one consistent set of
//! coercion rules everywhere.

use serde_json::{Number, Value as JsonValue};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Builds a JSON number, preferring an integer representation when exact.
///
/// Non-finite inputs have no JSON form and become `null`.
///
/// ```
/// use tableau_core::value::number;
///
/// assert_eq!(number(7.0), serde_json::json!(7));
/// assert_eq!(number(2.5), serde_json::json!(2.5));
/// ```
pub fn number(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        JsonValue::from(n as i64)
    } else {
        Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

/// Numeric view of a value (`NaN` when there is none).
pub fn to_number(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Null => 0.0,
        JsonValue::Bool(b) => f64::from(u8::from(*b)),
        JsonValue::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        JsonValue::String(s) => parse_number(s).unwrap_or(f64::NAN),
        JsonValue::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        JsonValue::Object(_) => f64::NAN,
    }
}

/// Parses a whole string as a decimal number.
///
/// Blank strings are zero. Rust-only spellings such as `inf` or `nan`
/// are rejected; `Infinity` and `0x` hex literals are accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    let valid = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && trimmed.chars().any(|c| c.is_ascii_digit());
    if !valid {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses the leading integer of a string, ignoring trailing garbage.
///
/// ```
/// use tableau_core::value::parse_int_prefix;
///
/// assert_eq!(parse_int_prefix("42px"), Some(42));
/// assert_eq!(parse_int_prefix("-3"), Some(-3));
/// assert_eq!(parse_int_prefix("abc"), None);
/// ```
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Coerces a textual argument to the most specific scalar it spells.
///
/// `"true"`/`"false"` become booleans, numeric text becomes a number and
/// everything else stays a string.
///
/// ```
/// use serde_json::json;
/// use tableau_core::value::coerce_scalar;
///
/// assert_eq!(coerce_scalar("true"), json!(true));
/// assert_eq!(coerce_scalar("12"), json!(12));
/// assert_eq!(coerce_scalar("intro"), json!("intro"));
/// ```
pub fn coerce_scalar(raw: &str) -> JsonValue {
    match raw {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        "" => JsonValue::String(String::new()),
        _ => match parse_number(raw) {
            Some(n) => number(n),
            None => JsonValue::String(raw.to_string()),
        },
    }
}

/// Truthiness as used by conditions.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Formats a number the way templates display it (`5`, not `5.0`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

/// Display string of a value as interpolated into text.
pub fn to_display_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_rejects_rust_only_spellings() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("0x10"), Some(16.0));
    }

    #[test]
    fn test_to_number_coercions() {
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!("4")), 4.0);
        assert!(to_number(&json!("four")).is_nan());
        assert_eq!(to_number(&json!([9])), 9.0);
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(to_display_string(&json!(3)), "3");
        assert_eq!(to_display_string(&json!(0.5)), "0.5");
        assert_eq!(to_display_string(&json!([1, null, "a"])), "1,,a");
        assert_eq!(to_display_string(&json!({"a": 1})), "[object Object]");
    }

    #[test]
    fn test_number_prefers_integers() {
        assert_eq!(number(3.0), json!(3));
        assert_eq!(number(f64::NAN), JsonValue::Null);
    }
}
