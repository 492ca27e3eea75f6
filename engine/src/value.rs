//! Blank-value checks for payload fields.

use serde_json::Value;

/// Returns true when a field holds no meaningful value.
///
/// A missing field, `null`, an empty string, a numeric zero, `false`, an
/// empty array and an empty object are all blank. Strings are never
/// inspected beyond their length, so `"0"` and `" "` are not blank.
///
/// A numeric string is never parsed: `"0"` keeps its value under fill-only
/// rules, and only a JSON number can be a blank zero.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f == 0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}
