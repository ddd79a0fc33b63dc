//! Dotted-path lookup into JSON response bodies
//!
//! `data.booking.id` walks object keys; numeric segments index arrays
//! (`data.items.0.id`).

use serde_json::Value;

/// Find the value at `path`, if present
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Find a usable value at `path`: present, not null, not an empty string
pub fn lookup_present<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    lookup(root, path).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// Render a scalar as text for URLs and headers
///
/// Strings are returned without quotes; numbers and booleans use their JSON
/// form. Objects, arrays and null have no text form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON type name used in shape listings
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
