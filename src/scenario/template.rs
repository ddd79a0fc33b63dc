//! `{{key}}` placeholder substitution
//!
//! Placeholders are filled from the run context. Inside a longer string
//! the value's text form is spliced in; a string that is exactly one
//! placeholder is replaced by the raw JSON value, so numbers and objects
//! keep their type in request bodies.

use serde_json::Value;

use crate::common::{Error, Result};
use crate::runner::RunContext;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A parsed piece of a template string
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Key(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or_else(|| Error::template(template, "unterminated '{{'"))?;
        let key = after_open[..end].trim();
        if key.is_empty() {
            return Err(Error::template(template, "empty placeholder"));
        }
        segments.push(Segment::Key(key));
        rest = &after_open[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

/// Context keys referenced by a template string
pub fn placeholders(template: &str) -> Result<Vec<String>> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|s| match s {
            Segment::Key(k) => Some(k.to_string()),
            Segment::Text(_) => None,
        })
        .collect())
}

/// Context keys referenced anywhere in a JSON value's string leaves
pub fn value_placeholders(value: &Value) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    collect(value, &mut keys)?;
    Ok(keys)
}

fn collect(value: &Value, keys: &mut Vec<String>) -> Result<()> {
    match value {
        Value::String(s) => keys.extend(placeholders(s)?),
        Value::Array(items) => {
            for item in items {
                collect(item, keys)?;
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, keys)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Fill a template string with context values' text
pub fn render_str(template: &str, ctx: &RunContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Key(key) => out.push_str(&ctx.text(key)?),
        }
    }
    Ok(out)
}

/// Fill every string leaf of a JSON value
pub fn render_value(value: &Value, ctx: &RunContext) -> Result<Value> {
    match value {
        Value::String(s) => {
            let segments = parse(s)?;
            if let [Segment::Key(key)] = segments.as_slice() {
                return Ok(ctx.value(key)?.clone());
            }
            render_str(s, ctx).map(Value::String)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), render_value(v, ctx)?)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}
