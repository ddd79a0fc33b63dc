//! Schema inspection flow
//!
//! Logs in, fetches one endpoint and lists the shape of its `data` payload,
//! so API contract changes show up without reading raw JSON.

use serde_json::Value;

use crate::common::{Config, Result};
use crate::runner::{Plan, RunContext};

use super::booking::login_step;
use super::{get_step, keys};

/// Plan for inspecting `path`; the sample lands in the context under `sample`
pub fn schema_flow(config: &Config, path: &str) -> Result<(Plan, RunContext)> {
    let steps = vec![
        login_step(config)?,
        get_step("inspect", &format!("Fetch {}", path), path)?.extract(keys::SAMPLE, ["data"]),
    ];
    let plan = Plan::new("schema", steps, Vec::<String>::new())?;
    Ok((plan, RunContext::new()))
}

/// Dotted path and JSON type of every field in `value`
///
/// Arrays are described by their first element, marked with `[]`.
pub fn describe_shape(value: &Value) -> Vec<(String, &'static str)> {
    let mut fields = Vec::new();
    walk(value, String::new(), &mut fields);
    fields
}

fn walk(value: &Value, prefix: String, fields: &mut Vec<(String, &'static str)>) {
    if !prefix.is_empty() {
        fields.push((prefix.clone(), crate::runner::path::type_name(value)));
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                walk(child, path, fields);
            }
        }
        Value::Array(items) => {
            if let Some(first) = items.first() {
                walk(first, format!("{}[]", prefix), fields);
            }
        }
        _ => {}
    }
}
