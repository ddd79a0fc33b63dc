//! The API's response envelope
//!
//! Every endpoint answers `{ status: "success" | "error", data, message? }`.
//! A non-`success` status is an application failure even on HTTP 2xx.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub status: Option<String>,
    #[serde(default)]
    pub data: Value,
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Interpret a body as an envelope; `None` if it is not a JSON object
    pub fn from_body(body: &Value) -> Option<Self> {
        if !body.is_object() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Best human-readable failure message found in a response body
///
/// Prefers the envelope's `message`, then an `error` string, then the raw
/// text of a non-JSON body.
pub fn failure_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(text) if !text.is_empty() => Some(text.chars().take(200).collect()),
        _ => None,
    }
}
