//! Scenario file configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Overrides the configured base URL
    pub base_url: Option<String>,
    /// Default per-call timeout in seconds for this scenario
    pub timeout_secs: Option<u64>,
    /// Values placed in the run context before the first step
    #[serde(default)]
    pub seed: BTreeMap<String, SeedValue>,
    /// The sequence of calls to execute
    pub steps: Vec<ScenarioStep>,
}

/// A seed value: either a literal or read from the environment
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SeedValue {
    /// `{ env: NAME }`
    Env { env: String },
    /// Any literal JSON/YAML value
    Literal(Value),
}

/// A single call in the scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioStep {
    /// Unique step name, used in reports
    pub name: String,
    /// Human-readable description (defaults to the name)
    pub description: Option<String>,
    /// HTTP method (default: GET)
    #[serde(default = "default_method")]
    pub method: String,
    /// Path relative to the base URL; may contain `{{key}}` placeholders
    pub path: String,
    /// Context key holding the bearer token to send
    pub auth: Option<String>,
    /// Query parameters; values may contain placeholders
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Extra headers; values may contain placeholders
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body; string leaves may contain placeholders
    pub body: Option<Value>,
    /// Context key -> response path(s) to extract
    #[serde(default)]
    pub extract: BTreeMap<String, ExtractPaths>,
    /// Response expectations (default: 2xx with a success envelope)
    pub expect: Option<Expectation>,
    /// Per-call timeout in seconds
    pub timeout_secs: Option<u64>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// One path, or alternatives tried in order
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExtractPaths {
    One(String),
    Many(Vec<String>),
}

impl ExtractPaths {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ExtractPaths::One(path) => vec![path.clone()],
            ExtractPaths::Many(paths) => paths.clone(),
        }
    }
}

/// Expectations for a step's response
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Accepted HTTP status codes (default: any 2xx)
    pub status: Option<Vec<u16>>,
    /// Whether the body must be a `status: success` envelope (default: true)
    #[serde(default = "default_envelope")]
    pub envelope: bool,
}

fn default_envelope() -> bool {
    true
}
