//! Call step definitions
//!
//! A [`CallStep`] pairs a request builder with a success check and an
//! extractor. The builder reads the run context; the extractor produces
//! the values later steps read.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::common::Result;
use crate::http::{ApiEnvelope, HttpResponse};

use super::context::RunContext;
use super::path;

/// Method, path and payload of a request, before the base URL is applied
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path joined onto the base URL; absolute `http(s)://` URLs are used as-is
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Context key whose value is sent as `Authorization: Bearer <value>`
    pub bearer: Option<String>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, context_key: impl Into<String>) -> Self {
        self.bearer = Some(context_key.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Builds a step's request from the values gathered so far
pub type RequestBuilder = Arc<dyn Fn(&RunContext) -> Result<RequestSpec> + Send + Sync>;

/// Custom extraction: response body to `(key, value)` pairs, or a reason
pub type ExtractFn = Arc<dyn Fn(&Value) -> std::result::Result<Vec<(String, Value)>, String> + Send + Sync>;

/// Custom success predicate over the whole response
pub type CheckFn = Arc<dyn Fn(&HttpResponse) -> bool + Send + Sync>;

/// One context value pulled out of a response body
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub key: String,
    /// Dotted paths tried in order; the first present value wins
    pub paths: Vec<String>,
}

impl Extraction {
    pub fn new<I, S>(key: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a step's response is turned into context values
#[derive(Clone)]
pub enum Extractor {
    Fields(Vec<Extraction>),
    Custom { provides: Vec<String>, extract: ExtractFn },
}

impl Extractor {
    /// Keys this extractor writes into the context
    pub fn provides(&self) -> Vec<&str> {
        match self {
            Extractor::Fields(fields) => fields.iter().map(|f| f.key.as_str()).collect(),
            Extractor::Custom { provides, .. } => provides.iter().map(String::as_str).collect(),
        }
    }

    /// Run the extractor; the error describes what was missing
    pub fn extract(&self, body: &Value) -> std::result::Result<Vec<(String, Value)>, String> {
        match self {
            Extractor::Fields(fields) => fields
                .iter()
                .map(|field| {
                    field
                        .paths
                        .iter()
                        .find_map(|p| path::lookup_present(body, p))
                        .map(|v| (field.key.clone(), v.clone()))
                        .ok_or_else(|| {
                            format!(
                                "response has no `{}` (needed for '{}')",
                                field.paths.join("` or `"),
                                field.key
                            )
                        })
                })
                .collect(),
            Extractor::Custom { provides, extract } => {
                let values = extract(body)?;
                if let Some(missing) = provides
                    .iter()
                    .find(|key| !values.iter().any(|(k, _)| k == *key))
                {
                    return Err(format!("extractor did not produce '{}'", missing));
                }
                Ok(values)
            }
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Extractor::Custom { provides, .. } => {
                f.debug_struct("Custom").field("provides", provides).finish_non_exhaustive()
            }
        }
    }
}

/// Success predicate for a step's response
#[derive(Clone, Default)]
pub enum SuccessCheck {
    /// HTTP 2xx and envelope `status == "success"`
    #[default]
    Envelope,
    /// HTTP 2xx only
    HttpStatus,
    /// Status in an explicit set, optionally also requiring the envelope
    Statuses { codes: Vec<u16>, envelope: bool },
    Custom(CheckFn),
}

impl SuccessCheck {
    pub fn passes(&self, response: &HttpResponse) -> bool {
        match self {
            SuccessCheck::Envelope => response.is_success_status() && envelope_ok(&response.body),
            SuccessCheck::HttpStatus => response.is_success_status(),
            SuccessCheck::Statuses { codes, envelope } => {
                codes.contains(&response.status) && (!envelope || envelope_ok(&response.body))
            }
            SuccessCheck::Custom(check) => check(response),
        }
    }
}

fn envelope_ok(body: &Value) -> bool {
    ApiEnvelope::from_body(body).is_some_and(|env| env.is_success())
}

impl fmt::Debug for SuccessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessCheck::Envelope => write!(f, "Envelope"),
            SuccessCheck::HttpStatus => write!(f, "HttpStatus"),
            SuccessCheck::Statuses { codes, envelope } => f
                .debug_struct("Statuses")
                .field("codes", codes)
                .field("envelope", envelope)
                .finish(),
            SuccessCheck::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// One unit of a dependent call chain
#[derive(Clone)]
pub struct CallStep {
    pub name: String,
    pub description: String,
    /// Context keys the request builder reads
    pub requires: Vec<String>,
    pub build: RequestBuilder,
    pub extractor: Extractor,
    pub check: SuccessCheck,
    /// Overrides the runner's default timeout
    pub timeout: Option<Duration>,
}

impl CallStep {
    /// Create a step with the default envelope check and no extraction
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, build: F) -> Self
    where
        F: Fn(&RunContext) -> Result<RequestSpec> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            requires: Vec::new(),
            build: Arc::new(build),
            extractor: Extractor::Fields(Vec::new()),
            check: SuccessCheck::default(),
            timeout: None,
        }
    }

    pub fn requires<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Extract `key` from the first of `paths` present in the response body
    ///
    /// Replaces a custom extractor if one was set.
    pub fn extract<I, S>(mut self, key: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extraction = Extraction::new(key, paths);
        match &mut self.extractor {
            Extractor::Fields(fields) => fields.push(extraction),
            Extractor::Custom { .. } => self.extractor = Extractor::Fields(vec![extraction]),
        }
        self
    }

    pub fn extract_with<F>(mut self, provides: &[&str], extract: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Vec<(String, Value)>, String> + Send + Sync + 'static,
    {
        self.extractor = Extractor::Custom {
            provides: provides.iter().map(|k| k.to_string()).collect(),
            extract: Arc::new(extract),
        };
        self
    }

    pub fn check(mut self, check: SuccessCheck) -> Self {
        self.check = check;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn provides(&self) -> Vec<&str> {
        self.extractor.provides()
    }
}

impl fmt::Debug for CallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStep")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("extractor", &self.extractor)
            .field("check", &self.check)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
