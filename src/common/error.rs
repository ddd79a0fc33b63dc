//! Error types for the booking probe
//!
//! These errors cover everything that stops a run from starting: bad
//! configuration, unreadable scenario files, plans that violate the
//! dependency rules. Failures *during* a run are never errors; they are
//! reported as a failure [`Outcome`](crate::runner::Outcome).

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the booking probe
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Missing configuration value '{0}'. Set it in the config file or via {1}")]
    MissingSetting(&'static str, &'static str),

    // === Plan Errors ===
    #[error("Invalid plan '{plan}': {reason}")]
    InvalidPlan { plan: String, reason: String },

    #[error("Context key '{0}' was already written by an earlier step")]
    DuplicateContextKey(String),

    #[error("Context value '{0}' is not available")]
    MissingContextValue(String),

    #[error("Template error in '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("Unknown payment provider '{0}'. Supported providers: momo, zalopay")]
    UnknownProvider(String),

    // === Transport Setup Errors ===
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid plan error
    pub fn invalid_plan(plan: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPlan {
            plan: plan.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a template error
    pub fn template(template: &str, reason: impl Into<String>) -> Self {
        Self::Template {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
