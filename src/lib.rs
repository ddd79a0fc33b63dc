//! Booking Probe - dependent-call verification for the booking/payment API
//!
//! This library runs ordered chains of HTTP calls where each response
//! feeds the next request, and reports a single pass/fail outcome.

pub mod cli;
pub mod commands;
pub mod common;
pub mod flows;
pub mod http;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use runner::{CallStep, FailureKind, Outcome, Plan, RequestSpec, RunContext, Runner};
