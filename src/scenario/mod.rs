//! Declarative scenario files
//!
//! A scenario is a YAML description of a call chain: seed values, then
//! steps with paths, bodies and `{{key}}` placeholders, and the response
//! fields each step extracts. Scenarios compile into runner plans.

mod config;
mod loader;
pub mod template;

pub use config::*;
