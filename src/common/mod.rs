//! Common utilities shared by the CLI, the runner and the flows

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use error::{Error, Result};
