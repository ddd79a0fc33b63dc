//! Dependent-call verification runner
//!
//! A [`Plan`] is an ordered list of [`CallStep`]s. Each step builds its
//! request from the [`RunContext`] filled by earlier steps, checks the
//! response, and extracts the values later steps need. The [`Runner`]
//! executes a plan strictly in order, stops at the first failure, and
//! returns a single [`Outcome`].

mod context;
mod execute;
mod outcome;
pub mod path;
mod plan;
pub mod redact;
mod step;

pub use context::{ContextSnapshot, RunContext};
pub use execute::{RunObserver, Runner};
pub use outcome::{FailureKind, Outcome, RunState, StepFailure, StepRecord};
pub use plan::Plan;
pub use step::{CallStep, Extraction, Extractor, RequestSpec, SuccessCheck};
