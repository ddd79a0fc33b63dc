//! Terminal results of a run

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::context::ContextSnapshot;

/// Classification of a failed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Connection refused, DNS failure, timeout: nothing usable came back
    TransportError,
    /// A well-formed response reporting a business-logic failure
    ApplicationError,
    /// The response succeeded but lacked a value the chain depends on
    ExtractionError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::TransportError => "TransportError",
            FailureKind::ApplicationError => "ApplicationError",
            FailureKind::ExtractionError => "ExtractionError",
        };
        f.write_str(name)
    }
}

/// A step that completed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub name: String,
    pub description: String,
    pub status: u16,
    /// Keys this step added to the context
    pub extracted: Vec<String>,
    #[serde(skip)]
    pub elapsed_ms: u128,
}

/// Where and why a run stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub step_index: usize,
    pub step_name: String,
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Context at the moment of failure
    pub context: ContextSnapshot,
    /// Steps that completed before the failure
    pub completed: Vec<StepRecord>,
}

/// Result of an entire run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        plan: String,
        context: ContextSnapshot,
        steps: Vec<StepRecord>,
    },
    Failure {
        plan: String,
        #[serde(flatten)]
        failure: StepFailure,
    },
}

/// Progress of a run; there are no transitions back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    InProgress { next_step: usize },
    Succeeded,
    FailedAt(usize),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn plan(&self) -> &str {
        match self {
            Outcome::Success { plan, .. } | Outcome::Failure { plan, .. } => plan,
        }
    }

    /// Final context (success) or context at the point of failure
    pub fn context(&self) -> &ContextSnapshot {
        match self {
            Outcome::Success { context, .. } => context,
            Outcome::Failure { failure, .. } => &failure.context,
        }
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { failure, .. } => Some(failure),
        }
    }

    /// Steps that completed
    pub fn completed(&self) -> &[StepRecord] {
        match self {
            Outcome::Success { steps, .. } => steps,
            Outcome::Failure { failure, .. } => &failure.completed,
        }
    }

    pub fn state(&self) -> RunState {
        match self {
            Outcome::Success { .. } => RunState::Succeeded,
            Outcome::Failure { failure, .. } => RunState::FailedAt(failure.step_index),
        }
    }

    /// Process exit code for standalone invocation
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
