use crate::Error;
use std::fmt;

/// Coarse classification of a scenario failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A provider call failed or reported a business error.
    Provider,
    /// A gateway answered with an HTML error page.
    Gateway,
    /// The settlement poller gave up before the payment reached a terminal state.
    Deadline,
    /// The provider reported the payment as failed.
    PaymentFailed,
    /// The payment completed without a settlement proof while one was required.
    MissingProof,
    Config,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Provider => "provider",
            FailureKind::Gateway => "gateway",
            FailureKind::Deadline => "deadline",
            FailureKind::PaymentFailed => "payment-failed",
            FailureKind::MissingProof => "missing-proof",
            FailureKind::Config => "config",
        };

        f.write_str(s)
    }
}

/// A labelled scenario failure: which scenario, at which step, and what happened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{scenario}] {operation}: {detail}")]
pub struct ScenarioError {
    pub scenario: String,
    pub operation: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl ScenarioError {
    pub fn new(
        scenario: impl Into<String>,
        operation: impl Into<String>,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            operation: operation.into(),
            kind,
            detail: detail.into(),
        }
    }

    /// Label a provider or poller error with the scenario and step it surfaced at.
    pub fn from_error(
        scenario: impl Into<String>,
        operation: impl Into<String>,
        error: &Error,
    ) -> Self {
        Self::new(scenario, operation, error.failure_kind(), error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The scenario stopped early for a reason that is not a failure of what it tests.
    SuccessWithWarning(String),
    Error(ScenarioError),
}

/// The single result a scenario produces per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    pub scenario: String,
    /// The last operation the scenario reached.
    pub operation: String,
    pub outcome: Outcome,
}

impl ScenarioResult {
    pub fn success(scenario: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            operation: operation.into(),
            outcome: Outcome::Success,
        }
    }

    pub fn warning(
        scenario: impl Into<String>,
        operation: impl Into<String>,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            operation: operation.into(),
            outcome: Outcome::SuccessWithWarning(warning.into()),
        }
    }

    pub fn failed(error: ScenarioError) -> Self {
        Self {
            scenario: error.scenario.clone(),
            operation: error.operation.clone(),
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Error(_))
    }

    pub fn error(&self) -> Option<&ScenarioError> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Success | Outcome::SuccessWithWarning(_) => None,
        }
    }

    pub fn into_error(self) -> Option<ScenarioError> {
        match self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Success | Outcome::SuccessWithWarning(_) => None,
        }
    }
}
