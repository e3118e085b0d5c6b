//! Execution records: what happened to each promise during a run.

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, VeraxError};

/// Why a promise was not attempted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AuthRequired,
    InfraFailure,
    /// Submit/checkout/destructive actions are never attempted.
    WriteIntentBlocked,
    ElementNotFound,
    NotInteractable,
    Timeout,
    BudgetExceeded,
    #[serde(other)]
    Unspecified,
}

impl SkipReason {
    /// The default legal allow-list.
    pub fn default_legal() -> Vec<SkipReason> {
        vec![
            SkipReason::AuthRequired,
            SkipReason::InfraFailure,
            SkipReason::WriteIntentBlocked,
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    AttemptedAndObserved,
    AttemptedNotObserved,
    Skipped,
}

/// One record per promise per run. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub promise_id: String,
    pub attempted: bool,
    pub observed: bool,
    pub skipped: bool,
    #[serde(default)]
    pub skip_reason: Option<SkipReason>,
    pub state: ExecutionState,
}

impl ExecutionRecord {
    pub fn attempted_and_observed(promise_id: impl Into<String>) -> Self {
        Self {
            promise_id: promise_id.into(),
            attempted: true,
            observed: true,
            skipped: false,
            skip_reason: None,
            state: ExecutionState::AttemptedAndObserved,
        }
    }

    pub fn attempted_not_observed(promise_id: impl Into<String>) -> Self {
        Self {
            promise_id: promise_id.into(),
            attempted: true,
            observed: false,
            skipped: false,
            skip_reason: None,
            state: ExecutionState::AttemptedNotObserved,
        }
    }

    pub fn skipped(promise_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            promise_id: promise_id.into(),
            attempted: false,
            observed: false,
            skipped: true,
            skip_reason: Some(reason),
            state: ExecutionState::Skipped,
        }
    }

    pub fn is_attempted(&self) -> bool {
        !matches!(self.state, ExecutionState::Skipped)
    }

    /// Check that the flags agree with `state`. Records read from disk go
    /// through this before anything counts them.
    pub fn validate(&self) -> Result<()> {
        let expected = match self.state {
            ExecutionState::AttemptedAndObserved => (true, true, false),
            ExecutionState::AttemptedNotObserved => (true, false, false),
            ExecutionState::Skipped => (false, false, true),
        };
        let actual = (self.attempted, self.observed, self.skipped);
        if actual != expected {
            return Err(VeraxError::InvalidExecutionRecord {
                promise_id: self.promise_id.clone(),
                reason: format!(
                    "flags (attempted={}, observed={}, skipped={}) disagree with state {:?}",
                    actual.0, actual.1, actual.2, self.state
                ),
            });
        }
        if self.skipped && self.skip_reason.is_none() {
            return Err(VeraxError::InvalidExecutionRecord {
                promise_id: self.promise_id.clone(),
                reason: "skipped record has no skip reason".to_string(),
            });
        }
        if !self.skipped && self.skip_reason.is_some() {
            return Err(VeraxError::InvalidExecutionRecord {
                promise_id: self.promise_id.clone(),
                reason: "non-skipped record carries a skip reason".to_string(),
            });
        }
        Ok(())
    }
}
