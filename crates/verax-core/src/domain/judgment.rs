//! Observation outcomes and the judgments they map to.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::VeraxError;

/// Outcome reported by the observation layer for one attempted promise.
///
/// Parsed strictly: an unrecognized label is a programming error upstream and
/// fails deserialization with [`VeraxError::UnknownOutcome`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum ObservationOutcome {
    Success,
    PartialSuccess,
    Misleading,
    SilentFailure,
    Ambiguous,
}

impl FromStr for ObservationOutcome {
    type Err = VeraxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "PARTIAL_SUCCESS" => Ok(Self::PartialSuccess),
            "MISLEADING" => Ok(Self::Misleading),
            "SILENT_FAILURE" => Ok(Self::SilentFailure),
            "AMBIGUOUS" => Ok(Self::Ambiguous),
            other => Err(VeraxError::UnknownOutcome(other.to_string())),
        }
    }
}

impl ObservationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Misleading => "MISLEADING",
            Self::SilentFailure => "SILENT_FAILURE",
            Self::Ambiguous => "AMBIGUOUS",
        }
    }
}

impl TryFrom<String> for ObservationOutcome {
    type Error = VeraxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Final classification of one promise's execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgmentKind {
    Pass,
    WeakPass,
    NeedsReview,
    FailureMisleading,
    FailureSilent,
}

impl JudgmentKind {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::FailureMisleading | Self::FailureSilent)
    }
}

/// Observation for one attempted promise, as handed in by the runner.
///
/// The outcome stays a raw label until it is mapped, so one bad label is
/// reported against its promise instead of rejecting the whole run input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub promise_id: String,
    pub outcome: String,
}

impl Observation {
    pub fn new(promise_id: impl Into<String>, outcome: ObservationOutcome) -> Self {
        Self {
            promise_id: promise_id.into(),
            outcome: outcome.as_str().to_string(),
        }
    }
}

/// Exists iff the promise's execution record is non-skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    pub promise_id: String,
    pub judgment: JudgmentKind,
}
