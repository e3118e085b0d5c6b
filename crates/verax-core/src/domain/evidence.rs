//! Evidence package data model.
//!
//! The builder that fills these structures lives in [`crate::evidence`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::promise::{PromiseKind, SourceRef};
use crate::domain::trace::{Interaction, SensorSnapshot, Timing};

/// Page state captured on one side of an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub dom_digest: Option<String>,
}

/// Which capture step failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    Screenshot,
    DomSignature,
    Url,
    UiSignals,
    NetworkWindow,
}

/// Stable reason code for a capture failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureReasonCode {
    Timeout,
    DriverError,
    EmptyDomSignature,
    EmptyValue,
    RetriesExhausted,
}

impl CaptureReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::DriverError => "DRIVER_ERROR",
            Self::EmptyDomSignature => "EMPTY_DOM_SIGNATURE",
            Self::EmptyValue => "EMPTY_VALUE",
            Self::RetriesExhausted => "RETRIES_EXHAUSTED",
        }
    }
}

/// Structured record of a capture failure. Never swallowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFailure {
    pub stage: CaptureStage,
    pub reason_code: CaptureReasonCode,
    pub reason: String,
    pub attempt_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl CaptureFailure {
    pub fn new(
        stage: CaptureStage,
        reason_code: CaptureReasonCode,
        reason: impl Into<String>,
        attempt_count: u32,
    ) -> Self {
        Self {
            stage,
            reason_code,
            reason: reason.into(),
            attempt_count,
            timestamp: Utc::now(),
        }
    }
}

/// What triggered the expectation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default)]
    pub source: Option<SourceRef>,
    #[serde(default)]
    pub promise_kind: Option<PromiseKind>,
    #[serde(default)]
    pub target: Option<String>,
}

/// What was done to the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvidence {
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub timing: Option<Timing>,
}

/// Canonical bundle of captured before/after state for one finding.
///
/// `is_complete` is true iff every entry of
/// [`crate::evidence::REQUIRED_EVIDENCE_FIELDS`] is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePackage {
    pub trigger: Trigger,
    pub before: PageSnapshot,
    pub after: PageSnapshot,
    pub action: ActionEvidence,
    pub signals: SensorSnapshot,
    #[serde(default)]
    pub justification: Vec<String>,
    #[serde(default)]
    pub capture_failures: Vec<CaptureFailure>,
    #[serde(default)]
    pub missing_evidence: Vec<String>,
    #[serde(default)]
    pub is_complete: bool,
}

impl EvidencePackage {
    pub fn has_both_screenshots(&self) -> bool {
        self.before.screenshot.is_some() && self.after.screenshot.is_some()
    }

    /// Capture-failure reason codes in recorded order, deduplicated.
    pub fn capture_failure_codes(&self) -> Vec<&'static str> {
        let mut codes: Vec<&'static str> = Vec::new();
        for failure in &self.capture_failures {
            let code = failure.reason_code.as_str();
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }
}
