//! Findings: judged claims that a promise was or was not fulfilled.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceResult;
use crate::domain::evidence::EvidencePackage;
use crate::domain::promise::ProofStrength;

/// Closed set of detector finding types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    NavigationSilentFailure,
    NetworkSilentFailure,
    NoEffectSilentFailure,
    MissingFeedbackFailure,
    StateSilentFailure,
    MisleadingSuccess,
}

/// Finding status, ordered from most to least assertive.
///
/// Post-assignment stages may only move a finding down this ladder:
/// `CONFIRMED -> SUSPECTED -> INFORMATIONAL -> IGNORED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingStatus {
    Confirmed,
    Suspected,
    Informational,
    Ignored,
}

impl FindingStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Confirmed => 3,
            Self::Suspected => 2,
            Self::Informational => 1,
            Self::Ignored => 0,
        }
    }

    /// Whether moving from `self` to `target` is a downgrade (or no move).
    pub fn can_move_to(self, target: Self) -> bool {
        target.rank() <= self.rank()
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => f.write_str("CONFIRMED"),
            Self::Suspected => f.write_str("SUSPECTED"),
            Self::Informational => f.write_str("INFORMATIONAL"),
            Self::Ignored => f.write_str("IGNORED"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRisk {
    Blocks,
    Confuses,
    Degrades,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ownership {
    Frontend,
    Backend,
    Integration,
    Accessibility,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grouping {
    Route,
    Feature,
    Component,
    Ungrouped,
    #[serde(other)]
    Unrecognized,
}

/// Triage signals attached by the detector.
///
/// Every slot is optional on the wire so that absence can be detected and
/// dropped by the invariant enforcer instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindingSignals {
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub user_risk: Option<UserRisk>,
    #[serde(default)]
    pub ownership: Option<Ownership>,
    #[serde(default)]
    pub grouping: Option<Grouping>,
}

impl FindingSignals {
    pub fn new(
        impact: Impact,
        user_risk: UserRisk,
        ownership: Ownership,
        grouping: Grouping,
    ) -> Self {
        Self {
            impact: Some(impact),
            user_risk: Some(user_risk),
            ownership: Some(ownership),
            grouping: Some(grouping),
        }
    }

    /// Names of required slots that are absent, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.impact.is_none() {
            missing.push("impact");
        }
        if self.user_risk.is_none() {
            missing.push("userRisk");
        }
        if self.ownership.is_none() {
            missing.push("ownership");
        }
        if self.grouping.is_none() {
            missing.push("grouping");
        }
        missing
    }

    /// Names of slots whose value is outside the closed enum.
    pub fn unrecognized_fields(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        if self.impact == Some(Impact::Unrecognized) {
            bad.push("impact");
        }
        if self.user_risk == Some(UserRisk::Unrecognized) {
            bad.push("userRisk");
        }
        if self.ownership == Some(Ownership::Unrecognized) {
            bad.push("ownership");
        }
        if self.grouping == Some(Grouping::Unrecognized) {
            bad.push("grouping");
        }
        bad
    }
}

/// Category of evidence that backs a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    Screenshot,
    Url,
    Dom,
    Network,
    Console,
    UiSignals,
    Navigation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default)]
    pub ambiguity_reasons: Vec<String>,
    #[serde(default)]
    pub evidence_categories: Vec<EvidenceCategory>,
    #[serde(default)]
    pub downgrade_reasons: Vec<String>,
}

/// The expectation a finding is judged against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationRef {
    pub promise_id: String,
    pub proof: ProofStrength,
    /// The interaction for this promise was attempted and observed.
    pub observed: bool,
}

impl ExpectationRef {
    pub fn is_grounding(&self) -> bool {
        self.proof.is_proven() || self.observed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub status: FindingStatus,
    #[serde(default)]
    pub expectation: Option<ExpectationRef>,
    #[serde(default)]
    pub confidence: Option<ConfidenceResult>,
    #[serde(default)]
    pub evidence_package: Option<EvidencePackage>,
    #[serde(default)]
    pub signals: Option<FindingSignals>,
    #[serde(default)]
    pub enrichment: Enrichment,
}

impl Finding {
    pub fn new(id: impl Into<String>, finding_type: FindingType, status: FindingStatus) -> Self {
        Self {
            id: id.into(),
            finding_type,
            status,
            expectation: None,
            confidence: None,
            evidence_package: None,
            signals: None,
            enrichment: Enrichment::default(),
        }
    }

    /// Move the status down the ladder and record why. Returns `true` only
    /// when the status actually moved; upward moves are refused.
    pub fn downgrade(&mut self, target: FindingStatus, reason: impl Into<String>) -> bool {
        if !self.status.can_move_to(target) {
            tracing::debug!(
                finding_id = %self.id,
                from = %self.status,
                to = %target,
                "refused status upgrade"
            );
            return false;
        }
        if self.status == target {
            return false;
        }
        self.status = target;
        self.enrichment.downgrade_reasons.push(reason.into());
        true
    }

    pub fn is_evidence_complete(&self) -> bool {
        self.evidence_package
            .as_ref()
            .is_some_and(|p| p.is_complete)
    }
}
