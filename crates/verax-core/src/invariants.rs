//! Global invariant enforcement.
//!
//! The last gate before findings leave the pipeline. Eight checks run in a
//! fixed order and stop at the first failure; a failing finding is removed
//! from the output set entirely rather than downgraded.
//!
//! In [`EnforcementMode::Development`] the same checks run but failures are
//! only flagged, so detector authors can see what production would drop.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceLevel;
use crate::domain::finding::{Finding, Impact, Ownership};
use crate::evidence::evidence_categories;

/// Confidence below which a `LOW` finding is eligible for the ambiguity drop.
pub const AMBIGUITY_SCORE_CEILING: f64 = 0.60;

/// Whether invariant failures drop findings or only flag them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    #[default]
    Production,
    Development,
}

impl std::str::FromStr for EnforcementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!("unknown enforcement mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// The eight checks, in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantCheck {
    EvidencePresent,
    ConfidencePresent,
    SignalsPresent,
    SignalsInDomain,
    Grounded,
    Ambiguity,
    OwnershipContradiction,
    ImpactContradiction,
}

impl InvariantCheck {
    pub const ORDER: [InvariantCheck; 8] = [
        Self::EvidencePresent,
        Self::ConfidencePresent,
        Self::SignalsPresent,
        Self::SignalsInDomain,
        Self::Grounded,
        Self::Ambiguity,
        Self::OwnershipContradiction,
        Self::ImpactContradiction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EvidencePresent => "EVIDENCE_PRESENT",
            Self::ConfidencePresent => "CONFIDENCE_PRESENT",
            Self::SignalsPresent => "SIGNALS_PRESENT",
            Self::SignalsInDomain => "SIGNALS_IN_DOMAIN",
            Self::Grounded => "GROUNDED",
            Self::Ambiguity => "AMBIGUITY",
            Self::OwnershipContradiction => "OWNERSHIP_CONTRADICTION",
            Self::ImpactContradiction => "IMPACT_CONTRADICTION",
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub should_drop: bool,
    pub reason: Option<String>,
}

impl CheckOutcome {
    fn keep() -> Self {
        Self {
            should_drop: false,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            should_drop: true,
            reason: Some(reason.into()),
        }
    }
}

pub fn run_check(check: InvariantCheck, finding: &Finding) -> CheckOutcome {
    match check {
        InvariantCheck::EvidencePresent => match finding.evidence_package {
            Some(_) => CheckOutcome::keep(),
            None => CheckOutcome::reject("finding has no evidence package"),
        },
        InvariantCheck::ConfidencePresent => match finding.confidence {
            Some(_) => CheckOutcome::keep(),
            None => CheckOutcome::reject("finding has no confidence result"),
        },
        InvariantCheck::SignalsPresent => match finding.signals.as_ref() {
            None => CheckOutcome::reject("finding has no signals"),
            Some(s) => {
                let missing = s.missing_fields();
                if missing.is_empty() {
                    CheckOutcome::keep()
                } else {
                    CheckOutcome::reject(format!("signals missing [{}]", missing.join(", ")))
                }
            }
        },
        InvariantCheck::SignalsInDomain => {
            let bad = finding
                .signals
                .as_ref()
                .map(|s| s.unrecognized_fields())
                .unwrap_or_default();
            if bad.is_empty() {
                CheckOutcome::keep()
            } else {
                CheckOutcome::reject(format!("signals outside their enums [{}]", bad.join(", ")))
            }
        }
        InvariantCheck::Grounded => {
            let expectation = finding.expectation.as_ref().is_some_and(|e| e.is_grounding());
            let sensed = finding
                .evidence_package
                .as_ref()
                .is_some_and(|p| p.signals.has_observable_signal());
            if expectation || sensed {
                CheckOutcome::keep()
            } else {
                CheckOutcome::reject(
                    "ungrounded: no proven or observed expectation and no observable signal",
                )
            }
        }
        InvariantCheck::Ambiguity => {
            let Some(conf) = finding.confidence.as_ref() else {
                return CheckOutcome::keep();
            };
            if conf.score >= AMBIGUITY_SCORE_CEILING || conf.level != ConfidenceLevel::Low {
                return CheckOutcome::keep();
            }
            let categories = finding
                .evidence_package
                .as_ref()
                .map(|p| evidence_categories(p).len())
                .unwrap_or(0);
            let high_impact = finding
                .signals
                .as_ref()
                .is_some_and(|s| s.impact == Some(Impact::High));
            if high_impact && categories < 2 {
                let noun = if categories == 1 { "category" } else { "categories" };
                CheckOutcome::reject(format!(
                    "ambiguous: HIGH impact on {categories} evidence {noun} at confidence {:.2}",
                    conf.score
                ))
            } else if !finding.enrichment.ambiguity_reasons.is_empty() {
                CheckOutcome::reject(format!(
                    "ambiguous: {} at confidence {:.2}",
                    finding.enrichment.ambiguity_reasons.join("; "),
                    conf.score
                ))
            } else {
                CheckOutcome::keep()
            }
        }
        InvariantCheck::OwnershipContradiction => {
            let backend = finding
                .signals
                .as_ref()
                .is_some_and(|s| s.ownership == Some(Ownership::Backend));
            let network = finding
                .evidence_package
                .as_ref()
                .and_then(|p| p.signals.network.as_ref())
                .is_some_and(|n| n.has_activity());
            if backend && !network {
                CheckOutcome::reject("BACKEND ownership with zero network evidence")
            } else {
                CheckOutcome::keep()
            }
        }
        InvariantCheck::ImpactContradiction => {
            let high_impact = finding
                .signals
                .as_ref()
                .is_some_and(|s| s.impact == Some(Impact::High));
            let unproven = finding
                .confidence
                .as_ref()
                .is_some_and(|c| c.level == ConfidenceLevel::Unproven);
            if high_impact && unproven {
                CheckOutcome::reject("HIGH impact with UNPROVEN confidence")
            } else {
                CheckOutcome::keep()
            }
        }
    }
}

/// Run all checks in order; the first failure wins.
pub fn check_finding(finding: &Finding) -> Option<(InvariantCheck, String)> {
    InvariantCheck::ORDER.iter().find_map(|check| {
        let outcome = run_check(*check, finding);
        if outcome.should_drop {
            Some((*check, outcome.reason.unwrap_or_default()))
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Enforcer
// ---------------------------------------------------------------------------

/// A finding removed (or, in development, flagged) by a check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DroppedFinding {
    pub finding_id: String,
    pub check: InvariantCheck,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementReport {
    pub kept: Vec<Finding>,
    pub dropped: Vec<DroppedFinding>,
    /// Failures seen in development mode; those findings stay in `kept`.
    pub flagged: Vec<DroppedFinding>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InvariantEnforcer {
    mode: EnforcementMode,
}

impl InvariantEnforcer {
    pub fn new(mode: EnforcementMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }

    pub fn enforce(&self, findings: Vec<Finding>) -> EnforcementReport {
        let mut report = EnforcementReport::default();
        for finding in findings {
            match check_finding(&finding) {
                None => report.kept.push(finding),
                Some((check, reason)) => {
                    let record = DroppedFinding {
                        finding_id: finding.id.clone(),
                        check,
                        reason,
                    };
                    match self.mode {
                        EnforcementMode::Production => report.dropped.push(record),
                        EnforcementMode::Development => {
                            report.flagged.push(record);
                            report.kept.push(finding);
                        }
                    }
                }
            }
        }
        report
    }
}
