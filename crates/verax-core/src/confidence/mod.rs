//! Unified confidence engine.
//!
//! Scores promise strength, sensor presence, substantive evidence and
//! per-type boosts into a bounded score on the `[0, 1]` scale, a level and
//! an ordered list of stable reason codes.
//!
//! # Determinism
//!
//! Contributions are applied in a fixed order and the final score is rounded
//! to three decimals, so identical inputs reproduce identical results. No
//! clock, randomness or map iteration order participates.

mod boosts;
pub mod reasons;

use serde::{Deserialize, Serialize};

use crate::domain::evidence::EvidencePackage;
use crate::domain::finding::FindingType;
use crate::domain::promise::ProofStrength;
use crate::domain::trace::{Comparisons, SensorCategory, SensorSnapshot};

pub use reasons::ReasonCode;

/// Minimum score for `HIGH` (preconditions also apply).
pub const HIGH_THRESHOLD: f64 = 0.80;
/// Minimum score for `MEDIUM`.
pub const MEDIUM_THRESHOLD: f64 = 0.55;
/// Below this, evidence is too thin to call anything but `UNPROVEN`.
pub const UNPROVEN_THRESHOLD: f64 = 0.25;
/// Ceiling after a forced `SUSPECTED` downgrade.
pub const SUSPECTED_CAP: f64 = 0.69;
/// Ceiling for `INFORMATIONAL`: stays inside the `LOW`/`UNPROVEN` band.
pub const INFORMATIONAL_CAP: f64 = 0.54;

const FEEDBACK_CONTRADICTION_CAP: f64 = 0.20;
const NETWORK_SUCCESS_NO_UI_PENALTY: f64 = 0.15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Unproven,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Level implied by score alone, without the `HIGH` preconditions.
    pub fn band(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else if score >= UNPROVEN_THRESHOLD {
            Self::Low
        } else {
            Self::Unproven
        }
    }
}

/// Derived once from its inputs and never mutated; caps produce a new value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceResult {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub reasons: Vec<ReasonCode>,
}

impl ConfidenceResult {
    /// A copy with the score capped at `cap`, the level lowered to match and
    /// `reason` recorded among the penalties.
    pub fn capped(&self, cap: f64, reason: ReasonCode) -> Self {
        let score = round3(self.score.min(cap));
        let level = self.level.min(ConfidenceLevel::band(score));
        Self {
            score,
            level,
            reasons: with_penalty(&self.reasons, reason),
        }
    }

    /// A copy forced to exactly zero.
    pub fn zeroed(&self, reason: ReasonCode) -> Self {
        Self {
            score: 0.0,
            level: ConfidenceLevel::Unproven,
            reasons: with_penalty(&self.reasons, reason),
        }
    }
}

fn with_penalty(reasons: &[ReasonCode], reason: ReasonCode) -> Vec<ReasonCode> {
    let mut out = reasons.to_vec();
    if out.contains(&reason) {
        return out;
    }
    let insert_at = out.iter().take_while(|r| r.is_penalty()).count();
    out.insert(insert_at, reason);
    out
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Everything the engine looks at.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInput<'a> {
    pub finding_type: FindingType,
    pub proof: ProofStrength,
    pub sensors: &'a SensorSnapshot,
    pub evidence: &'a EvidencePackage,
    pub comparisons: Comparisons,
}

/// Score one finding. Pure.
pub fn score(input: &ConfidenceInput<'_>) -> ConfidenceResult {
    let mut penalties: Vec<ReasonCode> = Vec::new();
    let mut reasons: Vec<ReasonCode> = Vec::new();
    let mut total = 0.0_f64;

    let mut add = |code: ReasonCode, weight: f64, total: &mut f64| {
        reasons.push(code);
        *total += weight;
    };

    // 1. Promise strength.
    match input.proof {
        ProofStrength::ProvenExpectation => add(ReasonCode::PromiseProven, 0.40, &mut total),
        ProofStrength::WeakExpectation => add(ReasonCode::PromiseWeak, 0.25, &mut total),
        ProofStrength::Unknown => add(ReasonCode::PromiseUnknown, 0.10, &mut total),
    }

    // 2. Sensor presence, then substantive evidence.
    for category in input.sensors.present_categories() {
        match category {
            SensorCategory::Network => add(ReasonCode::SensorNetwork, 0.10, &mut total),
            SensorCategory::Console => add(ReasonCode::SensorConsole, 0.05, &mut total),
            SensorCategory::UiSignals => add(ReasonCode::SensorUiSignals, 0.10, &mut total),
            SensorCategory::Navigation => add(ReasonCode::SensorNavigation, 0.05, &mut total),
        }
    }
    if input.evidence.has_both_screenshots() {
        add(ReasonCode::EvidenceScreenshots, 0.05, &mut total);
    }
    match input.comparisons.url_changed {
        Some(true) => add(ReasonCode::ObsUrlChanged, 0.05, &mut total),
        Some(false) => add(ReasonCode::ObsUrlUnchanged, 0.0, &mut total),
        None => {}
    }
    match input.comparisons.dom_changed {
        Some(true) => add(ReasonCode::ObsDomChanged, 0.05, &mut total),
        Some(false) => add(ReasonCode::ObsDomUnchanged, 0.0, &mut total),
        None => {}
    }

    // 3. Type boosts.
    let boosts = boosts::type_boosts(input.finding_type, input.sensors, &input.comparisons);
    for (code, weight) in boosts {
        add(code, weight, &mut total);
    }

    // 4. Contradiction penalties.
    let network_succeeded = input
        .sensors
        .network
        .as_ref()
        .is_some_and(|n| n.successful_requests() > 0);
    let ui_unchanged = input.sensors.ui_signals.as_ref().is_some_and(|u| !u.changed);
    if network_succeeded && ui_unchanged {
        penalties.push(ReasonCode::GuardNetworkSuccessNoUiChange);
        total -= NETWORK_SUCCESS_NO_UI_PENALTY;
    }

    let mut contradicted = false;
    if input.finding_type == FindingType::MissingFeedbackFailure
        && input.sensors.ui_signals.as_ref().is_some_and(|u| u.has_feedback())
    {
        penalties.push(ReasonCode::GuardUiFeedbackContradicts);
        total = total.min(FEEDBACK_CONTRADICTION_CAP);
        contradicted = true;
    }

    // 5. Clamp.
    let score = round3(total.clamp(0.0, 1.0));

    let level = if contradicted || score < UNPROVEN_THRESHOLD {
        ConfidenceLevel::Unproven
    } else if score >= HIGH_THRESHOLD {
        if input.proof.is_proven() && input.sensors.is_complete() {
            ConfidenceLevel::High
        } else {
            penalties.push(ReasonCode::GuardSensorsIncomplete);
            ConfidenceLevel::Medium
        }
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    penalties.extend(reasons);
    ConfidenceResult {
        score,
        level,
        reasons: penalties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trace::{ConsoleSignals, NetworkRequest, NetworkSignals, UiSignals};

    fn all_sensors() -> SensorSnapshot {
        SensorSnapshot {
            network: Some(NetworkSignals::default()),
            console: Some(ConsoleSignals::default()),
            ui_signals: Some(UiSignals::default()),
            navigation: None,
        }
    }

    fn unchanged() -> Comparisons {
        Comparisons {
            url_changed: Some(false),
            dom_changed: Some(false),
        }
    }

    #[test]
    fn test_high_requires_proven_and_sensors() {
        let sensors = all_sensors();
        let evidence = EvidencePackage::default();
        let input = ConfidenceInput {
            finding_type: FindingType::NavigationSilentFailure,
            proof: ProofStrength::ProvenExpectation,
            sensors: &sensors,
            evidence: &evidence,
            comparisons: unchanged(),
        };
        let r = score(&input);
        assert_eq!(r.level, ConfidenceLevel::High);
        assert!(r.score >= HIGH_THRESHOLD);
    }

    #[test]
    fn test_high_score_without_proof_is_medium() {
        let mut sensors = all_sensors();
        sensors.navigation = Some(Default::default());
        let evidence = EvidencePackage {
            before: crate::domain::evidence::PageSnapshot {
                screenshot: Some("b.png".to_string()),
                ..Default::default()
            },
            after: crate::domain::evidence::PageSnapshot {
                screenshot: Some("a.png".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let input = ConfidenceInput {
            finding_type: FindingType::NoEffectSilentFailure,
            proof: ProofStrength::WeakExpectation,
            sensors: &sensors,
            evidence: &evidence,
            comparisons: unchanged(),
        };
        let r = score(&input);
        assert!(r.score >= HIGH_THRESHOLD, "score {}", r.score);
        assert_eq!(r.level, ConfidenceLevel::Medium);
        assert_eq!(r.reasons[0], ReasonCode::GuardSensorsIncomplete);
    }

    #[test]
    fn test_network_success_without_ui_change_is_penalised() {
        let mut sensors = all_sensors();
        sensors.network = Some(NetworkSignals {
            requests: vec![NetworkRequest {
                url: "/api/items".to_string(),
                method: "GET".to_string(),
                status: Some(200),
                failed: false,
            }],
        });
        let evidence = EvidencePackage::default();
        let base = ConfidenceInput {
            finding_type: FindingType::StateSilentFailure,
            proof: ProofStrength::ProvenExpectation,
            sensors: &sensors,
            evidence: &evidence,
            comparisons: unchanged(),
        };
        let penalised = score(&base);
        assert_eq!(penalised.reasons[0], ReasonCode::GuardNetworkSuccessNoUiChange);

        let quiet = all_sensors();
        let unpenalised = score(&ConfidenceInput {
            sensors: &quiet,
            ..base
        });
        assert!(penalised.score < unpenalised.score);
    }

    #[test]
    fn test_feedback_contradiction_caps_to_unproven() {
        let mut sensors = all_sensors();
        sensors.ui_signals = Some(UiSignals {
            changed: true,
            success_feedback: true,
            ..Default::default()
        });
        let evidence = EvidencePackage::default();
        let r = score(&ConfidenceInput {
            finding_type: FindingType::MissingFeedbackFailure,
            proof: ProofStrength::ProvenExpectation,
            sensors: &sensors,
            evidence: &evidence,
            comparisons: Comparisons::default(),
        });
        assert!(r.score <= 0.20);
        assert_eq!(r.level, ConfidenceLevel::Unproven);
        assert_eq!(r.reasons[0], ReasonCode::GuardUiFeedbackContradicts);
    }

    #[test]
    fn test_capped_lowers_level_and_keeps_penalties_first() {
        let r = ConfidenceResult {
            score: 0.9,
            level: ConfidenceLevel::High,
            reasons: vec![ReasonCode::PromiseProven],
        };
        let c = r.capped(SUSPECTED_CAP, ReasonCode::GuardCapSuspected);
        assert_eq!(c.score, 0.69);
        assert_eq!(c.level, ConfidenceLevel::Medium);
        assert_eq!(c.reasons, vec![ReasonCode::GuardCapSuspected, ReasonCode::PromiseProven]);

        let i = c.capped(INFORMATIONAL_CAP, ReasonCode::GuardCapInformational);
        assert_eq!(i.level, ConfidenceLevel::Low);
        assert_eq!(i.reasons[1], ReasonCode::GuardCapInformational);

        let z = i.zeroed(ReasonCode::GuardIgnored);
        assert_eq!(z.score, 0.0);
        assert_eq!(z.level, ConfidenceLevel::Unproven);
    }

    #[test]
    fn test_capping_never_raises_level() {
        let r = ConfidenceResult {
            score: 0.3,
            level: ConfidenceLevel::Low,
            reasons: vec![],
        };
        let c = r.capped(SUSPECTED_CAP, ReasonCode::GuardCapSuspected);
        assert_eq!(c.score, 0.3);
        assert_eq!(c.level, ConfidenceLevel::Low);
    }
}
