//! Guardrail reconciliation.
//!
//! Domain heuristics that counter known false-positive patterns. Every rule
//! can only move a finding down the status ladder, and every decision caps
//! the finding's confidence to stay consistent with it:
//!
//! | decision                    | confidence                         |
//! |-----------------------------|------------------------------------|
//! | `CONFIRMED -> SUSPECTED`    | capped at [`SUSPECTED_CAP`]        |
//! | any -> `INFORMATIONAL`      | capped at [`INFORMATIONAL_CAP`]    |
//! | any -> `IGNORED`            | exactly 0, level `UNPROVEN`        |
//!
//! The [`ReconciliationReport`] is keyed by finding id so each final
//! decision can be audited independently.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::confidence::{ReasonCode, INFORMATIONAL_CAP, SUSPECTED_CAP};
use crate::domain::error::{Result, VeraxError};
use crate::domain::finding::{Finding, FindingStatus, FindingType};
use crate::domain::trace::SensorSnapshot;

/// Analytics and tag-manager endpoints recognised out of the box.
pub const DEFAULT_ANALYTICS_PATTERNS: &[&str] = &[
    r"google-analytics\.com",
    r"googletagmanager\.com",
    r"analytics\.google\.com",
    r"doubleclick\.net",
    r"segment\.(io|com)",
    r"mixpanel\.com",
    r"amplitude\.com",
    r"hotjar\.(com|io)",
    r"plausible\.io",
    r"/collect(\?|$)",
];

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A single downgrade-only heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardrailRule {
    /// The only network traffic was analytics beacons and nothing visible
    /// happened: the "failure" is a tracking call, not a user promise.
    AnalyticsOnly,
    /// A "missing feedback" claim while the UI did show feedback.
    UiFeedbackPresent,
    /// The UI already changed while the request was still in flight.
    OptimisticUi,
    /// `CONFIRMED` is reserved for proven expectations.
    UnprovenExpectation,
}

impl GuardrailRule {
    /// The status this rule forces when it fires.
    pub fn target(self) -> FindingStatus {
        match self {
            Self::AnalyticsOnly => FindingStatus::Ignored,
            Self::UiFeedbackPresent => FindingStatus::Informational,
            Self::OptimisticUi | Self::UnprovenExpectation => FindingStatus::Suspected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnalyticsOnly => "ANALYTICS_ONLY",
            Self::UiFeedbackPresent => "UI_FEEDBACK_PRESENT",
            Self::OptimisticUi => "OPTIMISTIC_UI",
            Self::UnprovenExpectation => "UNPROVEN_EXPECTATION",
        }
    }
}

/// One entry of the reconciliation report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationEntry {
    pub finding_id: String,
    pub initial_status: FindingStatus,
    pub final_status: FindingStatus,
    pub rules_applied: Vec<GuardrailRule>,
    pub reasons: Vec<String>,
    pub confidence_before: Option<f64>,
    pub confidence_after: Option<f64>,
}

impl ReconciliationEntry {
    pub fn changed(&self) -> bool {
        self.initial_status != self.final_status || self.confidence_before != self.confidence_after
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub entries: BTreeMap<String, ReconciliationEntry>,
}

impl ReconciliationReport {
    pub fn get(&self, finding_id: &str) -> Option<&ReconciliationEntry> {
        self.entries.get(finding_id)
    }

    pub fn changed_count(&self) -> usize {
        self.entries.values().filter(|e| e.changed()).count()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Guardrails {
    analytics: Vec<Regex>,
    rules: Vec<GuardrailRule>,
}

impl Guardrails {
    /// All rules with the built-in analytics patterns.
    pub fn standard() -> Self {
        let analytics = DEFAULT_ANALYTICS_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            analytics,
            rules: vec![
                GuardrailRule::AnalyticsOnly,
                GuardrailRule::UiFeedbackPresent,
                GuardrailRule::OptimisticUi,
                GuardrailRule::UnprovenExpectation,
            ],
        }
    }

    /// Replace the analytics patterns. Invalid expressions are a config error.
    pub fn with_analytics_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.analytics = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    VeraxError::InvalidConfig(format!(
                        "analytics pattern {:?}: {e}",
                        p.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Restrict to an explicit rule list.
    pub fn with_rules(mut self, rules: Vec<GuardrailRule>) -> Self {
        self.rules = rules;
        self
    }

    fn is_analytics(&self, url: &str) -> bool {
        self.analytics.iter().any(|re| re.is_match(url))
    }

    fn fires(
        &self,
        rule: GuardrailRule,
        finding: &Finding,
        sensors: &SensorSnapshot,
    ) -> Option<String> {
        match rule {
            GuardrailRule::AnalyticsOnly => {
                let network = sensors.network.as_ref()?;
                if !network.has_activity() {
                    return None;
                }
                let all_analytics = network.requests.iter().all(|r| self.is_analytics(&r.url));
                let ui_quiet = !sensors.ui_signals.as_ref().is_some_and(|u| u.is_observable());
                (all_analytics && ui_quiet).then(|| {
                    format!(
                        "all {} request(s) were analytics beacons with no visible effect",
                        network.total_requests()
                    )
                })
            }
            GuardrailRule::UiFeedbackPresent => {
                if finding.finding_type != FindingType::MissingFeedbackFailure {
                    return None;
                }
                let ui = sensors.ui_signals.as_ref()?;
                ui.has_feedback().then(|| {
                    format!(
                        "UI showed {} feedback channel(s); feedback is not missing",
                        ui.feedback_strength()
                    )
                })
            }
            GuardrailRule::OptimisticUi => {
                if !matches!(
                    finding.finding_type,
                    FindingType::NetworkSilentFailure | FindingType::StateSilentFailure
                ) {
                    return None;
                }
                let ui_changed = sensors.ui_signals.as_ref().is_some_and(|u| u.changed);
                let pending = sensors
                    .network
                    .as_ref()
                    .is_some_and(|n| n.requests.iter().any(|r| r.status.is_none() && !r.failed));
                (ui_changed && pending).then(|| {
                    "UI updated optimistically while a request was still pending".to_string()
                })
            }
            GuardrailRule::UnprovenExpectation => {
                if finding.status != FindingStatus::Confirmed {
                    return None;
                }
                let proven = finding.expectation.as_ref().is_some_and(|e| e.proof.is_proven());
                (!proven).then(|| "expectation is not proven; CONFIRMED not allowed".to_string())
            }
        }
    }

    /// Reconcile one finding in place.
    pub fn reconcile(&self, finding: &mut Finding) -> ReconciliationEntry {
        let initial_status = finding.status;
        let confidence_before = finding.confidence.as_ref().map(|c| c.score);
        let sensors = finding
            .evidence_package
            .as_ref()
            .map(|p| p.signals.clone())
            .unwrap_or_default();

        let mut rules_applied = Vec::new();
        let mut reasons = Vec::new();
        for rule in &self.rules {
            if let Some(detail) = self.fires(*rule, finding, &sensors) {
                let reason = format!("{}: {}", rule.as_str(), detail);
                if finding.downgrade(rule.target(), reason.clone()) {
                    rules_applied.push(*rule);
                    reasons.push(reason);
                }
            }
        }

        if !rules_applied.is_empty() {
            finding.confidence = finding.confidence.as_ref().map(|c| match finding.status {
                FindingStatus::Ignored => c.zeroed(ReasonCode::GuardIgnored),
                FindingStatus::Informational => {
                    c.capped(INFORMATIONAL_CAP, ReasonCode::GuardCapInformational)
                }
                FindingStatus::Suspected if initial_status == FindingStatus::Confirmed => {
                    c.capped(SUSPECTED_CAP, ReasonCode::GuardCapSuspected)
                }
                _ => c.clone(),
            });
        }

        ReconciliationEntry {
            finding_id: finding.id.clone(),
            initial_status,
            final_status: finding.status,
            rules_applied,
            reasons,
            confidence_before,
            confidence_after: finding.confidence.as_ref().map(|c| c.score),
        }
    }

    /// Reconcile every finding and collect the report. Entries are keyed by
    /// finding id, so ids must be unique within a run.
    pub fn reconcile_all(&self, findings: &mut [Finding]) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();
        for finding in findings.iter_mut() {
            let entry = self.reconcile(finding);
            report.entries.insert(entry.finding_id.clone(), entry);
        }
        report
    }
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::{ConfidenceLevel, ConfidenceResult};
    use crate::domain::evidence::EvidencePackage;
    use crate::domain::finding::ExpectationRef;
    use crate::domain::promise::ProofStrength;
    use crate::domain::trace::{NetworkRequest, NetworkSignals, UiSignals};

    fn finding(ty: FindingType, status: FindingStatus, sensors: SensorSnapshot) -> Finding {
        let mut f = Finding::new("f1", ty, status);
        f.expectation = Some(ExpectationRef {
            promise_id: "p1".to_string(),
            proof: ProofStrength::ProvenExpectation,
            observed: true,
        });
        f.confidence = Some(ConfidenceResult {
            score: 0.9,
            level: ConfidenceLevel::High,
            reasons: vec![ReasonCode::PromiseProven],
        });
        f.evidence_package = Some(EvidencePackage {
            signals: sensors,
            ..Default::default()
        });
        f
    }

    fn request(url: &str, status: Option<u16>) -> NetworkRequest {
        NetworkRequest {
            url: url.to_string(),
            method: "POST".to_string(),
            status,
            failed: false,
        }
    }

    #[test]
    fn test_analytics_only_is_ignored_with_zero_confidence() {
        let sensors = SensorSnapshot {
            network: Some(NetworkSignals {
                requests: vec![request("https://www.google-analytics.com/g/collect", Some(500))],
            }),
            ui_signals: Some(UiSignals::default()),
            ..Default::default()
        };
        let mut f = finding(FindingType::NetworkSilentFailure, FindingStatus::Confirmed, sensors);
        let entry = Guardrails::standard().reconcile(&mut f);
        assert_eq!(f.status, FindingStatus::Ignored);
        assert_eq!(entry.rules_applied, vec![GuardrailRule::AnalyticsOnly]);
        let c = f.confidence.expect("confidence");
        assert_eq!(c.score, 0.0);
        assert_eq!(c.level, ConfidenceLevel::Unproven);
        assert_eq!(c.reasons[0], ReasonCode::GuardIgnored);
    }

    #[test]
    fn test_mixed_traffic_is_not_analytics_only() {
        let sensors = SensorSnapshot {
            network: Some(NetworkSignals {
                requests: vec![
                    request("https://www.google-analytics.com/g/collect", Some(200)),
                    request("https://app.example.com/api/save", Some(500)),
                ],
            }),
            ui_signals: Some(UiSignals::default()),
            ..Default::default()
        };
        let mut f = finding(FindingType::NetworkSilentFailure, FindingStatus::Confirmed, sensors);
        let entry = Guardrails::standard().reconcile(&mut f);
        assert_eq!(f.status, FindingStatus::Confirmed);
        assert!(!entry.changed());
    }

    #[test]
    fn test_feedback_present_makes_informational() {
        let sensors = SensorSnapshot {
            ui_signals: Some(UiSignals {
                success_feedback: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut f = finding(FindingType::MissingFeedbackFailure, FindingStatus::Suspected, sensors);
        Guardrails::standard().reconcile(&mut f);
        assert_eq!(f.status, FindingStatus::Informational);
        let c = f.confidence.expect("confidence");
        assert!(c.score <= INFORMATIONAL_CAP);
        assert!(c.level <= ConfidenceLevel::Low);
    }

    #[test]
    fn test_unproven_confirmed_is_capped_to_suspected() {
        let mut f = finding(
            FindingType::StateSilentFailure,
            FindingStatus::Confirmed,
            SensorSnapshot::default(),
        );
        f.expectation = None;
        Guardrails::standard().reconcile(&mut f);
        assert_eq!(f.status, FindingStatus::Suspected);
        let c = f.confidence.expect("confidence");
        assert_eq!(c.score, SUSPECTED_CAP);
        assert_eq!(c.level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_optimistic_ui_downgrades() {
        let sensors = SensorSnapshot {
            network: Some(NetworkSignals {
                requests: vec![request("https://app.example.com/api/save", None)],
            }),
            ui_signals: Some(UiSignals {
                changed: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut f = finding(FindingType::NetworkSilentFailure, FindingStatus::Confirmed, sensors);
        let entry = Guardrails::standard().reconcile(&mut f);
        assert_eq!(entry.rules_applied, vec![GuardrailRule::OptimisticUi]);
        assert_eq!(f.status, FindingStatus::Suspected);
    }

    #[test]
    fn test_guardrails_never_upgrade() {
        let sensors = SensorSnapshot {
            network: Some(NetworkSignals {
                requests: vec![request("https://app.example.com/api/save", None)],
            }),
            ui_signals: Some(UiSignals {
                changed: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut f = finding(
            FindingType::NetworkSilentFailure,
            FindingStatus::Informational,
            sensors,
        );
        let entry = Guardrails::standard().reconcile(&mut f);
        assert_eq!(f.status, FindingStatus::Informational);
        assert!(entry.rules_applied.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = Guardrails::standard()
            .with_analytics_patterns(&["("])
            .expect_err("bad regex");
        assert!(matches!(err, VeraxError::InvalidConfig(_)));
    }

    #[test]
    fn test_report_keyed_by_finding_id() {
        let mut a = finding(
            FindingType::StateSilentFailure,
            FindingStatus::Confirmed,
            SensorSnapshot::default(),
        );
        a.id = "b-second".to_string();
        let mut b = a.clone();
        b.id = "a-first".to_string();
        b.expectation = None;
        let mut findings = vec![a, b];
        let report = Guardrails::standard().reconcile_all(&mut findings);
        let keys: Vec<&String> = report.entries.keys().collect();
        assert_eq!(keys, vec!["a-first", "b-second"]);
        assert_eq!(report.changed_count(), 1);
    }
}
