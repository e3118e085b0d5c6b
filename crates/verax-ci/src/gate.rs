//! Opt-in gate enforcement (`--enforce-gates`).
//!
//! Additive only: a triggered gate can turn a `SUCCESS` run into `FINDINGS`
//! but never lowers or replaces a code the determiner already produced.
//! Disabled gates are a no-op.
//!
//! `fail_on = "incomplete"` is a report-only signal. An INCOMPLETE run
//! already exits 30 and rewriting that to 20 would lower it, so the trip is
//! recorded in [`GateDecision`] and the exit code is left alone.

use serde::{Deserialize, Serialize};

use verax_core::{Finding, FindingStatus, GateConfig, GateFailOn, GateScope};

use crate::outcome::{ExitCode, RunOutcome};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub enabled: bool,
    pub triggered: bool,
    pub reason: Option<String>,
}

fn in_scope(status: FindingStatus, scope: GateScope) -> bool {
    match scope {
        GateScope::Confirmed => status == FindingStatus::Confirmed,
        GateScope::Suspected => {
            matches!(status, FindingStatus::Confirmed | FindingStatus::Suspected)
        }
    }
}

/// Decide whether the configured gate trips for this run.
pub fn evaluate_gate(
    config: &GateConfig,
    outcome: &RunOutcome,
    findings: &[Finding],
) -> GateDecision {
    if !config.enabled {
        return GateDecision::default();
    }

    let matching = findings
        .iter()
        .filter(|f| in_scope(f.status, config.scope))
        .count();
    let findings_hit =
        (matching > 0).then(|| format!("{matching} finding(s) in scope {:?}", config.scope));
    let incomplete_hit =
        (outcome.status == ExitCode::Incomplete).then(|| "run is INCOMPLETE".to_string());

    let reason = match config.fail_on {
        GateFailOn::Findings => findings_hit,
        GateFailOn::Incomplete => incomplete_hit,
        GateFailOn::Any => findings_hit
            .or(incomplete_hit)
            .or_else(|| (!outcome.is_success()).then(|| format!("run outcome {}", outcome.status))),
    };

    GateDecision {
        enabled: true,
        triggered: reason.is_some(),
        reason,
    }
}

/// Fold a gate decision into the outcome. Only a `SUCCESS` outcome can
/// change; every other code is already at least as strong as `FINDINGS`.
pub fn apply_gate(outcome: RunOutcome, decision: &GateDecision) -> RunOutcome {
    if !decision.triggered || !outcome.is_success() {
        return outcome;
    }
    let mut reasons = outcome.reasons;
    reasons.push(format!(
        "enforced gate: {}",
        decision.reason.as_deref().unwrap_or("triggered")
    ));
    RunOutcome::new(ExitCode::Findings, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verax_core::FindingType;

    fn suspected() -> Vec<Finding> {
        vec![Finding::new("f1", FindingType::StateSilentFailure, FindingStatus::Suspected)]
    }

    #[test]
    fn test_disabled_gate_is_noop() {
        let outcome = RunOutcome::new(ExitCode::Success, vec![]);
        let decision = evaluate_gate(&GateConfig::default(), &outcome, &suspected());
        assert!(!decision.enabled);
        assert!(!decision.triggered);
        assert_eq!(apply_gate(outcome.clone(), &decision), outcome);
    }

    #[test]
    fn test_scope_controls_findings_gate() {
        let outcome = RunOutcome::new(ExitCode::Success, vec![]);
        let confirmed_only = GateConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(!evaluate_gate(&confirmed_only, &outcome, &suspected()).triggered);

        let suspected_scope = GateConfig {
            enabled: true,
            scope: GateScope::Suspected,
            ..Default::default()
        };
        let decision = evaluate_gate(&suspected_scope, &outcome, &suspected());
        assert!(decision.triggered);
        let applied = apply_gate(outcome, &decision);
        assert_eq!(applied.status, ExitCode::Findings);
    }

    #[test]
    fn test_gate_never_overrides_stronger_code() {
        let outcome = RunOutcome::new(ExitCode::InvariantViolation, vec!["bijection".to_string()]);
        let decision = GateDecision {
            enabled: true,
            triggered: true,
            reason: Some("x".to_string()),
        };
        assert_eq!(apply_gate(outcome, &decision).exit_code, 50);
    }

    #[test]
    fn test_incomplete_gate() {
        let cfg = GateConfig {
            enabled: true,
            fail_on: GateFailOn::Incomplete,
            ..Default::default()
        };
        let incomplete = RunOutcome::new(ExitCode::Incomplete, vec!["coverage".to_string()]);
        let decision = evaluate_gate(&cfg, &incomplete, &[]);
        assert!(decision.triggered);
        assert_eq!(decision.reason.as_deref(), Some("run is INCOMPLETE"));
        // Recorded only; the exit code stays 30.
        let applied = apply_gate(incomplete.clone(), &decision);
        assert_eq!(applied, incomplete);
        assert_eq!(applied.exit_code, 30);

        let ok = RunOutcome::new(ExitCode::Success, vec![]);
        assert!(!evaluate_gate(&cfg, &ok, &suspected()).triggered);
    }
}
