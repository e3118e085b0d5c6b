//! Observability tests for Verax run lifecycle tracing.
//!
//! These tests verify that structured tracing events are emitted for the
//! key lifecycle points: run start, scoring, downgrade, drop, coverage,
//! consistency and run outcome.

use verax_core::{
    emit_consistency_checked, emit_coverage_computed, emit_finding_downgraded,
    emit_finding_dropped, emit_finding_scored, emit_run_outcome, emit_run_started,
    ConfidenceLevel, ConfidenceResult, CoverageTruth, FindingStatus, ReasonCode, RunSpan, METRICS,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_started_logs_counts() {
    emit_run_started("run-123", 4, 2);
    assert!(logs_contain("run.started"));
    assert!(logs_contain("run-123"));
}

#[traced_test]
#[test]
fn test_emit_finding_scored_logs_level() {
    let result = ConfidenceResult {
        score: 0.85,
        level: ConfidenceLevel::High,
        reasons: vec![ReasonCode::PromiseProven],
    };
    emit_finding_scored("f-1", &result);
    assert!(logs_contain("finding.scored"));
    assert!(logs_contain("High"));
}

#[traced_test]
#[test]
fn test_emit_finding_downgraded_logs_transition() {
    emit_finding_downgraded(
        "f-2",
        FindingStatus::Confirmed,
        FindingStatus::Suspected,
        "incomplete evidence",
    );
    assert!(logs_contain("finding.downgraded"));
    assert!(logs_contain("CONFIRMED"));
    assert!(logs_contain("SUSPECTED"));
}

/// Dropped findings are logged at WARN.
#[traced_test]
#[test]
fn test_emit_finding_dropped_logs_warning() {
    emit_finding_dropped("f-3", "GROUNDED", "no observable signal");
    assert!(logs_contain("WARN"));
    assert!(logs_contain("finding.dropped"));
    assert!(logs_contain("GROUNDED"));
}

#[traced_test]
#[test]
fn test_emit_coverage_and_consistency() {
    let truth = CoverageTruth {
        total: 3,
        observed: 2,
        attempted: 2,
        legally_skipped: 1,
        coverage_ratio: 1.0,
        ..Default::default()
    };
    emit_coverage_computed("run-cov", &truth, true);
    emit_consistency_checked("run-cov", 2);
    assert!(logs_contain("coverage.computed"));
    assert!(logs_contain("consistency.checked"));
    assert!(logs_contain("ERROR"));
}

#[traced_test]
#[test]
fn test_emit_run_outcome_inside_span() {
    let span = RunSpan::enter("run-span-1");
    emit_run_outcome("run-span-1", 20, "FINDINGS");
    drop(span);
    assert!(logs_contain("run.outcome"));
    assert!(logs_contain("verax.run"));
    assert!(logs_contain("FINDINGS"));
}

#[traced_test]
#[test]
fn test_metrics_flush_emits_event() {
    METRICS.inc_scored();
    METRICS.flush();
    assert!(logs_contain("findings_scored"));
}
