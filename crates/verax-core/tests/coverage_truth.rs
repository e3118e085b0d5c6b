//! Coverage truth, judgment mapping and execution–judgment consistency.

use verax_core::{
    check_consistency, compute_coverage, evaluate_coverage_gate, map_observation, map_outcome,
    map_outcome_label, ConsistencyViolationKind, CoveragePolicy, ExecutionRecord, Judgment,
    JudgmentKind, Observation, ObservationOutcome, SkipReason, VeraxError,
};

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

#[test]
fn legal_skip_does_not_reduce_coverage() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("p1"),
        ExecutionRecord::attempted_and_observed("p2"),
        ExecutionRecord::skipped("p3", SkipReason::WriteIntentBlocked),
    ];
    let policy = CoveragePolicy::default();
    let truth = compute_coverage(&records, &policy).expect("valid records");
    assert_eq!(truth.coverage_ratio, 1.0);
    assert_eq!(truth.legally_skipped, 1);
    assert!(evaluate_coverage_gate(&truth, &policy).passed);
}

#[test]
fn illegal_skip_reduces_coverage() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("p1"),
        ExecutionRecord::attempted_and_observed("p2"),
        ExecutionRecord::skipped("p3", SkipReason::NotInteractable),
    ];
    let policy = CoveragePolicy::default();
    let truth = compute_coverage(&records, &policy).expect("valid records");
    assert_eq!(truth.coverage_ratio, 0.667);
    assert_eq!(truth.illegally_skipped, 1);
    assert_eq!(truth.illegal_skip_reasons.get("not_interactable"), Some(&1));

    let gate = evaluate_coverage_gate(&truth, &policy);
    assert!(!gate.passed);
    assert!(gate.reason.expect("reason").contains("66.7%"));
}

#[test]
fn attempted_but_unobserved_counts_against_coverage() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("p1"),
        ExecutionRecord::attempted_not_observed("p2"),
    ];
    let truth = compute_coverage(&records, &CoveragePolicy::default()).expect("valid");
    assert_eq!(truth.attempted, 2);
    assert_eq!(truth.observed, 1);
    assert_eq!(truth.coverage_ratio, 0.5);
}

#[test]
fn threshold_is_configurable() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("p1"),
        ExecutionRecord::attempted_not_observed("p2"),
    ];
    let lenient = CoveragePolicy {
        threshold: 0.5,
        ..Default::default()
    };
    let truth = compute_coverage(&records, &lenient).expect("valid");
    assert!(evaluate_coverage_gate(&truth, &lenient).passed);
}

#[test]
fn nothing_eligible_fails_closed() {
    let records = vec![ExecutionRecord::skipped("p1", SkipReason::AuthRequired)];
    let policy = CoveragePolicy::default();
    let truth = compute_coverage(&records, &policy).expect("valid");
    assert_eq!(truth.eligible(), 0);
    assert_eq!(truth.coverage_ratio, 0.0);
    assert!(!evaluate_coverage_gate(&truth, &policy).passed);
}

#[test]
fn inconsistent_record_is_rejected() {
    let mut bad = ExecutionRecord::skipped("p1", SkipReason::AuthRequired);
    bad.attempted = true;
    let err = compute_coverage(&[bad], &CoveragePolicy::default()).expect_err("invalid");
    assert!(matches!(err, VeraxError::InvalidExecutionRecord { .. }));
}

// ---------------------------------------------------------------------------
// Judgments
// ---------------------------------------------------------------------------

#[test]
fn outcome_table_is_total() {
    let table = [
        (ObservationOutcome::Success, JudgmentKind::Pass),
        (ObservationOutcome::PartialSuccess, JudgmentKind::WeakPass),
        (ObservationOutcome::Misleading, JudgmentKind::FailureMisleading),
        (ObservationOutcome::SilentFailure, JudgmentKind::FailureSilent),
        (ObservationOutcome::Ambiguous, JudgmentKind::NeedsReview),
    ];
    for (outcome, judgment) in table {
        assert_eq!(map_outcome(outcome), judgment);
    }
}

#[test]
fn unknown_label_fails_loudly() {
    let err = map_outcome_label("PROBABLY_FINE").expect_err("unknown");
    assert!(err.is_contract_violation());
    assert_eq!(map_outcome_label("AMBIGUOUS").expect("known"), JudgmentKind::NeedsReview);
}

#[test]
fn observations_map_in_order() {
    let observations = vec![
        Observation::new("p2", ObservationOutcome::Misleading),
        Observation::new("p1", ObservationOutcome::Success),
    ];
    let judgments: Vec<Judgment> = observations
        .iter()
        .map(map_observation)
        .collect::<Result<_, _>>()
        .expect("known labels");
    assert_eq!(judgments[0].promise_id, "p2");
    assert_eq!(judgments[0].judgment, JudgmentKind::FailureMisleading);
    assert_eq!(judgments[1].judgment, JudgmentKind::Pass);

    let raw: Observation =
        serde_json::from_str(r#"{"promiseId":"p4","outcome":"NOT_A_LABEL"}"#).expect("parse");
    assert!(map_observation(&raw).expect_err("unknown").is_contract_violation());
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

fn judged(id: &str, judgment: JudgmentKind) -> Judgment {
    Judgment {
        promise_id: id.to_string(),
        judgment,
    }
}

#[test]
fn bijection_holds() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("p1"),
        ExecutionRecord::attempted_not_observed("p2"),
        ExecutionRecord::skipped("p3", SkipReason::AuthRequired),
    ];
    let judgments = vec![
        judged("p1", JudgmentKind::Pass),
        judged("p2", JudgmentKind::FailureSilent),
    ];
    let report = check_consistency(&records, &judgments);
    assert!(report.is_consistent());
    assert!(report.into_result().is_ok());
}

#[test]
fn both_directions_are_checked() {
    let records = vec![
        ExecutionRecord::attempted_not_observed("p1"),
        ExecutionRecord::skipped("p2", SkipReason::InfraFailure),
    ];
    let judgments = vec![judged("p2", JudgmentKind::Pass)];
    let report = check_consistency(&records, &judgments);
    let kinds: Vec<ConsistencyViolationKind> = report.violations.iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ConsistencyViolationKind::ExecutionWithoutJudgment));
    assert!(kinds.contains(&ConsistencyViolationKind::JudgmentForSkipped));

    let err = report.into_result().expect_err("violations");
    assert!(err.is_contract_violation());
}

#[test]
fn duplicates_and_orphans_are_violations() {
    let records = vec![ExecutionRecord::attempted_and_observed("p1")];
    let judgments = vec![
        judged("p1", JudgmentKind::Pass),
        judged("p1", JudgmentKind::Pass),
        judged("ghost", JudgmentKind::NeedsReview),
    ];
    let report = check_consistency(&records, &judgments);
    let kinds: Vec<ConsistencyViolationKind> = report.violations.iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ConsistencyViolationKind::DuplicateJudgment));
    assert!(kinds.contains(&ConsistencyViolationKind::JudgmentWithoutExecution));
}

#[test]
fn violation_order_is_stable() {
    let records = vec![
        ExecutionRecord::attempted_and_observed("b"),
        ExecutionRecord::attempted_and_observed("a"),
    ];
    let forward = check_consistency(&records, &[]);
    let reversed: Vec<ExecutionRecord> = records.into_iter().rev().collect();
    let backward = check_consistency(&reversed, &[]);
    assert_eq!(forward.violations, backward.violations);
    assert_eq!(forward.violations[0].promise_id, "a");
}
