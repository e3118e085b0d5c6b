//! Exit-code determination.
//!
//! Precedence, highest wins:
//!
//! 1. contract or execution–judgment consistency violation
//! 2. coverage gate failure
//! 3. judgments: `FAILURE_MISLEADING` > `FAILURE_SILENT` > `NEEDS_REVIEW`
//! 4. success
//!
//! The finer internal verdict collapses onto the public [`ExitCode`] table
//! and never leaves this module.

use serde::{Deserialize, Serialize};

use verax_core::{ConsistencyReport, CoverageGateVerdict, Judgment, JudgmentKind};

/// The official exit-code contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitCode {
    Success,
    Findings,
    Incomplete,
    InvariantViolation,
    UsageError,
}

impl ExitCode {
    pub const ALL: [ExitCode; 5] = [
        Self::Success,
        Self::Findings,
        Self::Incomplete,
        Self::InvariantViolation,
        Self::UsageError,
    ];

    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Findings => 20,
            Self::Incomplete => 30,
            Self::InvariantViolation => 50,
            Self::UsageError => 64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Findings => "FINDINGS",
            Self::Incomplete => "INCOMPLETE",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::UsageError => "USAGE_ERROR",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "all eligible promises observed, no failing judgments",
            Self::Findings => "at least one failing or review-worthy judgment",
            Self::Incomplete => "coverage below threshold",
            Self::InvariantViolation => "execution/judgment mismatch or broken contract",
            Self::UsageError => "malformed invocation or unreadable input",
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{exitCode, status}` plus the reasons that decided it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub exit_code: i32,
    pub status: ExitCode,
    pub reasons: Vec<String>,
}

impl RunOutcome {
    pub fn new(status: ExitCode, reasons: Vec<String>) -> Self {
        Self {
            exit_code: status.code(),
            status,
            reasons,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExitCode::Success
    }
}

// ---------------------------------------------------------------------------
// Internal verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Verdict {
    Success,
    NeedsReview,
    SilentFailure,
    MisleadingFailure,
    CoverageFailure,
    ConsistencyViolation,
}

impl Verdict {
    fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::Success,
            Self::NeedsReview | Self::SilentFailure | Self::MisleadingFailure => ExitCode::Findings,
            Self::CoverageFailure => ExitCode::Incomplete,
            Self::ConsistencyViolation => ExitCode::InvariantViolation,
        }
    }
}

fn judgment_verdict(judgments: &[Judgment]) -> (Verdict, Option<String>) {
    let count = |kind: JudgmentKind| judgments.iter().filter(|j| j.judgment == kind).count();
    let misleading = count(JudgmentKind::FailureMisleading);
    let silent = count(JudgmentKind::FailureSilent);
    let review = count(JudgmentKind::NeedsReview);
    if misleading > 0 {
        (
            Verdict::MisleadingFailure,
            Some(format!("{misleading} FAILURE_MISLEADING judgment(s)")),
        )
    } else if silent > 0 {
        (Verdict::SilentFailure, Some(format!("{silent} FAILURE_SILENT judgment(s)")))
    } else if review > 0 {
        (Verdict::NeedsReview, Some(format!("{review} NEEDS_REVIEW judgment(s)")))
    } else {
        (Verdict::Success, None)
    }
}

/// Everything the determiner looks at.
pub struct OutcomeInputs<'a> {
    /// Contract violations raised by earlier stages (Evidence Law, bad
    /// records, unknown outcomes).
    pub contract_violations: &'a [String],
    pub consistency: &'a ConsistencyReport,
    pub coverage_gate: &'a CoverageGateVerdict,
    pub judgments: &'a [Judgment],
}

pub fn determine_outcome(inputs: &OutcomeInputs<'_>) -> RunOutcome {
    let mut reasons = Vec::new();
    let mut verdict = Verdict::Success;

    if !inputs.contract_violations.is_empty() || !inputs.consistency.is_consistent() {
        verdict = verdict.max(Verdict::ConsistencyViolation);
        reasons.extend(inputs.contract_violations.iter().cloned());
        reasons.extend(inputs.consistency.violations.iter().map(|v| v.to_string()));
    }

    if !inputs.coverage_gate.passed {
        verdict = verdict.max(Verdict::CoverageFailure);
        reasons.push(
            inputs
                .coverage_gate
                .reason
                .clone()
                .unwrap_or_else(|| "coverage gate failed".to_string()),
        );
    }

    let (judged, reason) = judgment_verdict(inputs.judgments);
    verdict = verdict.max(judged);
    reasons.extend(reason);

    RunOutcome::new(verdict.exit_code(), reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verax_core::{ConsistencyViolation, ConsistencyViolationKind};

    fn gate(passed: bool) -> CoverageGateVerdict {
        CoverageGateVerdict {
            passed,
            coverage_ratio: if passed { 1.0 } else { 0.5 },
            threshold: 0.9,
            reason: (!passed).then(|| "coverage 50.0% < required 90.0%".to_string()),
        }
    }

    fn judgments(kinds: &[JudgmentKind]) -> Vec<Judgment> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, k)| Judgment {
                promise_id: format!("p{i}"),
                judgment: *k,
            })
            .collect()
    }

    #[test]
    fn test_contract_codes() {
        let codes: Vec<i32> = ExitCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![0, 20, 30, 50, 64]);
    }

    #[test]
    fn test_all_pass_is_success() {
        let j = judgments(&[JudgmentKind::Pass, JudgmentKind::WeakPass]);
        let out = determine_outcome(&OutcomeInputs {
            contract_violations: &[],
            consistency: &ConsistencyReport::default(),
            coverage_gate: &gate(true),
            judgments: &j,
        });
        assert_eq!(out.status, ExitCode::Success);
        assert!(out.reasons.is_empty());
    }

    #[test]
    fn test_coverage_failure_overrides_all_pass() {
        let j = judgments(&[JudgmentKind::Pass]);
        let out = determine_outcome(&OutcomeInputs {
            contract_violations: &[],
            consistency: &ConsistencyReport::default(),
            coverage_gate: &gate(false),
            judgments: &j,
        });
        assert_eq!(out.exit_code, 30);
    }

    #[test]
    fn test_consistency_wins_over_everything() {
        let consistency = ConsistencyReport {
            checked_records: 1,
            checked_judgments: 0,
            violations: vec![ConsistencyViolation {
                kind: ConsistencyViolationKind::ExecutionWithoutJudgment,
                promise_id: "p9".to_string(),
                detail: "missing".to_string(),
            }],
        };
        let j = judgments(&[JudgmentKind::FailureSilent]);
        let out = determine_outcome(&OutcomeInputs {
            contract_violations: &[],
            consistency: &consistency,
            coverage_gate: &gate(false),
            judgments: &j,
        });
        assert_eq!(out.status, ExitCode::InvariantViolation);
        assert_eq!(out.exit_code, 50);
        assert_eq!(out.reasons.len(), 3);
    }

    #[test]
    fn test_judgment_ordering() {
        let j = judgments(&[
            JudgmentKind::NeedsReview,
            JudgmentKind::FailureSilent,
            JudgmentKind::FailureMisleading,
        ]);
        let (v, reason) = judgment_verdict(&j);
        assert_eq!(v, Verdict::MisleadingFailure);
        assert!(reason.expect("reason").contains("FAILURE_MISLEADING"));

        let (v, _) = judgment_verdict(&judgments(&[JudgmentKind::NeedsReview, JudgmentKind::Pass]));
        assert_eq!(v, Verdict::NeedsReview);
        assert_eq!(v.exit_code(), ExitCode::Findings);
    }

    #[test]
    fn test_status_wire_name() {
        let out = RunOutcome::new(ExitCode::InvariantViolation, vec![]);
        let json = serde_json::to_value(&out).expect("serialize");
        assert_eq!(json["status"], "INVARIANT_VIOLATION");
        assert_eq!(json["exitCode"], 50);
    }
}
