//! Coverage truth.
//!
//! `coverage_ratio = observed / (total - legally_skipped)`. Illegal skips and
//! attempted-but-unobserved promises both count against coverage. When every
//! promise was legally skipped (or there were none) the denominator is zero;
//! the ratio is then 0.0 and the gate fails closed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;
use crate::domain::execution::{ExecutionRecord, ExecutionState, SkipReason};

pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoveragePolicy {
    pub threshold: f64,
    pub legal_skip_reasons: Vec<SkipReason>,
}

impl Default for CoveragePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            legal_skip_reasons: SkipReason::default_legal(),
        }
    }
}

impl CoveragePolicy {
    pub fn is_legal(&self, reason: Option<SkipReason>) -> bool {
        reason.is_some_and(|r| self.legal_skip_reasons.contains(&r))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoverageTruth {
    pub total: usize,
    pub observed: usize,
    pub attempted: usize,
    pub legally_skipped: usize,
    pub illegally_skipped: usize,
    pub coverage_ratio: f64,
    /// Illegal skips grouped by reason.
    #[serde(default)]
    pub illegal_skip_reasons: BTreeMap<String, usize>,
}

impl CoverageTruth {
    /// Promises that count toward the denominator.
    pub fn eligible(&self) -> usize {
        self.total.saturating_sub(self.legally_skipped)
    }
}

/// Aggregate coverage from every record of a run. Each record is validated
/// first; an inconsistent record is a contract violation.
pub fn compute_coverage(
    records: &[ExecutionRecord],
    policy: &CoveragePolicy,
) -> Result<CoverageTruth> {
    let mut truth = CoverageTruth {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        record.validate()?;
        match record.state {
            ExecutionState::AttemptedAndObserved => {
                truth.attempted += 1;
                truth.observed += 1;
            }
            ExecutionState::AttemptedNotObserved => truth.attempted += 1,
            ExecutionState::Skipped => {
                if policy.is_legal(record.skip_reason) {
                    truth.legally_skipped += 1;
                } else {
                    truth.illegally_skipped += 1;
                    let key = record
                        .skip_reason
                        .map(|r| skip_reason_label(r).to_string())
                        .unwrap_or_else(|| "unspecified".to_string());
                    *truth.illegal_skip_reasons.entry(key).or_insert(0) += 1;
                }
            }
        }
    }

    let eligible = truth.eligible();
    truth.coverage_ratio = if eligible == 0 {
        0.0
    } else {
        ((truth.observed as f64 / eligible as f64) * 1000.0).round() / 1000.0
    };
    Ok(truth)
}

fn skip_reason_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::AuthRequired => "auth_required",
        SkipReason::InfraFailure => "infra_failure",
        SkipReason::WriteIntentBlocked => "write_intent_blocked",
        SkipReason::ElementNotFound => "element_not_found",
        SkipReason::NotInteractable => "not_interactable",
        SkipReason::Timeout => "timeout",
        SkipReason::BudgetExceeded => "budget_exceeded",
        SkipReason::Unspecified => "unspecified",
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoverageGateVerdict {
    pub passed: bool,
    pub coverage_ratio: f64,
    pub threshold: f64,
    pub reason: Option<String>,
}

/// Apply the threshold. The same threshold applies whatever the judgments
/// say; an all-`PASS` run below threshold still fails.
pub fn evaluate_coverage_gate(
    truth: &CoverageTruth,
    policy: &CoveragePolicy,
) -> CoverageGateVerdict {
    let reason = if truth.eligible() == 0 {
        Some("no promises eligible for coverage".to_string())
    } else if (truth.observed as f64 / truth.eligible() as f64) < policy.threshold {
        // Compare unrounded so 0.8996 cannot round its way past 0.9.
        Some(format!(
            "coverage {:.1}% < required {:.1}% ({} of {} eligible observed)",
            truth.coverage_ratio * 100.0,
            policy.threshold * 100.0,
            truth.observed,
            truth.eligible()
        ))
    } else {
        None
    };
    CoverageGateVerdict {
        passed: reason.is_none(),
        coverage_ratio: truth.coverage_ratio,
        threshold: policy.threshold,
        reason,
    }
}
