//! Execution–judgment consistency.
//!
//! Proves the bijection between promises with a non-skipped execution record
//! and promises with a judgment. Any violation is fatal to the run's success
//! status whatever the judgments say.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, VeraxError};
use crate::domain::execution::ExecutionRecord;
use crate::domain::judgment::Judgment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyViolationKind {
    ExecutionWithoutJudgment,
    JudgmentForSkipped,
    JudgmentWithoutExecution,
    DuplicateJudgment,
    DuplicateExecutionRecord,
    InvalidRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyViolation {
    pub kind: ConsistencyViolationKind,
    pub promise_id: String,
    pub detail: String,
}

impl std::fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = serde_json::to_value(self.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.kind));
        write!(f, "{kind}: {} ({})", self.promise_id, self.detail)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub checked_records: usize,
    pub checked_judgments: usize,
    pub violations: Vec<ConsistencyViolation>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn violations into the fatal error.
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        Err(VeraxError::InvariantViolation {
            violations: self.violations.iter().map(|v| v.to_string()).collect(),
        })
    }
}

/// Check both directions of the bijection. Violations are sorted by kind then
/// promise id so the report is stable across input order.
pub fn check_consistency(records: &[ExecutionRecord], judgments: &[Judgment]) -> ConsistencyReport {
    let mut violations = Vec::new();

    let mut by_promise: BTreeMap<&str, &ExecutionRecord> = BTreeMap::new();
    for record in records {
        if let Err(e) = record.validate() {
            violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::InvalidRecord,
                promise_id: record.promise_id.clone(),
                detail: e.to_string(),
            });
        }
        if by_promise.insert(record.promise_id.as_str(), record).is_some() {
            violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::DuplicateExecutionRecord,
                promise_id: record.promise_id.clone(),
                detail: "more than one execution record for this promise".to_string(),
            });
        }
    }

    let mut judged: BTreeSet<&str> = BTreeSet::new();
    for judgment in judgments {
        let id = judgment.promise_id.as_str();
        if !judged.insert(id) {
            violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::DuplicateJudgment,
                promise_id: id.to_string(),
                detail: "more than one judgment for this promise".to_string(),
            });
            continue;
        }
        match by_promise.get(id) {
            None => violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::JudgmentWithoutExecution,
                promise_id: id.to_string(),
                detail: format!("judged {:?} with no execution record", judgment.judgment),
            }),
            Some(record) if !record.is_attempted() => violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::JudgmentForSkipped,
                promise_id: id.to_string(),
                detail: format!(
                    "skipped ({:?}) but judged {:?}",
                    record.skip_reason, judgment.judgment
                ),
            }),
            Some(_) => {}
        }
    }

    for (id, record) in &by_promise {
        if record.is_attempted() && !judged.contains(id) {
            violations.push(ConsistencyViolation {
                kind: ConsistencyViolationKind::ExecutionWithoutJudgment,
                promise_id: id.to_string(),
                detail: format!("{:?} without a judgment", record.state),
            });
        }
    }

    violations.sort();
    violations.dedup();
    ConsistencyReport {
        checked_records: records.len(),
        checked_judgments: judgments.len(),
        violations,
    }
}
