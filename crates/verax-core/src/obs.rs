//! Structured observability hooks for Verax run lifecycle events.
//!
//! - Run-scoped tracing span via the `RunSpan` RAII guard
//! - One `emit_*` function per lifecycle event, each tagged `event = "..."`

use tracing::info;

use crate::confidence::ConfidenceResult;
use crate::coverage::CoverageTruth;
use crate::domain::finding::FindingStatus;

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// ```ignore
/// let _span = RunSpan::enter("run-12345");
/// // every event below now carries run_id = "run-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("verax.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_started(run_id: &str, promises: usize, candidates: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        promises = promises,
        candidates = candidates,
    );
}

pub fn emit_finding_scored(finding_id: &str, confidence: &ConfidenceResult) {
    info!(
        event = "finding.scored",
        finding_id = %finding_id,
        score = confidence.score,
        level = ?confidence.level,
        reasons = confidence.reasons.len(),
    );
}

pub fn emit_finding_downgraded(
    finding_id: &str,
    from: FindingStatus,
    to: FindingStatus,
    reason: &str,
) {
    info!(
        event = "finding.downgraded",
        finding_id = %finding_id,
        from = %from,
        to = %to,
        reason = %reason,
    );
}

/// Warning level: a dropped finding never reaches the report.
pub fn emit_finding_dropped(finding_id: &str, check: &str, reason: &str) {
    tracing::warn!(
        event = "finding.dropped",
        finding_id = %finding_id,
        check = %check,
        reason = %reason,
    );
}

pub fn emit_coverage_computed(run_id: &str, coverage: &CoverageTruth, passed: bool) {
    info!(
        event = "coverage.computed",
        run_id = %run_id,
        total = coverage.total,
        observed = coverage.observed,
        legally_skipped = coverage.legally_skipped,
        illegally_skipped = coverage.illegally_skipped,
        ratio = coverage.coverage_ratio,
        passed = passed,
    );
}

pub fn emit_consistency_checked(run_id: &str, violations: usize) {
    if violations == 0 {
        info!(event = "consistency.checked", run_id = %run_id, violations = 0u64);
    } else {
        tracing::error!(event = "consistency.checked", run_id = %run_id, violations = violations);
    }
}

pub fn emit_run_outcome(run_id: &str, exit_code: i32, status: &str) {
    info!(
        event = "run.outcome",
        run_id = %run_id,
        exit_code = exit_code,
        status = %status,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-run-id");
    }
}
