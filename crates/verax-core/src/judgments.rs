//! Observation outcome to judgment mapping.
//!
//! A fixed, total table. Unknown outcome labels never reach the table; they
//! fail at parse time with `UNKNOWN_OUTCOME`.

use crate::domain::error::Result;
use crate::domain::judgment::{Judgment, JudgmentKind, Observation, ObservationOutcome};

pub fn map_outcome(outcome: ObservationOutcome) -> JudgmentKind {
    match outcome {
        ObservationOutcome::Success => JudgmentKind::Pass,
        ObservationOutcome::PartialSuccess => JudgmentKind::WeakPass,
        ObservationOutcome::Misleading => JudgmentKind::FailureMisleading,
        ObservationOutcome::SilentFailure => JudgmentKind::FailureSilent,
        ObservationOutcome::Ambiguous => JudgmentKind::NeedsReview,
    }
}

/// Map a raw outcome label, failing loudly on anything outside the table.
pub fn map_outcome_label(label: &str) -> Result<JudgmentKind> {
    Ok(map_outcome(label.parse()?))
}

/// Judge one observation.
pub fn map_observation(observation: &Observation) -> Result<Judgment> {
    Ok(Judgment {
        promise_id: observation.promise_id.clone(),
        judgment: map_outcome_label(&observation.outcome)?,
    })
}
