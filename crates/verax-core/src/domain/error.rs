//! Domain-level error taxonomy for Verax.
//!
//! Two classes live here. Recoverable data conditions (missing evidence, low
//! coverage, ambiguous signals) never appear as errors; they are modelled as
//! typed results and handled by downgrade or drop logic. What remains are
//! contract violations, which abort a run with `INVARIANT_VIOLATION`, and
//! ordinary I/O or configuration failures.

use crate::domain::evidence::EvidencePackage;

/// Raised when a finding bound for `CONFIRMED` carries an incomplete
/// evidence package.
///
/// Carries the partial package so the caller can still attach it to a
/// downgraded finding.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "evidence law violation: CONFIRMED requires complete evidence, missing [{}]",
    missing_fields.join(", ")
)]
pub struct EvidenceBuildError {
    pub missing_fields: Vec<String>,
    pub partial: Box<EvidencePackage>,
}

/// Verax domain errors.
#[derive(Debug, thiserror::Error)]
pub enum VeraxError {
    #[error(transparent)]
    EvidenceLaw(#[from] EvidenceBuildError),

    #[error("invariant violation: {}", violations.join("; "))]
    InvariantViolation { violations: Vec<String> },

    #[error("unrecognized observation outcome: {0}")]
    UnknownOutcome(String),

    #[error("invalid execution record for promise {promise_id}: {reason}")]
    InvalidExecutionRecord { promise_id: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeraxError {
    /// Whether this error breaks a pipeline contract rather than reporting
    /// an environmental failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::EvidenceLaw(_)
                | Self::InvariantViolation { .. }
                | Self::UnknownOutcome(_)
                | Self::InvalidExecutionRecord { .. }
        )
    }
}

/// Result type for Verax domain operations.
pub type Result<T> = std::result::Result<T, VeraxError>;
