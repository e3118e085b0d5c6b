//! Evidence package builder and Evidence Law enforcement.

pub mod builder;
pub mod law;

pub use builder::{
    build_evidence_package, evidence_categories, missing_required_fields, EvidenceOverrides,
    REQUIRED_EVIDENCE_FIELDS,
};
pub use law::{
    admit_finding, assert_evidence_law, build_confirmed_package, downgrade_reason,
    validate_for_status, validate_strict, EvidenceValidation,
};
