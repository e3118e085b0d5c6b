//! Evidence Law: `CONFIRMED` requires a complete evidence package.
//!
//! Strict validation refuses with a typed [`EvidenceBuildError`]; it never
//! hands back a package that claims completeness it does not have. Lenient
//! validation reports whether a finding must be downgraded and leaves the
//! decision to the caller.

use serde::{Deserialize, Serialize};

use crate::domain::error::{EvidenceBuildError, Result, VeraxError};
use crate::domain::evidence::EvidencePackage;
use crate::domain::finding::{Finding, FindingStatus};
use crate::domain::promise::Promise;
use crate::domain::trace::InteractionTrace;
use crate::evidence::builder::{
    build_evidence_package, missing_required_fields, EvidenceOverrides, REQUIRED_EVIDENCE_FIELDS,
};

/// Outcome of lenient validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceValidation {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
    pub should_downgrade: bool,
}

/// Validate a package for a `CONFIRMED`-bound finding.
///
/// Completeness is recomputed from the fields; the stored `is_complete` flag
/// is not trusted.
pub fn validate_strict(pkg: &EvidencePackage) -> std::result::Result<(), EvidenceBuildError> {
    let missing = missing_required_fields(pkg);
    if missing.is_empty() {
        return Ok(());
    }
    let mut partial = pkg.clone();
    partial.missing_evidence = missing.clone();
    partial.is_complete = false;
    Err(EvidenceBuildError {
        missing_fields: missing,
        partial: Box::new(partial),
    })
}

/// Build a package that is guaranteed complete, or refuse.
pub fn build_confirmed_package(
    promise: Option<&Promise>,
    trace: Option<&InteractionTrace>,
    overrides: &EvidenceOverrides,
) -> std::result::Result<EvidencePackage, EvidenceBuildError> {
    let pkg = build_evidence_package(promise, trace, overrides);
    validate_strict(&pkg)?;
    Ok(pkg)
}

/// Lenient validation. `should_downgrade` is true exactly when `status` is
/// `CONFIRMED` and the package is incomplete.
pub fn validate_for_status(pkg: &EvidencePackage, status: FindingStatus) -> EvidenceValidation {
    let missing_fields = missing_required_fields(pkg);
    let is_complete = missing_fields.is_empty();
    EvidenceValidation {
        is_complete,
        should_downgrade: status == FindingStatus::Confirmed && !is_complete,
        missing_fields,
    }
}

/// Human-readable downgrade reason, including capture-failure codes.
pub fn downgrade_reason(missing_fields: &[String], pkg: Option<&EvidencePackage>) -> String {
    let mut reason = format!(
        "downgraded CONFIRMED -> SUSPECTED: incomplete evidence, missing [{}]",
        missing_fields.join(", ")
    );
    let codes = pkg.map(|p| p.capture_failure_codes()).unwrap_or_default();
    if !codes.is_empty() {
        reason.push_str(&format!("; capture failures [{}]", codes.join(", ")));
    }
    reason
}

/// Apply the law to one finding: a `CONFIRMED` finding whose package is
/// absent or incomplete is forced to `SUSPECTED` with a recorded reason.
///
/// Returns the refusal when a downgrade happened so the caller can log it.
pub fn admit_finding(finding: &mut Finding) -> Option<EvidenceBuildError> {
    if finding.status != FindingStatus::Confirmed {
        if let Some(pkg) = finding.evidence_package.as_mut() {
            pkg.missing_evidence = missing_required_fields(pkg);
            pkg.is_complete = pkg.missing_evidence.is_empty();
        }
        return None;
    }

    let refusal = match finding.evidence_package.as_ref() {
        Some(pkg) => validate_strict(pkg).err(),
        None => Some(EvidenceBuildError {
            missing_fields: REQUIRED_EVIDENCE_FIELDS.iter().map(|f| f.to_string()).collect(),
            partial: Box::default(),
        }),
    };

    match refusal {
        None => {
            if let Some(pkg) = finding.evidence_package.as_mut() {
                pkg.missing_evidence.clear();
                pkg.is_complete = true;
            }
            None
        }
        Some(err) => {
            let reason = downgrade_reason(&err.missing_fields, finding.evidence_package.as_ref());
            if let Some(pkg) = finding.evidence_package.as_mut() {
                pkg.missing_evidence = err.missing_fields.clone();
                pkg.is_complete = false;
            }
            finding.downgrade(FindingStatus::Suspected, reason);
            Some(err)
        }
    }
}

/// Report-time assertion: no `CONFIRMED` finding may carry incomplete
/// evidence. A failure here means an earlier stage broke the contract.
pub fn assert_evidence_law(findings: &[Finding]) -> Result<()> {
    for finding in findings {
        if finding.status != FindingStatus::Confirmed {
            continue;
        }
        match finding.evidence_package.as_ref() {
            Some(pkg) => validate_strict(pkg)?,
            None => {
                return Err(VeraxError::InvariantViolation {
                    violations: vec![format!(
                        "CONFIRMED finding {} has no evidence package",
                        finding.id
                    )],
                })
            }
        }
    }
    Ok(())
}
