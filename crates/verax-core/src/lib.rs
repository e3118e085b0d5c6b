//! Verax Core Library
//!
//! The truth pipeline's reasoning stages, each a pure function over typed
//! records: evidence assembly and Evidence Law, confidence scoring,
//! guardrail reconciliation, invariant enforcement, judgment mapping,
//! coverage truth and execution–judgment consistency. Also hosts the
//! capture adapter seam, configuration and telemetry.

pub mod capture;
pub mod confidence;
pub mod config;
pub mod consistency;
pub mod contract;
pub mod coverage;
pub mod digest;
pub mod domain;
pub mod evidence;
pub mod guardrails;
pub mod invariants;
pub mod judgments;
pub mod metrics;
pub mod obs;
pub mod telemetry;

pub use domain::{
    ActionEvidence, CaptureFailure, CaptureReasonCode, CaptureStage, Comparisons, ConsoleSignals,
    Enrichment, EvidenceBuildError, EvidenceCategory, EvidencePackage, ExecutionRecord,
    ExecutionState, ExpectationRef, Finding, FindingSignals, FindingStatus, FindingType, Grouping,
    Impact, Interaction, InteractionTrace, Judgment, JudgmentKind, NavigationSignals,
    NetworkRequest, NetworkSignals, Observation, ObservationOutcome, Ownership, PageSnapshot,
    ProofStrength, Promise, PromiseKind, Result, SensorCategory, SensorSnapshot, SkipReason,
    SourceRef, Timing, Trigger, UiSignals, UserRisk, VeraxError,
};

pub use capture::{CaptureDriver, CaptureOutcome, EvidenceCapture, PageCapture, RetryPolicy};
pub use confidence::{
    score, ConfidenceInput, ConfidenceLevel, ConfidenceResult, ReasonCode, HIGH_THRESHOLD,
    INFORMATIONAL_CAP, MEDIUM_THRESHOLD, SUSPECTED_CAP, UNPROVEN_THRESHOLD,
};
pub use config::{CoverageConfig, GateConfig, GateFailOn, GateScope, GuardrailConfig, VeraxConfig};
pub use consistency::{
    check_consistency, ConsistencyReport, ConsistencyViolation, ConsistencyViolationKind,
};
pub use contract::CONTRACT_VERSION;
pub use coverage::{
    compute_coverage, evaluate_coverage_gate, CoverageGateVerdict, CoveragePolicy, CoverageTruth,
};
pub use digest::{canonical_json, digest_of, ContentDigest};
pub use evidence::{
    admit_finding, assert_evidence_law, build_confirmed_package, build_evidence_package,
    downgrade_reason, evidence_categories, missing_required_fields, validate_for_status,
    validate_strict, EvidenceOverrides, EvidenceValidation, REQUIRED_EVIDENCE_FIELDS,
};
pub use guardrails::{GuardrailRule, Guardrails, ReconciliationEntry, ReconciliationReport};
pub use invariants::{
    check_finding, DroppedFinding, EnforcementMode, EnforcementReport, InvariantCheck,
    InvariantEnforcer,
};
pub use judgments::{map_observation, map_outcome, map_outcome_label};

pub use metrics::METRICS;
pub use obs::{
    emit_consistency_checked, emit_coverage_computed, emit_finding_downgraded,
    emit_finding_dropped, emit_finding_scored, emit_run_outcome, emit_run_started, RunSpan,
};
pub use telemetry::init_tracing;

/// Verax version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
