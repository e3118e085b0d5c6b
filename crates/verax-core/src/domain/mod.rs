//! Domain models for Verax.
//!
//! Canonical definitions for the core entities:
//! - `Promise`: source-anchored expectation
//! - `InteractionTrace`: one attempted interaction with sensor snapshots
//! - `EvidencePackage`: before/after evidence bundle
//! - `Finding`: judged claim with confidence and evidence
//! - `ExecutionRecord` / `Judgment`: per-promise run bookkeeping

pub mod error;
pub mod evidence;
pub mod execution;
pub mod finding;
pub mod judgment;
pub mod promise;
pub mod trace;

// Re-export main types and errors
pub use error::{EvidenceBuildError, Result, VeraxError};
pub use evidence::{
    ActionEvidence, CaptureFailure, CaptureReasonCode, CaptureStage, EvidencePackage,
    PageSnapshot, Trigger,
};
pub use execution::{ExecutionRecord, ExecutionState, SkipReason};
pub use finding::{
    Enrichment, EvidenceCategory, ExpectationRef, Finding, FindingSignals, FindingStatus,
    FindingType, Grouping, Impact, Ownership, UserRisk,
};
pub use judgment::{Judgment, JudgmentKind, Observation, ObservationOutcome};
pub use promise::{ProofStrength, Promise, PromiseKind, SourceRef};
pub use trace::{
    Comparisons, ConsoleSignals, Interaction, InteractionTrace, NavigationSignals,
    NetworkRequest, NetworkSignals, SensorCategory, SensorSnapshot, Timing, UiSignals,
};
