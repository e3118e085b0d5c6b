//! Verax CI - run orchestration and the exit-code contract
//!
//! Provides the truth pipeline driver that:
//! - Runs every reasoning stage from `verax-core` over one run's records
//! - Maps the result onto the official CI exit codes
//! - Applies opt-in gate enforcement
//! - Persists digest-verified audit artifacts

pub mod gate;
pub mod outcome;
pub mod pipeline;
pub mod report;

// Re-export key types
pub use gate::{apply_gate, evaluate_gate, GateDecision};
pub use outcome::{determine_outcome, ExitCode, OutcomeInputs, RunOutcome};
pub use pipeline::{FindingCandidate, RunArtifacts, RunInput, TruthPipeline};
pub use report::{read_run_artifacts, render_summary_md, validate_run_id, write_run_artifacts};
