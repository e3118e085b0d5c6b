//! Truth pipeline orchestration.
//!
//! Runs every reasoning stage over one run's records, in order:
//!
//! 1. evidence package build
//! 2. confidence scoring
//! 3. Evidence Law admission (`CONFIRMED` without complete evidence is
//!    forced to `SUSPECTED`)
//! 4. guardrail reconciliation
//! 5. global invariant enforcement
//! 6. Evidence Law assertion over the surviving set
//! 7. judgment mapping
//! 8. coverage truth and coverage gate
//! 9. execution–judgment consistency
//! 10. exit-code determination, then optional gate enforcement
//!
//! Stages 7–10 need the complete record and judgment sets for the run, so
//! the pipeline takes a whole [`RunInput`] rather than streaming.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use verax_core::confidence::{score, ConfidenceInput, ReasonCode, SUSPECTED_CAP};
use verax_core::{
    admit_finding, assert_evidence_law, build_evidence_package, check_consistency,
    compute_coverage, emit_consistency_checked, emit_coverage_computed, emit_finding_downgraded,
    emit_finding_dropped, emit_finding_scored, emit_run_outcome, emit_run_started,
    evaluate_coverage_gate, evidence_categories, map_observation, Comparisons,
    ConsistencyReport, CoverageGateVerdict, CoveragePolicy, CoverageTruth, DroppedFinding,
    EnforcementMode, EvidenceOverrides, ExecutionRecord, ExpectationRef, Finding, FindingSignals,
    FindingStatus, FindingType, GateConfig, Guardrails, InteractionTrace, InvariantEnforcer,
    Judgment, Observation, Promise, ReconciliationReport, Result, RunSpan, VeraxConfig,
    CONTRACT_VERSION, METRICS,
};

use crate::gate::{apply_gate, evaluate_gate, GateDecision};
use crate::outcome::{determine_outcome, OutcomeInputs, RunOutcome};
use crate::report::validate_run_id;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn default_requested_status() -> FindingStatus {
    FindingStatus::Suspected
}

/// A detector's claim before any stage has looked at it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FindingCandidate {
    pub id: String,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    #[serde(default)]
    pub promise_id: Option<String>,
    #[serde(default = "default_requested_status")]
    pub requested_status: FindingStatus,
    #[serde(default)]
    pub signals: Option<FindingSignals>,
    #[serde(default)]
    pub evidence: EvidenceOverrides,
    #[serde(default)]
    pub ambiguity_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub promises: Vec<Promise>,
    #[serde(default)]
    pub traces: Vec<InteractionTrace>,
    #[serde(default)]
    pub candidates: Vec<FindingCandidate>,
    #[serde(default)]
    pub execution_records: Vec<ExecutionRecord>,
    /// Outcome labels are parsed strictly by the pipeline; an unknown label
    /// is a contract violation.
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl RunInput {
    /// Reject inputs that cannot name a run directory. Artifacts land in
    /// `<out>/<run_id>/`, so an explicit id must be one plain path component.
    pub fn validate(&self) -> Result<()> {
        match &self.run_id {
            Some(id) => validate_run_id(id),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Everything a run exposes to reporting layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunArtifacts {
    pub contract_version: u32,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub enforcement_mode: EnforcementMode,
    /// Post-guardrail, post-invariant findings.
    pub findings: Vec<Finding>,
    /// Findings a guardrail moved to `IGNORED`.
    pub ignored: Vec<Finding>,
    pub dropped: Vec<DroppedFinding>,
    /// Development mode only: invariant failures that were kept.
    pub flagged: Vec<DroppedFinding>,
    pub reconciliation: ReconciliationReport,
    pub coverage: CoverageTruth,
    pub coverage_gate: CoverageGateVerdict,
    pub consistency: ConsistencyReport,
    pub judgments: Vec<Judgment>,
    pub outcome: RunOutcome,
    pub gate: GateDecision,
}

impl RunArtifacts {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct TruthPipeline {
    mode: EnforcementMode,
    guardrails: Guardrails,
    coverage: CoveragePolicy,
    gates: GateConfig,
}

impl TruthPipeline {
    /// Build a pipeline from configuration. Fails only on invalid config.
    pub fn new(config: &VeraxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mode: config.enforcement_mode,
            guardrails: config.guardrails()?,
            coverage: config.coverage_policy(),
            gates: config.gates.clone(),
        })
    }

    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }

    pub fn run(&self, input: &RunInput) -> RunArtifacts {
        let run_id = input
            .run_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let _span = RunSpan::enter(&run_id);
        emit_run_started(&run_id, input.promises.len(), input.candidates.len());

        let mut contract_violations: Vec<String> = Vec::new();

        // 1–3: build, score, admit. Reconciliation is keyed by finding id, so
        // a repeated id would hide one finding's audit entry.
        let mut seen = BTreeSet::new();
        let mut findings: Vec<Finding> = Vec::with_capacity(input.candidates.len());
        for candidate in &input.candidates {
            if !seen.insert(candidate.id.as_str()) {
                warn!(finding_id = %candidate.id, "duplicate finding id");
                contract_violations.push(format!("duplicate finding id {:?}", candidate.id));
                continue;
            }
            findings.push(self.assess_candidate(candidate, input));
        }

        // 4: guardrails.
        let reconciliation = self.guardrails.reconcile_all(&mut findings);
        for entry in reconciliation.entries.values() {
            if entry.initial_status != entry.final_status {
                METRICS.inc_downgraded();
                emit_finding_downgraded(
                    &entry.finding_id,
                    entry.initial_status,
                    entry.final_status,
                    &entry.reasons.join("; "),
                );
            }
        }
        let (ignored, findings): (Vec<Finding>, Vec<Finding>) = findings
            .into_iter()
            .partition(|f| f.status == FindingStatus::Ignored);

        // 5: invariants.
        let enforcement = InvariantEnforcer::new(self.mode).enforce(findings);
        for dropped in enforcement.dropped.iter().chain(enforcement.flagged.iter()) {
            emit_finding_dropped(&dropped.finding_id, dropped.check.as_str(), &dropped.reason);
        }
        METRICS.add_dropped(enforcement.dropped.len() as u64);

        // 6: report-time Evidence Law.
        if let Err(e) = assert_evidence_law(&enforcement.kept) {
            contract_violations.push(e.to_string());
        }

        // 7: judgments.
        let mut judgments = Vec::with_capacity(input.observations.len());
        for obs in &input.observations {
            match map_observation(obs) {
                Ok(judgment) => judgments.push(judgment),
                Err(e) => contract_violations.push(format!("{}: {e}", obs.promise_id)),
            }
        }

        // 8: coverage.
        let coverage = match compute_coverage(&input.execution_records, &self.coverage) {
            Ok(c) => c,
            Err(e) => {
                contract_violations.push(e.to_string());
                CoverageTruth {
                    total: input.execution_records.len(),
                    ..Default::default()
                }
            }
        };
        let coverage_gate = evaluate_coverage_gate(&coverage, &self.coverage);
        emit_coverage_computed(&run_id, &coverage, coverage_gate.passed);

        // 9: consistency.
        let consistency = check_consistency(&input.execution_records, &judgments);
        emit_consistency_checked(&run_id, consistency.violations.len());

        // 10: outcome and gates.
        let outcome = determine_outcome(&OutcomeInputs {
            contract_violations: &contract_violations,
            consistency: &consistency,
            coverage_gate: &coverage_gate,
            judgments: &judgments,
        });
        let gate = evaluate_gate(&self.gates, &outcome, &enforcement.kept);
        let outcome = apply_gate(outcome, &gate);
        emit_run_outcome(&run_id, outcome.exit_code, outcome.status.as_str());
        METRICS.flush();

        RunArtifacts {
            contract_version: CONTRACT_VERSION,
            run_id,
            generated_at: Utc::now(),
            enforcement_mode: self.mode,
            findings: enforcement.kept,
            ignored,
            dropped: enforcement.dropped,
            flagged: enforcement.flagged,
            reconciliation,
            coverage,
            coverage_gate,
            consistency,
            judgments,
            outcome,
            gate,
        }
    }

    /// Build evidence for one candidate, score it and apply Evidence Law
    /// admission. Guardrails and invariants are not applied.
    pub fn assess_candidate(&self, candidate: &FindingCandidate, input: &RunInput) -> Finding {
        let promise_id = candidate.promise_id.as_deref();
        let promise = promise_id.and_then(|id| input.promises.iter().find(|p| p.id == id));
        let trace = promise_id.and_then(|id| input.traces.iter().find(|t| t.promise_id == id));
        let record = promise_id.and_then(|id| {
            input
                .execution_records
                .iter()
                .find(|r| r.promise_id == id)
        });

        let pkg = build_evidence_package(promise, trace, &candidate.evidence);
        let comparisons = Comparisons::from_snapshots(&pkg.before, &pkg.after);
        let proof = promise.map(|p| p.proof).unwrap_or_default();
        let confidence = score(&ConfidenceInput {
            finding_type: candidate.finding_type,
            proof,
            sensors: &pkg.signals,
            evidence: &pkg,
            comparisons,
        });
        METRICS.inc_scored();
        emit_finding_scored(&candidate.id, &confidence);

        let mut finding = Finding::new(
            candidate.id.clone(),
            candidate.finding_type,
            candidate.requested_status,
        );
        finding.expectation = promise_id.map(|id| ExpectationRef {
            promise_id: id.to_string(),
            proof,
            observed: record.is_some_and(|r| r.observed),
        });
        finding.signals = candidate.signals.clone();
        finding.enrichment.ambiguity_reasons = candidate.ambiguity_reasons.clone();
        finding.enrichment.evidence_categories = evidence_categories(&pkg);
        finding.confidence = Some(confidence);
        finding.evidence_package = Some(pkg);

        let before = finding.status;
        if let Some(refusal) = admit_finding(&mut finding) {
            debug!(
                finding_id = %finding.id,
                missing = ?refusal.missing_fields,
                "evidence law refusal"
            );
            finding.confidence = finding
                .confidence
                .as_ref()
                .map(|c| c.capped(SUSPECTED_CAP, ReasonCode::GuardCapSuspected));
            METRICS.inc_downgraded();
            let reason = finding
                .enrichment
                .downgrade_reasons
                .last()
                .cloned()
                .unwrap_or_default();
            emit_finding_downgraded(&finding.id, before, finding.status, &reason);
        }
        finding
    }
}
