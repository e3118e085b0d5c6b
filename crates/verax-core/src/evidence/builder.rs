//! Deterministic evidence package assembly.

use serde::{Deserialize, Serialize};

use crate::domain::evidence::{ActionEvidence, EvidencePackage, PageSnapshot, Trigger};
use crate::domain::finding::EvidenceCategory;
use crate::domain::promise::Promise;
use crate::domain::trace::{InteractionTrace, SensorSnapshot};

/// Fields that must be populated for a package to count as complete.
pub const REQUIRED_EVIDENCE_FIELDS: [&str; 8] = [
    "trigger.source",
    "before.screenshot",
    "after.screenshot",
    "before.url",
    "after.url",
    "action.interaction",
    "signals.network",
    "signals.uiSignals",
];

/// Sections supplied by a detector. Each populated field wins over the
/// trace-derived default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceOverrides {
    #[serde(default)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub before: Option<PageSnapshot>,
    #[serde(default)]
    pub after: Option<PageSnapshot>,
    #[serde(default)]
    pub signals: Option<SensorSnapshot>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn merge_snapshot(
    provided: Option<&PageSnapshot>,
    from_trace: Option<&PageSnapshot>,
) -> PageSnapshot {
    let pick = |f: fn(&PageSnapshot) -> Option<&String>| {
        non_blank(provided.and_then(f)).or_else(|| non_blank(from_trace.and_then(f)))
    };
    PageSnapshot {
        url: pick(|s| s.url.as_ref()),
        screenshot: pick(|s| s.screenshot.as_ref()),
        dom_digest: pick(|s| s.dom_digest.as_ref()),
    }
}

fn merge_signals(
    provided: Option<&SensorSnapshot>,
    from_trace: Option<&SensorSnapshot>,
) -> SensorSnapshot {
    SensorSnapshot {
        network: provided
            .and_then(|s| s.network.clone())
            .or_else(|| from_trace.and_then(|s| s.network.clone())),
        console: provided
            .and_then(|s| s.console.clone())
            .or_else(|| from_trace.and_then(|s| s.console.clone())),
        ui_signals: provided
            .and_then(|s| s.ui_signals.clone())
            .or_else(|| from_trace.and_then(|s| s.ui_signals.clone())),
        navigation: provided
            .and_then(|s| s.navigation.clone())
            .or_else(|| from_trace.and_then(|s| s.navigation.clone())),
    }
}

fn merge_trigger(provided: Option<&Trigger>, promise: Option<&Promise>) -> Trigger {
    Trigger {
        source: provided
            .and_then(|t| t.source.clone())
            .or_else(|| promise.and_then(|p| p.source_ref.clone())),
        promise_kind: provided
            .and_then(|t| t.promise_kind)
            .or_else(|| promise.map(|p| p.kind)),
        target: non_blank(provided.and_then(|t| t.target.as_ref()))
            .or_else(|| promise.map(|p| p.target.clone())),
    }
}

/// Required fields that are not populated, in [`REQUIRED_EVIDENCE_FIELDS`] order.
pub fn missing_required_fields(pkg: &EvidencePackage) -> Vec<String> {
    REQUIRED_EVIDENCE_FIELDS
        .iter()
        .filter(|field| !is_populated(pkg, field))
        .map(|field| field.to_string())
        .collect()
}

fn is_populated(pkg: &EvidencePackage, field: &str) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    match field {
        "trigger.source" => pkg.trigger.source.is_some(),
        "before.screenshot" => present(&pkg.before.screenshot),
        "after.screenshot" => present(&pkg.after.screenshot),
        "before.url" => present(&pkg.before.url),
        "after.url" => present(&pkg.after.url),
        "action.interaction" => pkg.action.interaction.is_some(),
        "signals.network" => pkg.signals.network.is_some(),
        "signals.uiSignals" => pkg.signals.ui_signals.is_some(),
        _ => false,
    }
}

fn justification(pkg: &EvidencePackage, promise: Option<&Promise>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(p) = promise {
        lines.push(format!(
            "promise {} ({:?}) targets '{}' with proof {:?}",
            p.id, p.kind, p.target, p.proof
        ));
    }
    match (pkg.before.url.as_deref(), pkg.after.url.as_deref()) {
        (Some(b), Some(a)) if b == a => lines.push(format!("url unchanged at '{}'", a)),
        (Some(b), Some(a)) => lines.push(format!("url changed '{}' -> '{}'", b, a)),
        _ => {}
    }
    match (pkg.before.dom_digest.as_deref(), pkg.after.dom_digest.as_deref()) {
        (Some(b), Some(a)) if b == a => lines.push("dom digest unchanged".to_string()),
        (Some(_), Some(_)) => lines.push("dom digest changed".to_string()),
        _ => {}
    }
    if let Some(net) = &pkg.signals.network {
        lines.push(format!(
            "network: {} request(s), {} failed",
            net.total_requests(),
            net.failed_requests()
        ));
    }
    for failure in &pkg.capture_failures {
        lines.push(format!(
            "capture failed at {:?}: {} after {} attempt(s)",
            failure.stage,
            failure.reason_code.as_str(),
            failure.attempt_count
        ));
    }
    lines
}

/// Assemble a package from a promise, its trace and detector overrides.
///
/// Pure and deterministic: the same inputs always yield the same package,
/// including `missing_evidence` and `is_complete`.
pub fn build_evidence_package(
    promise: Option<&Promise>,
    trace: Option<&InteractionTrace>,
    overrides: &EvidenceOverrides,
) -> EvidencePackage {
    let mut pkg = EvidencePackage {
        trigger: merge_trigger(overrides.trigger.as_ref(), promise),
        before: merge_snapshot(overrides.before.as_ref(), trace.map(|t| &t.before)),
        after: merge_snapshot(overrides.after.as_ref(), trace.map(|t| &t.after)),
        action: ActionEvidence {
            interaction: trace.and_then(|t| t.interaction.clone()),
            timing: trace.and_then(|t| t.timing),
        },
        signals: merge_signals(overrides.signals.as_ref(), trace.map(|t| &t.sensors)),
        justification: Vec::new(),
        capture_failures: trace.map(|t| t.capture_failures.clone()).unwrap_or_default(),
        missing_evidence: Vec::new(),
        is_complete: false,
    };
    pkg.justification = justification(&pkg, promise);
    pkg.missing_evidence = missing_required_fields(&pkg);
    pkg.is_complete = pkg.missing_evidence.is_empty();
    pkg
}

/// Evidence categories actually present in a package, in a fixed order.
pub fn evidence_categories(pkg: &EvidencePackage) -> Vec<EvidenceCategory> {
    let mut cats = Vec::new();
    if pkg.before.screenshot.is_some() || pkg.after.screenshot.is_some() {
        cats.push(EvidenceCategory::Screenshot);
    }
    if pkg.before.url.is_some() && pkg.after.url.is_some() {
        cats.push(EvidenceCategory::Url);
    }
    if pkg.before.dom_digest.is_some() && pkg.after.dom_digest.is_some() {
        cats.push(EvidenceCategory::Dom);
    }
    if pkg.signals.network.as_ref().is_some_and(|n| n.has_activity()) {
        cats.push(EvidenceCategory::Network);
    }
    if pkg.signals.console.as_ref().is_some_and(|c| c.has_errors()) {
        cats.push(EvidenceCategory::Console);
    }
    if pkg.signals.ui_signals.as_ref().is_some_and(|u| u.is_observable()) {
        cats.push(EvidenceCategory::UiSignals);
    }
    if pkg
        .signals
        .navigation
        .as_ref()
        .is_some_and(|n| n.url_changed || n.history_changed)
    {
        cats.push(EvidenceCategory::Navigation);
    }
    cats
}
