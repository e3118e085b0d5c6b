//! Audit artifacts for a finished run.
//!
//! `<dir>/<run_id>/verdict.json` holds the canonical JSON of
//! [`RunArtifacts`]; `verdict.digest` holds its SHA-256. Reading verifies the
//! digest before deserializing and rejects other contract versions.

use std::path::{Component, Path, PathBuf};

use verax_core::contract::is_supported;
use verax_core::{canonical_json, ContentDigest, FindingStatus, Result, VeraxError};

use crate::pipeline::RunArtifacts;

const VERDICT_FILE: &str = "verdict.json";
const DIGEST_FILE: &str = "verdict.digest";

/// A run id names its artifact directory and must stay inside it: exactly
/// one normal path component, no separators.
pub fn validate_run_id(run_id: &str) -> Result<()> {
    let mut components = Path::new(run_id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || run_id.contains(|c: char| c == '/' || c == '\\') {
        return Err(VeraxError::InvalidConfig(format!(
            "run id {run_id:?} must be a single path component"
        )));
    }
    Ok(())
}

/// Persist `<dir>/<run_id>/verdict.json` and `<dir>/<run_id>/verdict.digest`.
pub fn write_run_artifacts(artifacts: &RunArtifacts, dir: &Path) -> Result<PathBuf> {
    validate_run_id(&artifacts.run_id)?;
    let run_dir = dir.join(&artifacts.run_id);
    std::fs::create_dir_all(&run_dir)?;

    let path = run_dir.join(VERDICT_FILE);
    let json = canonical_json(artifacts)?;
    let digest = ContentDigest::from_bytes(&json);

    std::fs::write(&path, &json)?;
    std::fs::write(run_dir.join(DIGEST_FILE), digest.as_str().as_bytes())?;

    tracing::debug!(
        run_id = %artifacts.run_id,
        digest = %digest.short(),
        path = ?path,
        "wrote run artifacts"
    );
    Ok(path)
}

/// Read and verify `<dir>/<run_id>/verdict.json`.
pub fn read_run_artifacts(run_id: &str, dir: &Path) -> Result<RunArtifacts> {
    validate_run_id(run_id)?;
    let run_dir = dir.join(run_id);
    let json = std::fs::read(run_dir.join(VERDICT_FILE))?;
    let stored = std::fs::read_to_string(run_dir.join(DIGEST_FILE))?;
    let expected = ContentDigest::parse(&stored)?;
    let actual = ContentDigest::from_bytes(&json);
    if expected != actual {
        return Err(VeraxError::DigestMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    let artifacts: RunArtifacts = serde_json::from_slice(&json)?;
    if !is_supported(artifacts.contract_version) {
        return Err(VeraxError::InvalidConfig(format!(
            "unsupported contract version {} in {}",
            artifacts.contract_version,
            run_dir.display()
        )));
    }
    Ok(artifacts)
}

/// Markdown summary for PR comments and CI logs.
pub fn render_summary_md(artifacts: &RunArtifacts) -> String {
    let mut out = String::new();
    out.push_str("# Verax Verdict\n\n");
    out.push_str(&format!(
        "- run: `{}`\n- outcome: **{}** (exit {})\n- mode: {:?}\n\n",
        artifacts.run_id,
        artifacts.outcome.status,
        artifacts.outcome.exit_code,
        artifacts.enforcement_mode
    ));

    if !artifacts.outcome.reasons.is_empty() {
        out.push_str("## Reasons\n");
        for r in &artifacts.outcome.reasons {
            out.push_str(&format!("- {}\n", r));
        }
        out.push('\n');
    }

    let cov = &artifacts.coverage;
    out.push_str("## Coverage\n");
    out.push_str(&format!(
        "- observed: {} of {} eligible ({:.1}%, threshold {:.1}%)\n",
        cov.observed,
        cov.eligible(),
        cov.coverage_ratio * 100.0,
        artifacts.coverage_gate.threshold * 100.0,
    ));
    out.push_str(&format!(
        "- legally skipped: {}\n- illegally skipped: {}\n",
        cov.legally_skipped, cov.illegally_skipped
    ));
    for (reason, count) in &cov.illegal_skip_reasons {
        out.push_str(&format!("  - `{}`: {}\n", reason, count));
    }
    out.push('\n');

    let count = |s: FindingStatus| artifacts.findings.iter().filter(|f| f.status == s).count();
    out.push_str("## Findings\n");
    out.push_str(&format!(
        "- confirmed: {}\n- suspected: {}\n- informational: {}\n- ignored: {}\n- dropped: {}\n",
        count(FindingStatus::Confirmed),
        count(FindingStatus::Suspected),
        count(FindingStatus::Informational),
        artifacts.ignored.len(),
        artifacts.dropped.len()
    ));
    if !artifacts.findings.is_empty() {
        out.push('\n');
        out.push_str("| id | type | status | confidence |\n|---|---|---|---|\n");
        for f in &artifacts.findings {
            let conf = f
                .confidence
                .as_ref()
                .map(|c| format!("{:.2} {:?}", c.score, c.level))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "| `{}` | {:?} | {} | {} |\n",
                f.id, f.finding_type, f.status, conf
            ));
        }
    }

    if !artifacts.consistency.violations.is_empty() {
        out.push_str("\n## Consistency Violations\n");
        for v in &artifacts.consistency.violations {
            out.push_str(&format!("- {}\n", v));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RunInput, TruthPipeline};
    use verax_core::VeraxConfig;

    fn run() -> RunArtifacts {
        let pipeline = TruthPipeline::new(&VeraxConfig::default()).expect("pipeline");
        pipeline.run(&RunInput {
            run_id: Some("run-md".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_summary_mentions_outcome_and_coverage() {
        let md = render_summary_md(&run());
        assert!(md.contains("# Verax Verdict"));
        assert!(md.contains("**INCOMPLETE** (exit 30)"));
        assert!(md.contains("## Coverage"));
        assert!(md.contains("no promises eligible"));
    }

    #[test]
    fn test_write_then_read_verifies_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = run();
        let path = write_run_artifacts(&artifacts, dir.path()).expect("write");
        assert!(path.ends_with("run-md/verdict.json"));
        let back = read_run_artifacts("run-md", dir.path()).expect("read");
        assert_eq!(back.run_id, artifacts.run_id);
        assert_eq!(back.outcome, artifacts.outcome);
        assert_eq!(back.generated_at, artifacts.generated_at);
    }

    #[test]
    fn test_run_id_must_stay_inside_out_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        for bad in ["../escaped", "/tmp/abs", "", ".", "..", "a/b", "a\\b"] {
            let mut artifacts = run();
            artifacts.run_id = bad.to_string();
            let err = write_run_artifacts(&artifacts, &out).expect_err(bad);
            assert!(matches!(err, VeraxError::InvalidConfig(_)), "{bad:?}");
            assert!(read_run_artifacts(bad, &out).is_err());
        }
        assert!(!dir.path().join("escaped").exists());
        assert!(!out.exists());
        assert!(validate_run_id("run-2026-10-18").is_ok());
    }
}
