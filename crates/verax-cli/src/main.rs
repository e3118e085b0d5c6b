//! Verax - evidence-based promise oracle CLI
//!
//! The `verax` command turns one run's execution records, traces and
//! detector candidates into a verdict and a CI exit code.
//!
//! ## Commands
//!
//! - `verdict`: run the full truth pipeline and exit with its code
//! - `score`: score finding candidates without reconciling them
//! - `verify`: check the digest of a stored verdict
//! - `exit-codes`: print the exit-code contract

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use verax_ci::{
    read_run_artifacts, render_summary_md, write_run_artifacts, ExitCode, RunArtifacts, RunInput,
    RunOutcome, TruthPipeline,
};
use verax_core::{
    ConfidenceResult, EnforcementMode, Finding, FindingStatus, VeraxConfig, VeraxError,
    CONTRACT_VERSION,
};

#[derive(Parser)]
#[command(name = "verax")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evidence-based promise oracle for web applications", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to verax.toml (default: ./verax.toml when present)
    #[arg(long, global = true, env = "VERAX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the truth pipeline over a run input file
    Verdict {
        /// Run input (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Write `<out>/<run_id>/verdict.json` and its digest
        #[arg(long)]
        out: Option<PathBuf>,

        /// Enforcement mode override (production or development)
        #[arg(long)]
        mode: Option<EnforcementMode>,

        /// Apply configured gates to the exit code
        #[arg(long)]
        enforce_gates: bool,

        /// Print the JSON outcome instead of the markdown summary
        #[arg(long)]
        print_json: bool,
    },

    /// Score finding candidates and print their confidence
    Score {
        /// Run input (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Verify a stored verdict against its digest
    Verify {
        /// Run ID to verify
        #[arg(long)]
        run_id: String,

        /// Root directory containing run artifacts
        #[arg(long, default_value = ".verax/runs")]
        dir: PathBuf,
    },

    /// Print the exit-code contract
    ExitCodes,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::UsageError.code()
            } else {
                ExitCode::Success.code()
            };
            std::process::exit(code);
        }
    };

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    verax_core::init_tracing(cli.json, level);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

/// Errors map onto the contract: broken contracts are 50, everything else
/// (unreadable input, bad config) is a usage error.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<VeraxError>() {
        Some(e) if e.is_contract_violation() => ExitCode::InvariantViolation.code(),
        Some(VeraxError::DigestMismatch { .. }) => ExitCode::InvariantViolation.code(),
        _ => ExitCode::UsageError.code(),
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Verdict {
            input,
            out,
            mode,
            enforce_gates,
            print_json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(mode) = mode {
                config.enforcement_mode = mode;
            }
            if enforce_gates {
                config.gates.enabled = true;
            }
            cmd_verdict(&config, &input, out.as_deref(), print_json)
        }
        Commands::Score { input } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_score(&config, &input)
        }
        Commands::Verify { run_id, dir } => cmd_verify(&run_id, &dir),
        Commands::ExitCodes => cmd_exit_codes(),
    }
}

fn load_config(path: Option<&Path>) -> Result<VeraxConfig> {
    let config = match path {
        Some(p) => {
            VeraxConfig::load(p).with_context(|| format!("Failed to load config {:?}", p))?
        }
        None => {
            let default = Path::new("verax.toml");
            if default.exists() {
                VeraxConfig::load(default).context("Failed to load ./verax.toml")?
            } else {
                VeraxConfig::default()
            }
        }
    };
    Ok(config.apply_env()?)
}

fn read_input(path: &Path) -> Result<RunInput> {
    let raw =
        std::fs::read(path).with_context(|| format!("Failed to read run input {:?}", path))?;
    let input: RunInput = serde_json::from_slice(&raw)
        .with_context(|| format!("Run input is not valid JSON: {:?}", path))?;
    input.validate()?;
    Ok(input)
}

fn cmd_verdict(
    config: &VeraxConfig,
    input: &Path,
    out: Option<&Path>,
    print_json: bool,
) -> Result<i32> {
    let run_input = read_input(input)?;
    let pipeline = TruthPipeline::new(config)?;
    let artifacts = pipeline.run(&run_input);

    if let Some(dir) = out {
        let path = write_run_artifacts(&artifacts, dir)
            .with_context(|| format!("Failed to write artifacts under {:?}", dir))?;
        info!(run_id = %artifacts.run_id, path = ?path, "verdict written");
    }

    if print_json {
        println!("{}", serde_json::to_string_pretty(&OutcomeJson::new(&artifacts))?);
    } else {
        print!("{}", render_summary_md(&artifacts));
    }
    Ok(artifacts.exit_code())
}

/// `verdict --print-json` output: the run outcome stamped with its contract.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeJson<'a> {
    contract_version: u32,
    run_id: &'a str,
    #[serde(flatten)]
    outcome: &'a RunOutcome,
}

impl<'a> OutcomeJson<'a> {
    fn new(artifacts: &'a RunArtifacts) -> Self {
        Self {
            contract_version: CONTRACT_VERSION,
            run_id: &artifacts.run_id,
            outcome: &artifacts.outcome,
        }
    }
}

/// One `score` output line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreLine<'a> {
    contract_version: u32,
    id: &'a str,
    status: FindingStatus,
    confidence: Option<&'a ConfidenceResult>,
    missing_evidence: &'a [String],
}

impl<'a> ScoreLine<'a> {
    fn new(finding: &'a Finding) -> Self {
        let missing_evidence = finding
            .evidence_package
            .as_ref()
            .map(|p| p.missing_evidence.as_slice())
            .unwrap_or_default();
        Self {
            contract_version: CONTRACT_VERSION,
            id: &finding.id,
            status: finding.status,
            confidence: finding.confidence.as_ref(),
            missing_evidence,
        }
    }
}

fn cmd_score(config: &VeraxConfig, input: &Path) -> Result<i32> {
    let run_input = read_input(input)?;
    let pipeline = TruthPipeline::new(config)?;
    for candidate in &run_input.candidates {
        let finding = pipeline.assess_candidate(candidate, &run_input);
        println!("{}", serde_json::to_string(&ScoreLine::new(&finding))?);
    }
    Ok(ExitCode::Success.code())
}

fn cmd_verify(run_id: &str, artifacts_dir: &Path) -> Result<i32> {
    let artifacts = read_run_artifacts(run_id, artifacts_dir)
        .with_context(|| format!("Failed to verify run {}", run_id))?;
    print!("{}", render_summary_md(&artifacts));
    println!("\nDigest verified for run {}", run_id);
    Ok(ExitCode::Success.code())
}

fn cmd_exit_codes() -> Result<i32> {
    for code in ExitCode::ALL {
        println!(
            "{:>3}  {:<20} {}",
            code.code(),
            code.as_str(),
            code.description()
        );
    }
    Ok(ExitCode::Success.code())
}
