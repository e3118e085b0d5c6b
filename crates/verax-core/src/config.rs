//! Run configuration.
//!
//! Loaded from a `verax.toml` file where every key is optional, then
//! overridden from the environment:
//!
//! | variable                   | field                |
//! |----------------------------|----------------------|
//! | `VERAX_ENFORCEMENT_MODE`   | `enforcement_mode`   |
//! | `VERAX_COVERAGE_THRESHOLD` | `coverage.threshold` |
//! | `VERAX_ENFORCE_GATES`      | `gates.enabled`      |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coverage::{CoveragePolicy, DEFAULT_COVERAGE_THRESHOLD};
use crate::domain::error::{Result, VeraxError};
use crate::domain::execution::SkipReason;
use crate::guardrails::{Guardrails, DEFAULT_ANALYTICS_PATTERNS};
use crate::invariants::EnforcementMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    pub threshold: f64,
    pub legal_skip_reasons: Vec<SkipReason>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            legal_skip_reasons: SkipReason::default_legal(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GuardrailConfig {
    /// Regexes matched against request URLs to recognise analytics beacons.
    pub analytics_patterns: Vec<String>,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            analytics_patterns: DEFAULT_ANALYTICS_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Which run outcomes trip an enforced gate. `Incomplete` is report-only:
/// the trip is recorded but an INCOMPLETE run keeps its own exit code.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GateFailOn {
    #[default]
    Findings,
    Incomplete,
    Any,
}

/// Lowest finding status that counts toward a `findings` gate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GateScope {
    #[default]
    Confirmed,
    Suspected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub enabled: bool,
    pub fail_on: GateFailOn,
    pub scope: GateScope,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VeraxConfig {
    pub enforcement_mode: EnforcementMode,
    pub coverage: CoverageConfig,
    pub guardrails: GuardrailConfig,
    pub gates: GateConfig,
}

impl VeraxConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply `VERAX_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("VERAX_ENFORCEMENT_MODE") {
            self.enforcement_mode = mode.parse().map_err(VeraxError::InvalidConfig)?;
        }
        if let Some(threshold) = lookup("VERAX_COVERAGE_THRESHOLD") {
            self.coverage.threshold = threshold.trim().parse().map_err(|_| {
                VeraxError::InvalidConfig(format!(
                    "VERAX_COVERAGE_THRESHOLD is not a number: {threshold:?}"
                ))
            })?;
        }
        if let Some(gates) = lookup("VERAX_ENFORCE_GATES") {
            self.gates.enabled = matches!(
                gates.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.coverage.threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(VeraxError::InvalidConfig(format!(
                "coverage.threshold must be within [0, 1], got {t}"
            )));
        }
        Ok(())
    }

    pub fn coverage_policy(&self) -> CoveragePolicy {
        CoveragePolicy {
            threshold: self.coverage.threshold,
            legal_skip_reasons: self.coverage.legal_skip_reasons.clone(),
        }
    }

    /// Compile the configured guardrails.
    pub fn guardrails(&self) -> Result<Guardrails> {
        Guardrails::standard().with_analytics_patterns(&self.guardrails.analytics_patterns)
    }
}
