//! Interaction traces and sensor snapshots.
//!
//! A trace is produced once per attempted interaction by the observation
//! layer and consumed read-only here.

use serde::{Deserialize, Serialize};

use crate::domain::evidence::{CaptureFailure, PageSnapshot};

/// One network request seen inside the interaction's network window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub failed: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

impl NetworkRequest {
    pub fn is_failure(&self) -> bool {
        self.failed || self.status.is_some_and(|s| s >= 400)
    }

    pub fn is_success(&self) -> bool {
        !self.is_failure() && self.status.is_some_and(|s| (200..400).contains(&s))
    }
}

/// Network sensor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSignals {
    #[serde(default)]
    pub requests: Vec<NetworkRequest>,
}

impl NetworkSignals {
    pub fn total_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn failed_requests(&self) -> usize {
        self.requests.iter().filter(|r| r.is_failure()).count()
    }

    pub fn successful_requests(&self) -> usize {
        self.requests.iter().filter(|r| r.is_success()).count()
    }

    pub fn has_activity(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Console sensor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSignals {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ConsoleSignals {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// UI-signal sensor output: visible feedback and DOM mutation after the action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UiSignals {
    /// Any visible change in the interacted region.
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub loading_indicator: bool,
    #[serde(default)]
    pub error_feedback: bool,
    #[serde(default)]
    pub success_feedback: bool,
    #[serde(default)]
    pub live_region_update: bool,
}

impl UiSignals {
    /// Number of explicit feedback channels observed. Loading spinners do not
    /// count; they are not an outcome.
    pub fn feedback_strength(&self) -> usize {
        [
            self.error_feedback,
            self.success_feedback,
            self.live_region_update,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback_strength() > 0
    }

    pub fn is_observable(&self) -> bool {
        self.changed || self.loading_indicator || self.has_feedback()
    }
}

/// Navigation sensor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSignals {
    #[serde(default)]
    pub url_changed: bool,
    #[serde(default)]
    pub history_changed: bool,
}

/// Sensor categories, in the fixed order the confidence engine walks them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorCategory {
    Network,
    Console,
    UiSignals,
    Navigation,
}

/// Sensor snapshot with one optional slot per category.
///
/// `None` means the sensor did not report; a present-but-empty value means
/// the sensor ran and saw nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    #[serde(default)]
    pub network: Option<NetworkSignals>,
    #[serde(default)]
    pub console: Option<ConsoleSignals>,
    #[serde(default)]
    pub ui_signals: Option<UiSignals>,
    #[serde(default)]
    pub navigation: Option<NavigationSignals>,
}

impl SensorSnapshot {
    pub fn has(&self, category: SensorCategory) -> bool {
        match category {
            SensorCategory::Network => self.network.is_some(),
            SensorCategory::Console => self.console.is_some(),
            SensorCategory::UiSignals => self.ui_signals.is_some(),
            SensorCategory::Navigation => self.navigation.is_some(),
        }
    }

    pub fn present_categories(&self) -> Vec<SensorCategory> {
        [
            SensorCategory::Network,
            SensorCategory::Console,
            SensorCategory::UiSignals,
            SensorCategory::Navigation,
        ]
        .into_iter()
        .filter(|c| self.has(*c))
        .collect()
    }

    /// Network, console and UI signals all reported.
    pub fn is_complete(&self) -> bool {
        self.network.is_some() && self.console.is_some() && self.ui_signals.is_some()
    }

    /// At least one sensor observed something a user or server would notice.
    pub fn has_observable_signal(&self) -> bool {
        self.network.as_ref().is_some_and(|n| n.has_activity())
            || self.console.as_ref().is_some_and(|c| c.has_errors())
            || self.ui_signals.as_ref().is_some_and(|u| u.is_observable())
            || self
                .navigation
                .as_ref()
                .is_some_and(|n| n.url_changed || n.history_changed)
    }
}

/// The interaction that was performed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// `click`, `submit`, `input`, ...
    pub kind: String,
    pub selector: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub started_at_ms: u64,
    pub duration_ms: u64,
}

/// One attempted interaction for one promise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTrace {
    pub promise_id: String,
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub before: PageSnapshot,
    #[serde(default)]
    pub after: PageSnapshot,
    #[serde(default)]
    pub sensors: SensorSnapshot,
    #[serde(default)]
    pub timing: Option<Timing>,
    #[serde(default)]
    pub capture_failures: Vec<CaptureFailure>,
}

/// Before/after comparisons derived from a trace.
///
/// `None` means the comparison could not be made because one side is missing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comparisons {
    pub url_changed: Option<bool>,
    pub dom_changed: Option<bool>,
}

impl Comparisons {
    pub fn from_snapshots(before: &PageSnapshot, after: &PageSnapshot) -> Self {
        let url_changed = match (before.url.as_deref(), after.url.as_deref()) {
            (Some(b), Some(a)) => Some(b != a),
            _ => None,
        };
        let dom_changed = match (before.dom_digest.as_deref(), after.dom_digest.as_deref()) {
            (Some(b), Some(a)) => Some(b != a),
            _ => None,
        };
        Self {
            url_changed,
            dom_changed,
        }
    }

    pub fn url_unchanged(&self) -> bool {
        self.url_changed == Some(false)
    }

    pub fn dom_unchanged(&self) -> bool {
        self.dom_changed == Some(false)
    }
}

impl InteractionTrace {
    pub fn comparisons(&self) -> Comparisons {
        Comparisons::from_snapshots(&self.before, &self.after)
    }
}
