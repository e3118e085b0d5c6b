//! Per-finding-type boosts.
//!
//! One exhaustive match over [`FindingType`]: adding a type without deciding
//! its boosts is a compile error.

use crate::confidence::reasons::ReasonCode;
use crate::domain::finding::FindingType;
use crate::domain::trace::{Comparisons, SensorSnapshot};

pub(crate) fn type_boosts(
    finding_type: FindingType,
    sensors: &SensorSnapshot,
    comparisons: &Comparisons,
) -> Vec<(ReasonCode, f64)> {
    let mut boosts = Vec::new();
    let network = sensors.network.as_ref();
    let ui = sensors.ui_signals.as_ref();

    match finding_type {
        FindingType::NavigationSilentFailure => {
            if comparisons.url_unchanged() {
                boosts.push((ReasonCode::BoostNavUrlUnchanged, 0.15));
            }
            if comparisons.dom_unchanged() {
                boosts.push((ReasonCode::BoostNavDomUnchanged, 0.05));
            }
        }
        FindingType::NetworkSilentFailure => {
            if network.is_some_and(|n| n.failed_requests() > 0) {
                boosts.push((ReasonCode::BoostNetworkFailedRequest, 0.20));
            }
            if ui.is_some_and(|u| !u.error_feedback) {
                boosts.push((ReasonCode::BoostNetworkNoErrorFeedback, 0.05));
            }
        }
        FindingType::NoEffectSilentFailure => {
            if comparisons.url_unchanged() && comparisons.dom_unchanged() {
                boosts.push((ReasonCode::BoostNoEffect, 0.20));
            }
        }
        FindingType::MissingFeedbackFailure => {
            let activity = network.is_some_and(|n| n.has_activity());
            if activity && ui.is_some_and(|u| !u.has_feedback()) {
                boosts.push((ReasonCode::BoostFeedbackAbsent, 0.15));
            }
        }
        FindingType::StateSilentFailure => {
            if comparisons.dom_unchanged() {
                boosts.push((ReasonCode::BoostStateUnchanged, 0.10));
            }
        }
        FindingType::MisleadingSuccess => {
            let failed = network.is_some_and(|n| n.failed_requests() > 0);
            if failed && ui.is_some_and(|u| u.success_feedback) {
                boosts.push((ReasonCode::BoostMisleadingSuccess, 0.25));
            }
        }
    }

    boosts
}
