//! Closed enumeration of confidence reason codes.
//!
//! Codes are stable wire identifiers. Never emit free text in their place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // Penalties (always listed first).
    GuardNetworkSuccessNoUiChange,
    GuardUiFeedbackContradicts,
    GuardSensorsIncomplete,
    GuardCapSuspected,
    GuardCapInformational,
    GuardIgnored,

    // Promise strength.
    PromiseProven,
    PromiseWeak,
    PromiseUnknown,

    // Sensor presence.
    SensorNetwork,
    SensorConsole,
    SensorUiSignals,
    SensorNavigation,

    // Substantive evidence.
    EvidenceScreenshots,
    ObsUrlChanged,
    ObsUrlUnchanged,
    ObsDomChanged,
    ObsDomUnchanged,

    // Finding-type boosts.
    BoostNavUrlUnchanged,
    BoostNavDomUnchanged,
    BoostNetworkFailedRequest,
    BoostNetworkNoErrorFeedback,
    BoostNoEffect,
    BoostFeedbackAbsent,
    BoostStateUnchanged,
    BoostMisleadingSuccess,
}

impl ReasonCode {
    pub fn is_penalty(self) -> bool {
        matches!(
            self,
            Self::GuardNetworkSuccessNoUiChange
                | Self::GuardUiFeedbackContradicts
                | Self::GuardSensorsIncomplete
                | Self::GuardCapSuspected
                | Self::GuardCapInformational
                | Self::GuardIgnored
        )
    }
}
