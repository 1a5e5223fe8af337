use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method names on the backing NetworkManager service
pub mod methods {
    pub const GET_WIFI_STATE: &str = "GetWifiState";
    pub const START_WIFI_SCAN: &str = "StartWiFiScan";
    pub const STOP_WIFI_SCAN: &str = "StopWiFiScan";
    pub const GET_CONNECTED_SSID: &str = "GetConnectedSSID";
    pub const SET_INTERFACE_STATE: &str = "SetInterfaceState";
    pub const WIFI_CONNECT: &str = "WiFiConnect";
    pub const WIFI_DISCONNECT: &str = "WiFiDisconnect";
    pub const START_WPS: &str = "StartWPS";
    pub const STOP_WPS: &str = "StopWPS";
    pub const ADD_TO_KNOWN_SSIDS: &str = "AddToKnownSSIDs";
    pub const REMOVE_KNOWN_SSID: &str = "RemoveKnownSSID";
    pub const GET_KNOWN_SSIDS: &str = "GetKnownSSIDs";
    pub const GET_WIFI_CREDENTIALS: &str = "GetWiFiCredentials";
    pub const GET_SUPPORTED_SECURITY_MODES: &str = "GetSupportedSecurityModes";
}

/// The three notifications re-published under legacy names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LegacyEvent {
    StateChanged,
    AvailableSsids,
    SignalStrengthChanged,
}

impl LegacyEvent {
    pub const ALL: [LegacyEvent; 3] = [
        Self::StateChanged,
        Self::AvailableSsids,
        Self::SignalStrengthChanged,
    ];

    /// Name legacy clients subscribe to
    pub fn legacy_name(self) -> &'static str {
        match self {
            Self::StateChanged => "onWIFIStateChanged",
            Self::AvailableSsids => "onAvailableSSIDs",
            Self::SignalStrengthChanged => "onWiFiSignalStrengthChanged",
        }
    }

    /// Name the backing service publishes under
    pub fn remote_name(self) -> &'static str {
        match self {
            Self::StateChanged => "onWiFiStateChange",
            Self::AvailableSsids => "onAvailableSSIDs",
            Self::SignalStrengthChanged => "onWiFiSignalStrengthChange",
        }
    }

    pub fn from_legacy_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.legacy_name() == name)
    }

    pub fn from_remote_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.remote_name() == name)
    }
}

impl fmt::Display for LegacyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.legacy_name())
    }
}

/// Raw notification as received from the backing service
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteNotification {
    pub event: String,
    pub payload: Value,
}

/// Fully reshaped notification delivered to legacy subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub event: LegacyEvent,
    pub payload: Value,
}

/// Identity of a legacy-side listener (the client id given at registration)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub String);

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Backing-service payloads ──────────────────────────────────────────

/// Fields every backing reply may carry to report a semantic failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    /// `None` when absent or not representable as a backing code
    pub error_code: Option<u32>,
}

impl Outcome {
    /// Replies that are not objects, or carry no boolean `success`, count as success
    pub fn of(reply: &Value) -> Self {
        let success = reply
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let error_code = reply
            .get("errorCode")
            .and_then(Value::as_u64)
            .and_then(|code| u32::try_from(code).ok());
        Self {
            success,
            error_code,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WifiStateReply {
    pub state: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectedSsidReply {
    pub ssid: String,
    pub bssid: String,
    pub security_mode: i64,
    pub strength: String,
    pub frequency: String,
    pub rate: String,
    pub noise: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KnownSsidsReply {
    pub ssids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsReply {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default)]
    pub security_mode: i64,
    #[serde(default)]
    pub bssid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityModesReply {
    pub security: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WpsReply {
    pub pin: Option<String>,
}

// ── Backing-service notification payloads ─────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StateChangePayload {
    pub state: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanResultPayload {
    pub ssids: Vec<ScannedNetwork>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannedNetwork {
    pub ssid: String,
    #[serde(default)]
    pub security: i64,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub frequency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalPayload {
    #[serde(default)]
    pub ssid: String,
    pub strength: String,
    pub quality: String,
}

/// Network descriptor in the legacy `onAvailableSSIDs` shape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyNetwork {
    pub ssid: String,
    pub security: i64,
    pub signal_strength: String,
    pub frequency: String,
}

impl From<ScannedNetwork> for LegacyNetwork {
    fn from(n: ScannedNetwork) -> Self {
        Self {
            ssid: n.ssid,
            security: n.security,
            signal_strength: n.strength,
            frequency: n.frequency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_round_trip() {
        for event in LegacyEvent::ALL {
            assert_eq!(LegacyEvent::from_legacy_name(event.legacy_name()), Some(event));
            assert_eq!(LegacyEvent::from_remote_name(event.remote_name()), Some(event));
        }
        assert_eq!(LegacyEvent::from_legacy_name("onError"), None);
    }

    #[test]
    fn outcome_defaults_to_success() {
        let ok = Outcome::of(&json!({ "state": 5 }));
        assert!(ok.success);
        assert_eq!(ok.error_code, None);

        let failed = Outcome::of(&json!({ "success": false, "errorCode": 11 }));
        assert!(!failed.success);
        assert_eq!(failed.error_code, Some(11));

        assert!(Outcome::of(&Value::Null).success);
    }

    #[test]
    fn odd_error_codes_keep_the_failure() {
        for code in [json!(-1), json!("11"), json!(4_294_967_296u64), json!(1.5)] {
            let outcome = Outcome::of(&json!({ "success": false, "errorCode": code }));
            assert!(!outcome.success, "errorCode {code}");
            assert_eq!(outcome.error_code, None);
        }
    }
}
