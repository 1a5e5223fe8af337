//! Reshaping of backing-service notifications into legacy event bodies.
//!
//! A payload either converts completely or not at all; callers drop the
//! event on error.

use serde_json::{json, Value};

use crate::legacy::error_map;
use crate::legacy::types::LegacyState;
use crate::network::types::{
    LegacyEvent, LegacyNetwork, ScanResultPayload, SignalPayload, StateChangePayload,
};

pub fn reshape(event: LegacyEvent, payload: &Value) -> Result<Value, serde_json::Error> {
    match event {
        LegacyEvent::StateChanged => state_changed(payload),
        LegacyEvent::AvailableSsids => available_ssids(payload),
        LegacyEvent::SignalStrengthChanged => signal_strength(payload),
    }
}

fn state_changed(payload: &Value) -> Result<Value, serde_json::Error> {
    let StateChangePayload { state } = serde_json::from_value(payload.clone())?;
    let legacy = LegacyState::from_backing(state);

    let mut body = json!({ "state": legacy.code(), "isLNF": false });
    if legacy == LegacyState::Failed {
        body["error"] = json!(error_map::translate(state));
    }
    Ok(body)
}

fn available_ssids(payload: &Value) -> Result<Value, serde_json::Error> {
    let scan: ScanResultPayload = serde_json::from_value(payload.clone())?;
    let ssids: Vec<LegacyNetwork> = scan.ssids.into_iter().map(LegacyNetwork::from).collect();
    Ok(json!({ "ssids": ssids, "moreData": false }))
}

fn signal_strength(payload: &Value) -> Result<Value, serde_json::Error> {
    let signal: SignalPayload = serde_json::from_value(payload.clone())?;
    Ok(json!({
        "ssid": signal.ssid,
        "signalStrength": signal.strength,
        "strength": signal.quality,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_state_has_no_error() {
        let body = reshape(LegacyEvent::StateChanged, &json!({ "state": 5 })).unwrap();
        assert_eq!(body, json!({ "state": 5, "isLNF": false }));
    }

    #[test]
    fn failure_state_carries_translated_error() {
        let body = reshape(LegacyEvent::StateChanged, &json!({ "state": 11 })).unwrap();
        assert_eq!(body, json!({ "state": 6, "isLNF": false, "error": 4 }));

        // unknown backing state still yields a complete event
        let body = reshape(LegacyEvent::StateChanged, &json!({ "state": 42 })).unwrap();
        assert_eq!(body["error"], 6);
    }

    #[test]
    fn scan_results_use_legacy_field_names() {
        let payload = json!({
            "ssids": [
                { "ssid": "Home", "security": 6, "strength": "-40", "frequency": "5.180" },
                { "ssid": "Cafe", "security": 0, "strength": "-71", "frequency": "2.412" }
            ]
        });
        let body = reshape(LegacyEvent::AvailableSsids, &payload).unwrap();
        assert_eq!(body["moreData"], false);
        assert_eq!(body["ssids"][0]["signalStrength"], "-40");
        assert_eq!(body["ssids"][1]["ssid"], "Cafe");
        assert!(body["ssids"][0].get("strength").is_none());
    }

    #[test]
    fn signal_change_maps_quality() {
        let payload = json!({ "ssid": "Home", "strength": "-27", "quality": "Excellent" });
        let body = reshape(LegacyEvent::SignalStrengthChanged, &payload).unwrap();
        assert_eq!(
            body,
            json!({ "ssid": "Home", "signalStrength": "-27", "strength": "Excellent" })
        );
    }

    #[test]
    fn malformed_payloads_are_rejected_whole() {
        assert!(reshape(LegacyEvent::StateChanged, &json!({ "state": "up" })).is_err());
        assert!(reshape(LegacyEvent::AvailableSsids, &json!({ "ssids": [{ "security": 1 }] })).is_err());
        assert!(reshape(LegacyEvent::SignalStrengthChanged, &json!({ "ssid": "x" })).is_err());
    }
}
