use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CompatError, CompatResult};

/// Maximum SSID length in bytes
pub const SSID_SIZE: usize = 32;
/// Maximum passphrase length in bytes
pub const WIFI_MAX_PASSWORD_LEN: usize = 64;

/// Status returned by every legacy call at the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ApiResult {
    Success = 0,
    /// General error. Deprecated in the legacy API; only transport faults use it.
    Failed = 1,
    NullParam = 2,
    InvalidParam = 3,
    NotInitialized = 4,
    OperationNotSupported = 5,
    ReadWriteFailed = 6,
}

impl ApiResult {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ApiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::NullParam => write!(f, "NULL_PARAM"),
            Self::InvalidParam => write!(f, "INVALID_PARAM"),
            Self::NotInitialized => write!(f, "NOT_INITIALIZED"),
            Self::OperationNotSupported => write!(f, "OPERATION_NOT_SUPPORTED"),
            Self::ReadWriteFailed => write!(f, "READ_WRITE_FAILED"),
        }
    }
}

/// Legacy error vocabulary carried in response bodies and state-change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WifiErrorCode {
    SsidChanged = 0,
    ConnectionLost = 1,
    ConnectionFailed = 2,
    ConnectionInterrupted = 3,
    InvalidCredentials = 4,
    NoSsid = 5,
    Unknown = 6,
    AuthFailed = 7,
}

impl WifiErrorCode {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl Serialize for WifiErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

/// WiFi state as legacy clients know it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LegacyState {
    Uninstalled = 0,
    Disabled = 1,
    Disconnected = 2,
    Pairing = 3,
    Connecting = 4,
    Connected = 5,
    Failed = 6,
}

impl LegacyState {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Backing states 0..=5 carry over unchanged; everything else is a failure
    pub fn from_backing(state: u32) -> Self {
        match state {
            0 => Self::Uninstalled,
            1 => Self::Disabled,
            2 => Self::Disconnected,
            3 => Self::Pairing,
            4 => Self::Connecting,
            5 => Self::Connected,
            _ => Self::Failed,
        }
    }
}

/// SSID / passphrase / security-mode triple carried through a single call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub ssid: String,
    pub passphrase: String,
    /// Platform dependent; validity is the backing service's concern
    pub security_mode: i64,
}

impl CredentialRecord {
    /// Build a record from legacy `saveSSID` parameters
    pub fn from_params(params: &Value) -> CompatResult<Self> {
        let ssid = required_str(params, "ssid")?;
        let passphrase = required_str(params, "passphrase")?;
        let security_mode = required_i64(params, "securityMode")?;
        check_ssid(ssid)?;
        check_passphrase(passphrase)?;
        Ok(Self {
            ssid: ssid.to_string(),
            passphrase: passphrase.to_string(),
            security_mode,
        })
    }
}

// ── Parameter helpers ─────────────────────────────────────────────────

pub fn check_ssid(ssid: &str) -> CompatResult<()> {
    if ssid.len() > SSID_SIZE {
        return Err(CompatError::InvalidParam(format!(
            "ssid is {} bytes, limit is {}",
            ssid.len(),
            SSID_SIZE
        )));
    }
    Ok(())
}

pub fn check_passphrase(passphrase: &str) -> CompatResult<()> {
    if passphrase.len() > WIFI_MAX_PASSWORD_LEN {
        return Err(CompatError::InvalidParam(format!(
            "passphrase is {} bytes, limit is {}",
            passphrase.len(),
            WIFI_MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn field<'a>(params: &'a Value, key: &'static str) -> Option<&'a Value> {
    params.get(key).filter(|v| !v.is_null())
}

pub fn optional_str<'a>(params: &'a Value, key: &'static str) -> CompatResult<Option<&'a str>> {
    match field(params, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(CompatError::InvalidParam(format!("{key} must be a string"))),
    }
}

pub fn required_str<'a>(params: &'a Value, key: &'static str) -> CompatResult<&'a str> {
    optional_str(params, key)?.ok_or(CompatError::NullParam(key))
}

pub fn optional_i64(params: &Value, key: &'static str) -> CompatResult<Option<i64>> {
    match field(params, key) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| CompatError::InvalidParam(format!("{key} must be an integer"))),
    }
}

pub fn required_i64(params: &Value, key: &'static str) -> CompatResult<i64> {
    optional_i64(params, key)?.ok_or(CompatError::NullParam(key))
}

pub fn required_bool(params: &Value, key: &'static str) -> CompatResult<bool> {
    match field(params, key) {
        None => Err(CompatError::NullParam(key)),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(CompatError::InvalidParam(format!("{key} must be a boolean"))),
    }
}

/// Successful legacy response body
pub fn success(mut body: Map<String, Value>) -> Value {
    body.insert("success".into(), Value::Bool(true));
    Value::Object(body)
}

/// Application-level failure: the call went through, the result did not
pub fn failure(code: WifiErrorCode) -> Value {
    serde_json::json!({ "success": false, "error": code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ssid_boundaries() {
        assert!(check_ssid("").is_ok());
        assert!(check_ssid(&"a".repeat(SSID_SIZE)).is_ok());
        assert!(matches!(
            check_ssid(&"a".repeat(SSID_SIZE + 1)),
            Err(CompatError::InvalidParam(_))
        ));
    }

    #[test]
    fn ssid_limit_counts_bytes_not_chars() {
        // 11 three-byte chars = 33 bytes
        let ssid = "\u{20ac}".repeat(11);
        assert_eq!(ssid.chars().count(), 11);
        assert!(check_ssid(&ssid).is_err());
    }

    #[test]
    fn passphrase_boundaries() {
        assert!(check_passphrase("").is_ok());
        assert!(check_passphrase(&"p".repeat(WIFI_MAX_PASSWORD_LEN)).is_ok());
        assert!(check_passphrase(&"p".repeat(WIFI_MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn credential_record_requires_every_field() {
        let err = CredentialRecord::from_params(&json!({ "ssid": "Home", "securityMode": 2 }))
            .unwrap_err();
        assert_eq!(err, CompatError::NullParam("passphrase"));

        let err = CredentialRecord::from_params(
            &json!({ "ssid": "Home", "passphrase": "x", "securityMode": "wpa" }),
        )
        .unwrap_err();
        assert!(matches!(err, CompatError::InvalidParam(_)));

        let record = CredentialRecord::from_params(
            &json!({ "ssid": "Home", "passphrase": "secret1", "securityMode": 2 }),
        )
        .unwrap();
        assert_eq!(record.ssid, "Home");
        assert_eq!(record.security_mode, 2);
    }

    #[test]
    fn backing_failure_states_collapse_to_failed() {
        assert_eq!(LegacyState::from_backing(5), LegacyState::Connected);
        for state in 6..=13 {
            assert_eq!(LegacyState::from_backing(state), LegacyState::Failed);
        }
        assert_eq!(LegacyState::from_backing(99), LegacyState::Failed);
    }

    #[test]
    fn failure_body_carries_numeric_code() {
        assert_eq!(
            failure(WifiErrorCode::AuthFailed),
            json!({ "success": false, "error": 7 })
        );
    }
}
