use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{CompatError, CompatResult, LinkFault};
use crate::legacy::error_map;
use crate::legacy::forwarder::{EventForwarder, Subscription};
use crate::legacy::types::*;
use crate::network::gate::ActivationGate;
use crate::network::link::{Connector, LinkState, RemoteLink};
use crate::network::types::*;

/// Tunables the adapter needs at construction time
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub gate: ActivationGate,
    /// Per-subscriber notification queue length
    pub queue_depth: usize,
    /// Interface toggled by `setEnabled`
    pub wifi_interface: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            gate: ActivationGate::default(),
            queue_depth: 64,
            wifi_interface: "wlan0".into(),
        }
    }
}

/// Result of a backing call: either the reply, or the legacy error the
/// backing service reported.
enum Reply {
    Done(Value),
    Refused(WifiErrorCode),
}

/// The legacy WiFiManager surface, one handler per legacy operation.
pub struct WifiManagerAdapter {
    link: RemoteLink,
    forwarder: EventForwarder,
    settings: AdapterSettings,
}

impl WifiManagerAdapter {
    /// Must be called from within a tokio runtime
    pub fn new(connector: Arc<dyn Connector>, settings: AdapterSettings) -> Self {
        let (forwarder, sink) = EventForwarder::new(settings.queue_depth);
        let link = RemoteLink::new(connector, sink, settings.gate);
        Self {
            link,
            forwarder,
            settings,
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn forwarder(&self) -> &EventForwarder {
        &self.forwarder
    }

    /// Resolve the backing service now instead of on the first call
    pub async fn activate(&self) -> CompatResult<()> {
        self.link.endpoint().await.map(|_| ())
    }

    /// Drop all subscriptions and the backing link
    pub async fn shutdown(&self) {
        self.forwarder.teardown(&self.link).await;
        self.link.teardown();
        info!("Adapter torn down");
    }

    // ── Events ────────────────────────────────────────────────────────

    pub async fn subscribe(
        &self,
        event: LegacyEvent,
        subscriber: SubscriberId,
    ) -> CompatResult<Subscription> {
        self.forwarder.register(&self.link, event, subscriber).await
    }

    pub async fn unsubscribe(&self, event: LegacyEvent, subscriber: &SubscriberId) {
        self.forwarder.unregister(&self.link, event, subscriber).await
    }

    // ── Backing calls ─────────────────────────────────────────────────

    async fn call(&self, method: &str, params: Value) -> CompatResult<Reply> {
        let reply = self.link.invoke(method, params).await?;
        let outcome = Outcome::of(&reply);
        if outcome.success {
            return Ok(Reply::Done(reply));
        }
        let code = outcome
            .error_code
            .map(error_map::translate)
            .unwrap_or(WifiErrorCode::Unknown);
        debug!("{} refused by backing service: {:?}", method, code);
        Ok(Reply::Refused(code))
    }

    /// Credential persistence call; transport faults are storage failures
    async fn call_storage(&self, method: &str, params: Value) -> CompatResult<Reply> {
        self.call(method, params).await.map_err(|e| match e {
            CompatError::Link(fault) => CompatError::Storage(fault),
            other => other,
        })
    }

    /// Issue a call whose reply carries nothing the legacy side needs
    async fn simple(&self, method: &str, params: Value) -> CompatResult<Value> {
        Ok(match self.call(method, params).await? {
            Reply::Done(_) => success(Map::new()),
            Reply::Refused(code) => failure(code),
        })
    }

    fn parse<T: DeserializeOwned>(method: &str, reply: Value) -> CompatResult<T> {
        serde_json::from_value(reply)
            .map_err(|e| CompatError::Link(LinkFault::Protocol(format!("{method}: {e}"))))
    }

    // ── Legacy operations ─────────────────────────────────────────────

    pub async fn get_current_state(&self, _params: &Value) -> CompatResult<Value> {
        let reply = match self.call(methods::GET_WIFI_STATE, json!({})).await? {
            Reply::Done(reply) => reply,
            Reply::Refused(code) => return Ok(failure(code)),
        };
        let WifiStateReply { state } = Self::parse(methods::GET_WIFI_STATE, reply)?;

        let mut body = Map::new();
        body.insert("state".into(), json!(LegacyState::from_backing(state).code()));
        Ok(success(body))
    }

    /// Results arrive only through `onAvailableSSIDs`
    pub async fn start_scan(&self, params: &Value) -> CompatResult<Value> {
        let ssid = optional_str(params, "ssid")?.unwrap_or_default();
        check_ssid(ssid)?;
        let frequency = optional_str(params, "frequency")?.unwrap_or_default();

        self.simple(
            methods::START_WIFI_SCAN,
            json!({ "ssid": ssid, "frequency": frequency }),
        )
        .await
    }

    /// Stopping an idle scan is not an error
    pub async fn stop_scan(&self, _params: &Value) -> CompatResult<Value> {
        self.simple(methods::STOP_WIFI_SCAN, json!({})).await
    }

    pub async fn get_connected_ssid(&self, _params: &Value) -> CompatResult<Value> {
        let reply = match self.call(methods::GET_CONNECTED_SSID, json!({})).await? {
            Reply::Done(reply) => reply,
            Reply::Refused(code) => return Ok(failure(code)),
        };
        let info: ConnectedSsidReply = Self::parse(methods::GET_CONNECTED_SSID, reply)?;

        let mut body = Map::new();
        body.insert("ssid".into(), json!(info.ssid));
        body.insert("bssid".into(), json!(info.bssid));
        body.insert("rate".into(), json!(info.rate));
        body.insert("noise".into(), json!(info.noise));
        body.insert("security".into(), json!(info.security_mode));
        body.insert("signalStrength".into(), json!(info.strength));
        body.insert("frequency".into(), json!(info.frequency));
        Ok(success(body))
    }

    pub async fn set_enabled(&self, params: &Value) -> CompatResult<Value> {
        let enable = required_bool(params, "enable")?;
        self.simple(
            methods::SET_INTERFACE_STATE,
            json!({ "interface": self.settings.wifi_interface, "enabled": enable }),
        )
        .await
    }

    /// Without an SSID the backing service joins the saved network
    pub async fn connect(&self, params: &Value) -> CompatResult<Value> {
        let ssid = optional_str(params, "ssid")?;
        let passphrase = optional_str(params, "passphrase")?;
        let security_mode = optional_i64(params, "securityMode")?;
        if let Some(ssid) = ssid {
            check_ssid(ssid)?;
        }
        if let Some(passphrase) = passphrase {
            check_passphrase(passphrase)?;
        }

        let mut request = Map::new();
        if let Some(ssid) = ssid {
            request.insert("ssid".into(), json!(ssid));
        }
        if let Some(passphrase) = passphrase {
            request.insert("passphrase".into(), json!(passphrase));
        }
        if let Some(mode) = security_mode {
            request.insert("securityMode".into(), json!(mode));
        }
        self.simple(methods::WIFI_CONNECT, Value::Object(request)).await
    }

    pub async fn disconnect(&self, _params: &Value) -> CompatResult<Value> {
        self.simple(methods::WIFI_DISCONNECT, json!({})).await
    }

    pub async fn initiate_wps_pairing(&self, params: &Value) -> CompatResult<Value> {
        let method = match optional_str(params, "method")? {
            None | Some("PBC") => 0,
            Some("PIN") => 1,
            Some("SERIALIZED_PIN") => 2,
            Some(other) => {
                return Err(CompatError::InvalidParam(format!("unknown WPS method {other}")))
            }
        };
        let pin = optional_str(params, "wps_pin")?;
        if let Some(pin) = pin {
            if pin.len() != 8 || !pin.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CompatError::InvalidParam("wps_pin must be 8 digits".into()));
            }
        }

        let mut request = Map::new();
        request.insert("method".into(), json!(method));
        if let Some(pin) = pin {
            request.insert("wps_pin".into(), json!(pin));
        }

        let reply = match self.call(methods::START_WPS, Value::Object(request)).await? {
            Reply::Done(reply) => reply,
            Reply::Refused(code) => return Ok(failure(code)),
        };
        let WpsReply { pin } = Self::parse(methods::START_WPS, reply)?;

        let mut body = Map::new();
        if let Some(pin) = pin {
            body.insert("pin".into(), json!(pin));
        }
        Ok(success(body))
    }

    /// Cancelling an idle pairing session is not an error
    pub async fn cancel_wps_pairing(&self, _params: &Value) -> CompatResult<Value> {
        self.simple(methods::STOP_WPS, json!({})).await
    }

    pub async fn save_ssid(&self, params: &Value) -> CompatResult<Value> {
        let record = CredentialRecord::from_params(params)?;
        let request = json!({
            "ssid": record.ssid,
            "passphrase": record.passphrase,
            "securityMode": record.security_mode,
        });
        Ok(match self.call_storage(methods::ADD_TO_KNOWN_SSIDS, request).await? {
            Reply::Done(_) => success(Map::new()),
            Reply::Refused(code) => failure(code),
        })
    }

    /// Forget every saved network
    pub async fn clear_ssid(&self, _params: &Value) -> CompatResult<Value> {
        Ok(
            match self
                .call_storage(methods::REMOVE_KNOWN_SSID, json!({ "ssid": "" }))
                .await?
            {
                Reply::Done(_) => success(Map::new()),
                Reply::Refused(code) => failure(code),
            },
        )
    }

    async fn known_ssids(&self) -> CompatResult<Result<Vec<String>, WifiErrorCode>> {
        match self.call_storage(methods::GET_KNOWN_SSIDS, json!({})).await? {
            Reply::Done(reply) => {
                let KnownSsidsReply { ssids } = Self::parse(methods::GET_KNOWN_SSIDS, reply)?;
                Ok(Ok(ssids))
            }
            Reply::Refused(code) => Ok(Err(code)),
        }
    }

    pub async fn get_paired_ssid(&self, _params: &Value) -> CompatResult<Value> {
        let ssids = match self.known_ssids().await? {
            Ok(ssids) => ssids,
            Err(code) => return Ok(failure(code)),
        };
        let mut body = Map::new();
        body.insert(
            "ssid".into(),
            json!(ssids.into_iter().next().unwrap_or_default()),
        );
        Ok(success(body))
    }

    pub async fn is_paired(&self, _params: &Value) -> CompatResult<Value> {
        let ssids = match self.known_ssids().await? {
            Ok(ssids) => ssids,
            Err(code) => return Ok(failure(code)),
        };
        let mut body = Map::new();
        body.insert("result".into(), json!(!ssids.is_empty()));
        Ok(success(body))
    }

    /// Stored credential record. `Err(code)` when the backing service has none;
    /// an empty record or a refusal without a known code reads as `NoSsid`.
    async fn stored_credentials(&self) -> CompatResult<Result<CredentialsReply, WifiErrorCode>> {
        match self
            .call_storage(methods::GET_WIFI_CREDENTIALS, json!({}))
            .await?
        {
            Reply::Done(reply) => {
                let creds: CredentialsReply = Self::parse(methods::GET_WIFI_CREDENTIALS, reply)?;
                if creds.ssid.is_empty() {
                    return Ok(Err(WifiErrorCode::NoSsid));
                }
                Ok(Ok(creds))
            }
            Reply::Refused(WifiErrorCode::Unknown) => Ok(Err(WifiErrorCode::NoSsid)),
            Reply::Refused(code) => Ok(Err(code)),
        }
    }

    /// Like `retrieveSSID` but never exposes the passphrase
    pub async fn get_paired_ssid_info(&self, _params: &Value) -> CompatResult<Value> {
        let creds = match self.stored_credentials().await? {
            Ok(creds) => creds,
            Err(code) => return Ok(failure(code)),
        };
        let mut body = Map::new();
        body.insert("ssid".into(), json!(creds.ssid));
        body.insert("bssid".into(), json!(creds.bssid));
        body.insert("securityMode".into(), json!(creds.security_mode));
        Ok(success(body))
    }

    pub async fn get_supported_security_modes(&self, _params: &Value) -> CompatResult<Value> {
        let reply = match self
            .call(methods::GET_SUPPORTED_SECURITY_MODES, json!({}))
            .await?
        {
            Reply::Done(reply) => reply,
            Reply::Refused(code) => return Ok(failure(code)),
        };
        let SecurityModesReply { security } =
            Self::parse(methods::GET_SUPPORTED_SECURITY_MODES, reply)?;

        let mut body = Map::new();
        body.insert("security_modes".into(), json!(security));
        Ok(success(body))
    }

    /// Stored credential record including the passphrase
    #[cfg(feature = "wifi-credentials")]
    pub async fn retrieve_ssid(&self, _params: &Value) -> CompatResult<Value> {
        let creds = match self.stored_credentials().await? {
            Ok(creds) => creds,
            Err(code) => return Ok(failure(code)),
        };
        let mut body = Map::new();
        body.insert("ssid".into(), json!(creds.ssid));
        body.insert("password".into(), json!(creds.passphrase));
        body.insert("securityMode".into(), json!(creds.security_mode));
        Ok(success(body))
    }

    #[cfg(not(feature = "wifi-credentials"))]
    pub async fn retrieve_ssid(&self, _params: &Value) -> CompatResult<Value> {
        Err(CompatError::NotSupported(
            "retrieveSSID (built without wifi-credentials)".into(),
        ))
    }
}
