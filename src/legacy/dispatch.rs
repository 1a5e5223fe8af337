use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{CompatError, CompatResult};
use crate::legacy::adapter::WifiManagerAdapter;

/// Every legacy method name, in the order the legacy API declares them
pub const LEGACY_METHODS: &[&str] = &[
    "getCurrentState",
    "startScan",
    "stopScan",
    "getConnectedSSID",
    "setEnabled",
    "connect",
    "disconnect",
    "initiateWPSPairing",
    "cancelWPSPairing",
    "saveSSID",
    "clearSSID",
    "getPairedSSID",
    "getPairedSSIDInfo",
    "isPaired",
    "getSupportedSecurityModes",
    "retrieveSSID",
];

/// Plugin lifecycle as seen by the hosting runtime
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn initialize(&self) -> CompatResult<()>;
    async fn deinitialize(&self);
    fn describe(&self) -> Value;
}

/// Remote-procedure entry point: legacy method name + JSON params in,
/// legacy response body out.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn invoke(&self, method: &str, params: &Value) -> CompatResult<Value>;

    fn exists(&self, method: &str) -> bool;
}

#[async_trait]
impl Lifecycle for WifiManagerAdapter {
    /// Try to reach the backing service once. Failure is not fatal: the
    /// backing plugin may still be starting, and calls retry on their own.
    async fn initialize(&self) -> CompatResult<()> {
        match self.activate().await {
            Ok(()) => info!("Backing service reachable at startup"),
            Err(e) => warn!("Starting without backing service: {}", e),
        }
        Ok(())
    }

    async fn deinitialize(&self) {
        self.shutdown().await;
    }

    fn describe(&self) -> Value {
        json!({
            "name": "WiFiManager",
            "backing": "org.rdk.NetworkManager",
            "version": env!("CARGO_PKG_VERSION"),
            "credentialRetrieval": cfg!(feature = "wifi-credentials"),
            "link": self.link_state().label(),
        })
    }
}

#[async_trait]
impl Dispatcher for WifiManagerAdapter {
    async fn invoke(&self, method: &str, params: &Value) -> CompatResult<Value> {
        debug!("legacy call {} {}", method, params);
        match method {
            "getCurrentState" => self.get_current_state(params).await,
            "startScan" => self.start_scan(params).await,
            "stopScan" => self.stop_scan(params).await,
            "getConnectedSSID" => self.get_connected_ssid(params).await,
            "setEnabled" => self.set_enabled(params).await,
            "connect" => self.connect(params).await,
            "disconnect" => self.disconnect(params).await,
            "initiateWPSPairing" => self.initiate_wps_pairing(params).await,
            "cancelWPSPairing" => self.cancel_wps_pairing(params).await,
            "saveSSID" => self.save_ssid(params).await,
            "clearSSID" => self.clear_ssid(params).await,
            "getPairedSSID" => self.get_paired_ssid(params).await,
            "getPairedSSIDInfo" => self.get_paired_ssid_info(params).await,
            "isPaired" => self.is_paired(params).await,
            "getSupportedSecurityModes" => self.get_supported_security_modes(params).await,
            "retrieveSSID" => self.retrieve_ssid(params).await,
            other => Err(CompatError::NotSupported(other.to_string())),
        }
    }

    fn exists(&self, method: &str) -> bool {
        if method == "retrieveSSID" {
            return cfg!(feature = "wifi-credentials");
        }
        LEGACY_METHODS.contains(&method)
    }
}
