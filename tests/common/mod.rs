//! In-memory stand-in for the NetworkManager service.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use wifimanager_compat::network::{
    ActivationGate, Connector, NotificationSink, RemoteEndpoint, RemoteNotification,
};
use wifimanager_compat::{AdapterSettings, LinkFault, WifiManagerAdapter};

#[derive(Debug, Clone)]
struct Stored {
    ssid: String,
    passphrase: String,
    security_mode: i64,
}

#[derive(Default)]
pub struct MockNetworkManager {
    pub reachable: AtomicBool,
    pub connect_attempts: AtomicUsize,
    /// Every method invoked, in order
    pub calls: Mutex<Vec<(String, Value)>>,
    pub subscriptions: Mutex<Vec<String>>,
    pub unsubscriptions: Mutex<Vec<String>>,
    /// Canned replies that override the built-in behavior
    pub replies: Mutex<BTreeMap<String, Result<Value, LinkFault>>>,
    stored: Mutex<Option<Stored>>,
    sink: Mutex<Option<NotificationSink>>,
}

impl MockNetworkManager {
    pub fn online() -> Arc<Self> {
        let mock = Arc::new(Self::default());
        mock.reachable.store(true, Ordering::SeqCst);
        mock
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, Value)> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn reply_with(&self, method: &str, reply: Result<Value, LinkFault>) {
        self.replies.lock().unwrap().insert(method.to_string(), reply);
    }

    /// Publish a notification as the backing service would
    pub fn emit(&self, event: &str, payload: Value) {
        let sink = self.sink.lock().unwrap();
        let sink = sink.as_ref().expect("link not established");
        sink.send(RemoteNotification {
            event: event.to_string(),
            payload,
        })
        .unwrap();
    }

    fn handle(&self, method: &str, params: &Value) -> Value {
        match method {
            "GetWifiState" => json!({ "state": 5 }),
            "GetConnectedSSID" => json!({
                "ssid": "Home",
                "bssid": "aa:bb:cc:dd:ee:ff",
                "securityMode": 6,
                "strength": "-48",
                "frequency": "5.180",
                "rate": "866",
                "noise": "-92"
            }),
            "AddToKnownSSIDs" => {
                *self.stored.lock().unwrap() = Some(Stored {
                    ssid: params["ssid"].as_str().unwrap_or_default().to_string(),
                    passphrase: params["passphrase"].as_str().unwrap_or_default().to_string(),
                    security_mode: params["securityMode"].as_i64().unwrap_or_default(),
                });
                json!({ "success": true })
            }
            "RemoveKnownSSID" => {
                *self.stored.lock().unwrap() = None;
                json!({ "success": true })
            }
            "GetKnownSSIDs" => {
                let ssids: Vec<String> =
                    self.stored.lock().unwrap().iter().map(|s| s.ssid.clone()).collect();
                json!({ "ssids": ssids })
            }
            "GetWiFiCredentials" => match &*self.stored.lock().unwrap() {
                Some(s) => json!({
                    "ssid": s.ssid,
                    "passphrase": s.passphrase,
                    "securityMode": s.security_mode,
                    "success": true
                }),
                // SSID_NOT_FOUND
                None => json!({ "success": false, "errorCode": 6 }),
            },
            "GetSupportedSecurityModes" => json!({
                "security": { "NET_WIFI_SECURITY_NONE": 0, "NET_WIFI_SECURITY_WPA2_PSK_AES": 6 }
            }),
            "StartWPS" => match params["method"].as_i64() {
                Some(1) => json!({ "pin": "12345670" }),
                _ => json!({}),
            },
            _ => json!({ "success": true }),
        }
    }
}

struct Endpoint(Arc<MockNetworkManager>);

#[async_trait]
impl RemoteEndpoint for Endpoint {
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, LinkFault> {
        self.0
            .calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        if let Some(reply) = self.0.replies.lock().unwrap().get(method) {
            return reply.clone();
        }
        Ok(self.0.handle(method, &params))
    }

    async fn subscribe(&self, event: &str) -> Result<(), LinkFault> {
        self.0.subscriptions.lock().unwrap().push(event.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, event: &str) -> Result<(), LinkFault> {
        self.0.unsubscriptions.lock().unwrap().push(event.to_string());
        Ok(())
    }
}

pub struct MockConnector(pub Arc<MockNetworkManager>);

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, sink: NotificationSink) -> Result<Arc<dyn RemoteEndpoint>, LinkFault> {
        self.0.connect_attempts.fetch_add(1, Ordering::SeqCst);
        if !self.0.reachable.load(Ordering::SeqCst) {
            return Err(LinkFault::Unreachable("org.rdk.NetworkManager".into()));
        }
        *self.0.sink.lock().unwrap() = Some(sink);
        Ok(Arc::new(Endpoint(self.0.clone())))
    }
}

pub fn adapter(mock: &Arc<MockNetworkManager>) -> WifiManagerAdapter {
    let settings = AdapterSettings {
        gate: ActivationGate::new(Duration::from_millis(5), Duration::from_millis(20)),
        queue_depth: 16,
        wifi_interface: "wlan0".into(),
    };
    WifiManagerAdapter::new(Arc::new(MockConnector(mock.clone())), settings)
}
