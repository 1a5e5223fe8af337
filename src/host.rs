//! Legacy WiFiManager surface on the system bus.
//!
//! Legacy clients call `Invoke(method, params_json)` and get back the legacy
//! status code plus a JSON response body. Events are requested with
//! `Register(event, client)` and arrive as `Event(client, event, payload_json)`
//! signals until `Unregister`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zbus::{interface, SignalContext};

use crate::legacy::dispatch::{Dispatcher, Lifecycle};
use crate::legacy::types::ApiResult;
use crate::legacy::WifiManagerAdapter;
use crate::network::types::{LegacyEvent, SubscriberId};

type Registration = (LegacyEvent, SubscriberId);

pub struct LegacyService {
    adapter: Arc<WifiManagerAdapter>,
    relays: Mutex<HashMap<Registration, JoinHandle<()>>>,
}

impl LegacyService {
    pub fn new(adapter: Arc<WifiManagerAdapter>) -> Self {
        Self {
            adapter,
            relays: Mutex::new(HashMap::new()),
        }
    }

    /// Stop every signal relay; used on shutdown
    pub async fn close(&self) {
        for (_, relay) in self.relays.lock().await.drain() {
            relay.abort();
        }
    }
}

#[interface(name = "org.rdk.WiFiManager1")]
impl LegacyService {
    /// Run a legacy method. Returns the legacy status and the response body.
    async fn invoke(&self, method: String, params: String) -> (u32, String) {
        let params: Value = if params.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(&params) {
                Ok(v) => v,
                Err(e) => {
                    debug!("{}: unparsable params: {}", method, e);
                    return (ApiResult::InvalidParam.code(), "{}".into());
                }
            }
        };

        match self.adapter.invoke(&method, &params).await {
            Ok(body) => (ApiResult::Success.code(), body.to_string()),
            Err(e) => {
                debug!("{} failed: {}", method, e);
                (e.api_result().code(), "{}".into())
            }
        }
    }

    fn exists(&self, method: String) -> bool {
        self.adapter.exists(&method)
    }

    fn describe(&self) -> String {
        Lifecycle::describe(&*self.adapter).to_string()
    }

    async fn register(
        &self,
        event: String,
        client: String,
        #[zbus(signal_context)] ctxt: SignalContext<'_>,
    ) -> u32 {
        let Some(legacy_event) = LegacyEvent::from_legacy_name(&event) else {
            return ApiResult::InvalidParam.code();
        };
        let subscriber = SubscriberId(client.clone());

        let mut rx = match self.adapter.subscribe(legacy_event, subscriber.clone()).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Register {} for {} failed: {}", event, client, e);
                return e.api_result().code();
            }
        };

        let ctxt = ctxt.to_owned();
        let relay = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => {
                        let payload = notification.payload.to_string();
                        if let Err(e) =
                            LegacyService::event(&ctxt, &client, &event, &payload).await
                        {
                            debug!("Event signal to {} failed: {}", client, e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("{} fell behind, {} {} event(s) dropped", client, skipped, event);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self
            .relays
            .lock()
            .await
            .insert((legacy_event, subscriber), relay)
        {
            previous.abort();
        }
        ApiResult::Success.code()
    }

    async fn unregister(&self, event: String, client: String) -> u32 {
        let Some(legacy_event) = LegacyEvent::from_legacy_name(&event) else {
            return ApiResult::InvalidParam.code();
        };
        let subscriber = SubscriberId(client);

        if let Some(relay) = self
            .relays
            .lock()
            .await
            .remove(&(legacy_event, subscriber.clone()))
        {
            relay.abort();
        }
        self.adapter.unsubscribe(legacy_event, &subscriber).await;
        ApiResult::Success.code()
    }

    /// A legacy notification addressed to `client`
    #[zbus(signal)]
    async fn event(
        ctxt: &SignalContext<'_>,
        client: &str,
        event: &str,
        payload: &str,
    ) -> zbus::Result<()>;
}
