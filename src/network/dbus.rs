use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zbus::fdo::DBusProxy;
use zbus::names::{BusName, WellKnownName};
use zbus::Connection;

use crate::error::LinkFault;
use crate::network::dbus_proxies::NetworkManagerBridgeProxy;
use crate::network::link::{Connector, NotificationSink, RemoteEndpoint};
use crate::network::types::RemoteNotification;

/// Reaches the backing service on the system bus
pub struct DbusConnector {
    service: String,
    path: String,
    call_timeout: Duration,
}

impl DbusConnector {
    pub fn new(service: impl Into<String>, path: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            call_timeout,
        }
    }
}

#[async_trait]
impl Connector for DbusConnector {
    async fn connect(&self, sink: NotificationSink) -> Result<Arc<dyn RemoteEndpoint>, LinkFault> {
        let connection = Connection::system().await?;

        let name = WellKnownName::try_from(self.service.as_str())
            .map_err(|e| LinkFault::Protocol(e.to_string()))?;
        let dbus = DBusProxy::new(&connection).await?;
        activate(&dbus, &name).await?;

        let proxy = NetworkManagerBridgeProxy::builder(&connection)
            .destination(self.service.clone())?
            .path(self.path.clone())?
            .build()
            .await?;

        let mut events = proxy.receive_event().await?;
        let listener = tokio::spawn(async move {
            while let Some(signal) = events.next().await {
                let args = match signal.args() {
                    Ok(args) => args,
                    Err(e) => {
                        debug!("Unreadable NetworkManager signal: {}", e);
                        continue;
                    }
                };
                let payload = match serde_json::from_str(args.payload()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        debug!("Dropping {} with non-JSON payload: {}", args.name(), e);
                        continue;
                    }
                };
                let notification = RemoteNotification {
                    event: args.name().clone(),
                    payload,
                };
                if sink.send(notification).is_err() {
                    break;
                }
            }
            debug!("NetworkManager signal listener stopped");
        });

        info!("Connected to {} at {}", self.service, self.path);
        Ok(Arc::new(DbusEndpoint {
            proxy,
            call_timeout: self.call_timeout,
            listener,
        }))
    }
}

/// Ask the bus to start an activatable service, then require an owner.
/// A service that is neither running nor activatable is unreachable.
async fn activate(dbus: &DBusProxy<'_>, name: &WellKnownName<'_>) -> Result<(), LinkFault> {
    if dbus.name_has_owner(BusName::from(name.clone())).await? {
        return Ok(());
    }

    debug!("Requesting activation of {}", name);
    dbus.start_service_by_name(name.clone(), 0).await?;

    if !dbus.name_has_owner(BusName::from(name.clone())).await? {
        return Err(LinkFault::Unreachable(format!("{} has no owner", name)));
    }
    info!("Activated {}", name);
    Ok(())
}

struct DbusEndpoint {
    proxy: NetworkManagerBridgeProxy<'static>,
    call_timeout: Duration,
    listener: JoinHandle<()>,
}

impl DbusEndpoint {
    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = zbus::Result<T>>,
    ) -> Result<T, LinkFault> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LinkFault::Timeout(self.call_timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl RemoteEndpoint for DbusEndpoint {
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, LinkFault> {
        let params = serde_json::to_string(&params)?;
        let reply = self.bounded(self.proxy.invoke(method, &params)).await?;
        if reply.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&reply)?)
    }

    async fn subscribe(&self, event: &str) -> Result<(), LinkFault> {
        self.bounded(self.proxy.subscribe(event)).await
    }

    async fn unsubscribe(&self, event: &str) -> Result<(), LinkFault> {
        self.bounded(self.proxy.unsubscribe(event)).await
    }
}

impl Drop for DbusEndpoint {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
