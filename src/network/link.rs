use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{CompatError, CompatResult, LinkFault};
use crate::network::gate::ActivationGate;
use crate::network::types::RemoteNotification;

/// Sink through which an endpoint pushes backing-service notifications.
/// Unbounded so the source is never held up by slow consumers.
pub type NotificationSink = mpsc::UnboundedSender<RemoteNotification>;

/// An established connection to the backing service
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Call a backing-service method and return its JSON result
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, LinkFault>;

    /// Ask the backing service to start publishing `event`
    async fn subscribe(&self, event: &str) -> Result<(), LinkFault>;

    /// Ask the backing service to stop publishing `event`
    async fn unsubscribe(&self, event: &str) -> Result<(), LinkFault>;
}

/// Resolves the backing service. One call is one resolution attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, sink: NotificationSink) -> Result<Arc<dyn RemoteEndpoint>, LinkFault>;
}

/// Lifecycle of the shared endpoint handle
#[derive(Clone, Default)]
pub enum LinkState {
    #[default]
    Absent,
    Connecting,
    Ready(Arc<dyn RemoteEndpoint>),
    Faulted(LinkFault),
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Connecting => "connecting",
            Self::Ready(_) => "ready",
            Self::Faulted(_) => "faulted",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Faulted(fault) => write!(f, "Faulted({fault})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Lazily established, shared handle to the backing service
pub struct RemoteLink {
    connector: Arc<dyn Connector>,
    sink: NotificationSink,
    gate: ActivationGate,
    state: Mutex<LinkState>,
    /// Serializes establishment so concurrent callers share one attempt
    establishing: tokio::sync::Mutex<()>,
}

impl RemoteLink {
    pub fn new(connector: Arc<dyn Connector>, sink: NotificationSink, gate: ActivationGate) -> Self {
        Self {
            connector,
            sink,
            gate,
            state: Mutex::new(LinkState::Absent),
            establishing: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current link state
    pub fn state(&self) -> LinkState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LinkState> {
        // A poisoned lock only means a panic elsewhere; the state is still valid.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ready_endpoint(&self) -> Option<Arc<dyn RemoteEndpoint>> {
        match &*self.lock_state() {
            LinkState::Ready(ep) => Some(ep.clone()),
            _ => None,
        }
    }

    /// Return the endpoint, establishing it through the activation gate if needed.
    /// A ready link is returned as is.
    pub async fn endpoint(&self) -> CompatResult<Arc<dyn RemoteEndpoint>> {
        if let Some(ep) = self.ready_endpoint() {
            return Ok(ep);
        }

        let _guard = self.establishing.lock().await;
        // Someone else may have finished while we waited for the guard
        if let Some(ep) = self.ready_endpoint() {
            return Ok(ep);
        }

        *self.lock_state() = LinkState::Connecting;
        debug!("Resolving backing service");

        let connector = &self.connector;
        let sink = &self.sink;
        match self
            .gate
            .wait_for(move || connector.connect(sink.clone()))
            .await
        {
            Ok(ep) => {
                *self.lock_state() = LinkState::Ready(ep.clone());
                info!("Backing service link ready");
                Ok(ep)
            }
            Err(fault) => {
                warn!("Backing service not reachable: {}", fault);
                *self.lock_state() = LinkState::Faulted(fault);
                Err(CompatError::NotInitialized)
            }
        }
    }

    /// Invoke a backing-service method
    pub async fn invoke(&self, method: &str, params: Value) -> CompatResult<Value> {
        let ep = self.endpoint().await?;
        debug!("-> {} {}", method, params);
        let reply = ep.invoke(method, params).await.map_err(|fault| {
            warn!("{} failed: {}", method, fault);
            CompatError::Link(fault)
        })?;
        debug!("<- {} {}", method, reply);
        Ok(reply)
    }

    pub async fn subscribe(&self, event: &str) -> CompatResult<()> {
        let ep = self.endpoint().await?;
        ep.subscribe(event).await?;
        Ok(())
    }

    pub async fn unsubscribe(&self, event: &str) -> CompatResult<()> {
        let ep = self.endpoint().await?;
        ep.unsubscribe(event).await?;
        Ok(())
    }

    /// Drop the handle; the next call resolves the service again
    pub fn teardown(&self) {
        let mut state = self.lock_state();
        if state.is_ready() {
            info!("Releasing backing service link");
        }
        *state = LinkState::Absent;
    }
}
