use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CompatResult;
use crate::legacy::events;
use crate::network::link::{NotificationSink, RemoteLink};
use crate::network::types::{LegacyEvent, Notification, RemoteNotification, SubscriberId};

/// Remote subscription state of one forwarded event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Unsubscribed,
    Subscribing,
    Subscribed,
    Unsubscribing,
}

#[derive(Debug, Default)]
struct Channel {
    state: ChannelState,
    subscribers: BTreeSet<SubscriberId>,
}

/// Receiving end handed to a legacy subscriber.
///
/// Each subscriber has its own bounded queue. When it falls behind, the
/// oldest undelivered notifications are discarded; the backing service is
/// never held up.
pub type Subscription = broadcast::Receiver<Notification>;

type Senders = BTreeMap<LegacyEvent, broadcast::Sender<Notification>>;

/// Re-publishes backing-service notifications under legacy names.
///
/// The remote subscription for an event exists only while at least one
/// legacy subscriber is registered for it.
pub struct EventForwarder {
    channels: Mutex<BTreeMap<LegacyEvent, Channel>>,
    senders: Arc<Senders>,
    pump: JoinHandle<()>,
}

impl EventForwarder {
    /// Create the forwarder and the sink endpoints push notifications into.
    /// Must be called from within a tokio runtime.
    pub fn new(queue_depth: usize) -> (Self, NotificationSink) {
        let senders: Senders = LegacyEvent::ALL
            .into_iter()
            .map(|event| (event, broadcast::channel(queue_depth.max(1)).0))
            .collect();
        let senders = Arc::new(senders);

        let (sink, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(rx, senders.clone()));

        let forwarder = Self {
            channels: Mutex::new(BTreeMap::new()),
            senders,
            pump,
        };
        (forwarder, sink)
    }

    /// Register a legacy listener, subscribing remotely if it is the first one.
    /// A failed remote subscription fails only this call.
    pub async fn register(
        &self,
        link: &RemoteLink,
        event: LegacyEvent,
        subscriber: SubscriberId,
    ) -> CompatResult<Subscription> {
        // Receiver first, so nothing published after the remote subscription is missed
        let rx = self.senders[&event].subscribe();

        let mut channels = self.channels.lock().await;
        let channel = channels.entry(event).or_default();

        if channel.state == ChannelState::Unsubscribed {
            channel.state = ChannelState::Subscribing;
            debug!("Subscribing to {} for {}", event.remote_name(), subscriber);
            if let Err(e) = link.subscribe(event.remote_name()).await {
                channel.state = ChannelState::Unsubscribed;
                warn!("Subscription to {} failed: {}", event.remote_name(), e);
                return Err(e);
            }
            channel.state = ChannelState::Subscribed;
            info!("Forwarding {} as {}", event.remote_name(), event.legacy_name());
        }

        channel.subscribers.insert(subscriber);
        Ok(rx)
    }

    /// Remove a legacy listener; the last one out drops the remote subscription.
    pub async fn unregister(&self, link: &RemoteLink, event: LegacyEvent, subscriber: &SubscriberId) {
        let mut channels = self.channels.lock().await;
        let Some(channel) = channels.get_mut(&event) else {
            return;
        };
        if !channel.subscribers.remove(subscriber) {
            return;
        }

        if channel.subscribers.is_empty() && channel.state == ChannelState::Subscribed {
            channel.state = ChannelState::Unsubscribing;
            if let Err(e) = link.unsubscribe(event.remote_name()).await {
                // Still held remotely: the next register reuses it, teardown retries it
                channel.state = ChannelState::Subscribed;
                warn!("Unsubscribe from {} failed: {}", event.remote_name(), e);
                return;
            }
            channel.state = ChannelState::Unsubscribed;
            info!("Stopped forwarding {}", event.legacy_name());
        }
    }

    /// Drop every subscription and reset all flags
    pub async fn teardown(&self, link: &RemoteLink) {
        let mut channels = self.channels.lock().await;
        let link_ready = link.state().is_ready();

        for (event, channel) in channels.iter_mut() {
            if channel.state == ChannelState::Subscribed && link_ready {
                if let Err(e) = link.unsubscribe(event.remote_name()).await {
                    debug!("Unsubscribe from {} during teardown failed: {}", event.remote_name(), e);
                }
            }
            channel.state = ChannelState::Unsubscribed;
            channel.subscribers.clear();
        }
    }

    pub async fn state(&self, event: LegacyEvent) -> ChannelState {
        self.channels
            .lock()
            .await
            .get(&event)
            .map(|c| c.state)
            .unwrap_or_default()
    }

    /// Subscription flag: true while a remote subscription is held
    pub async fn is_subscribed(&self, event: LegacyEvent) -> bool {
        self.state(event).await == ChannelState::Subscribed
    }

    pub async fn subscriber_count(&self, event: LegacyEvent) -> usize {
        self.channels
            .lock()
            .await
            .get(&event)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }
}

impl Drop for EventForwarder {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Single consumer of backing notifications; preserves arrival order.
async fn pump(mut rx: mpsc::UnboundedReceiver<RemoteNotification>, senders: Arc<Senders>) {
    while let Some(raw) = rx.recv().await {
        let Some(event) = LegacyEvent::from_remote_name(&raw.event) else {
            debug!("Ignoring backing notification {}", raw.event);
            continue;
        };

        match events::reshape(event, &raw.payload) {
            // No receivers just means nobody is listening right now
            Ok(payload) => {
                let _ = senders[&event].send(Notification { event, payload });
            }
            Err(e) => warn!("Dropping malformed {} notification: {}", raw.event, e),
        }
    }
    debug!("Notification pump stopped");
}
