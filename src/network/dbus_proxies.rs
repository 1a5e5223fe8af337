// D-Bus proxy trait definitions for the backing NetworkManager service.
// These use zbus's #[proxy] macro to auto-generate typed async clients.

use zbus::proxy;

// ── NetworkManager JSON bridge ────────────────────────────────────────

#[proxy(
    interface = "org.rdk.NetworkManager1",
    default_service = "org.rdk.NetworkManager",
    default_path = "/org/rdk/NetworkManager"
)]
pub trait NetworkManagerBridge {
    /// Call a NetworkManager method; params and result are JSON documents
    fn invoke(&self, method: &str, params: &str) -> zbus::Result<String>;

    /// Start publishing an event as `Event` signals
    fn subscribe(&self, event: &str) -> zbus::Result<()>;

    /// Stop publishing an event
    fn unsubscribe(&self, event: &str) -> zbus::Result<()>;

    /// A NetworkManager notification; payload is a JSON document
    #[zbus(signal)]
    fn event(&self, name: String, payload: String) -> zbus::Result<()>;
}
