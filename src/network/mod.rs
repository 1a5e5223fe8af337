pub mod dbus;
pub mod dbus_proxies;
pub mod gate;
pub mod link;
pub mod types;

pub use dbus::DbusConnector;
pub use gate::ActivationGate;
pub use link::{Connector, LinkState, NotificationSink, RemoteEndpoint, RemoteLink};
pub use types::*;
