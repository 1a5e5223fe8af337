//! Legacy WiFiManager API served on top of the NetworkManager service.
//!
//! Legacy calls go through [`legacy::WifiManagerAdapter`], which reaches the
//! backing service through a lazily established [`network::RemoteLink`] and
//! translates results back into the legacy vocabulary. Backing notifications
//! are re-published under legacy names by [`legacy::forwarder::EventForwarder`].

pub mod config;
pub mod error;
pub mod host;
pub mod legacy;
pub mod network;

pub use error::{CompatError, CompatResult, LinkFault};
pub use legacy::{AdapterSettings, Dispatcher, Lifecycle, WifiManagerAdapter};
