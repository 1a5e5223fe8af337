pub mod adapter;
pub mod dispatch;
pub mod error_map;
pub mod events;
pub mod forwarder;
pub mod types;

pub use adapter::{AdapterSettings, WifiManagerAdapter};
pub use dispatch::{Dispatcher, Lifecycle};
pub use types::*;
