pub mod connection;
pub mod hub;

pub use connection::ConnectionTimings;
pub use hub::{BroadcastScope, Hub, Subscription};
