//! CLI notification client for the fan-out server.
//!
//! Keeps one WebSocket connection alive (reconnecting with capped
//! exponential backoff), renegotiates subscriptions on every connect, and
//! maintains a local notification store the interactive CLI renders.

pub mod error;
pub mod negotiator;
pub mod store;
pub mod transport;

pub use error::ClientError;
pub use negotiator::BackoffPolicy;
pub use store::{Notification, NotificationStore, StoreState};
pub use transport::{ClientConfig, NotificationClient};
