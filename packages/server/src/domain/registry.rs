//! Connection Registry abstraction.
//!
//! The registry is the only shared mutable state of the subsystem: it maps
//! authenticated identities to their live transport handles and tracks
//! channel membership. The usecase layer depends on this trait, not on the
//! in-memory implementation (dependency inversion).

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    error::RegistryError,
    value_object::{ChannelName, ConnectionId, Identity, Timestamp},
};

/// Point-in-time view of the registry for the debug endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// Number of live connections
    pub connections: usize,
    /// Channel name and member count, for every non-empty channel
    pub channels: Vec<(String, usize)>,
}

/// Outcome of one fan-out delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    /// Live connections resolved from the target channels
    pub resolved: usize,
    /// Deliveries handed to a transport queue successfully
    pub delivered: usize,
    /// Connections whose transport was already gone
    pub failed: Vec<ConnectionId>,
}

/// Registry of live, authenticated connections and their channel memberships.
///
/// Implementations must apply each operation atomically with respect to a
/// concurrently running dispatch: a dispatch sees either the fully-joined or
/// fully-left state for any connection, never a half-updated membership set.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register a new authenticated connection and return its id.
    ///
    /// The caller has already verified the identity; registration itself
    /// cannot fail (one identity may hold any number of connections).
    async fn add_connection(
        &self,
        identity: Identity,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> ConnectionId;

    /// Remove a connection and its channel memberships.
    ///
    /// Idempotent: removing an unknown or already-removed connection is a
    /// no-op (a transport error and an explicit close may both call this).
    async fn remove_connection(&self, connection_id: ConnectionId);

    /// Join a connection to a channel, creating the channel lazily.
    ///
    /// Returns `Ok(false)` when the connection was already a member.
    async fn join_channel(
        &self,
        connection_id: ConnectionId,
        channel: ChannelName,
    ) -> Result<bool, RegistryError>;

    /// The verified identity of a connection, if it is still registered.
    async fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity>;

    /// Connection ids currently joined to a channel.
    async fn channel_members(&self, channel: ChannelName) -> Vec<ConnectionId>;

    /// Deliver a serialized message to the union of the given channels,
    /// deduplicated by connection id (a connection in two targeted channels
    /// receives one copy).
    ///
    /// Implementations must deliver atomically with respect to the other
    /// registry operations: two dispatches resolve and enqueue in one total
    /// order, so each connection's transport queue receives events in
    /// dispatch order. The sends are non-blocking; a gone transport is
    /// reported in the receipt, never an error.
    async fn deliver_to_channels(
        &self,
        channels: Vec<ChannelName>,
        message: String,
    ) -> DeliveryReceipt;

    /// Number of live connections.
    async fn count_connections(&self) -> usize;

    /// Snapshot of connections and non-empty channels.
    async fn snapshot(&self) -> RegistrySnapshot;
}
