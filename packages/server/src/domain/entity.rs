//! Core domain models for the notification fan-out subsystem.

use std::collections::HashSet;

use super::value_object::{ChannelName, ConnectionId, Identity, Timestamp};

/// Represents one live, authenticated transport connection.
///
/// Owned exclusively by the Connection Registry. A user with several browser
/// tabs is represented by several Connections sharing one Identity.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Connection identifier (one per transport, not per user)
    pub id: ConnectionId,
    /// Verified identity extracted from the handshake credential
    pub identity: Identity,
    /// Channels this connection is currently joined to (a set, not a multiset)
    pub channels: HashSet<ChannelName>,
    /// Timestamp when the connection was established
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a new connection with no channel memberships.
    pub fn new(id: ConnectionId, identity: Identity, connected_at: Timestamp) -> Self {
        Self {
            id,
            identity,
            channels: HashSet::new(),
            connected_at,
        }
    }

    /// Join a channel.
    ///
    /// Returns `false` if the connection was already a member (re-joining is
    /// a no-op).
    pub fn join(&mut self, channel: ChannelName) -> bool {
        self.channels.insert(channel)
    }

    /// Leave a channel. Unknown channels are ignored.
    pub fn leave(&mut self, channel: &ChannelName) {
        self.channels.remove(channel);
    }

    /// Whether the connection is currently joined to `channel`.
    pub fn is_member(&self, channel: &ChannelName) -> bool {
        self.channels.contains(channel)
    }
}
