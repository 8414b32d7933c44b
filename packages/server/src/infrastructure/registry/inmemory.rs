//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! HashMap をインメモリストアとして使用します。
//!
//! 接続マップとチャンネル会員マップを単一の Mutex 配下に置くことで、
//! 進行中の dispatch が join/leave の途中状態を観測しないことを保証します
//! （完全に参加済みか完全に退出済みのどちらかしか見えない）。
//!
//! チャンネルは初回参加時に遅延生成され、空になった時点で削除されます
//! （プロセス再起動で全て消える前提の、永続化しない存在）。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::domain::{
    ChannelName, Connection, ConnectionId, ConnectionRegistry, DeliveryReceipt, Identity,
    RegistryError, RegistrySnapshot, Timestamp,
};

/// One registered connection: the domain entity plus its transport handle.
struct ConnectionEntry {
    connection: Connection,
    sender: UnboundedSender<String>,
}

/// Both maps live behind one lock; see the module docs.
#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    channels: HashMap<ChannelName, HashSet<ConnectionId>>,
}

/// インメモリ Connection Registry 実装
pub struct InMemoryConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add_connection(
        &self,
        identity: Identity,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let connection = Connection::new(connection_id, identity, connected_at);

        let mut inner = self.inner.lock().await;
        inner
            .connections
            .insert(connection_id, ConnectionEntry { connection, sender });

        connection_id
    }

    async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.lock().await;

        // Idempotent: a transport error and an explicit close may both land here.
        let Some(entry) = inner.connections.remove(&connection_id) else {
            return;
        };

        for channel in &entry.connection.channels {
            if let Some(members) = inner.channels.get_mut(channel) {
                members.remove(&connection_id);
                if members.is_empty() {
                    inner.channels.remove(channel);
                }
            }
        }
    }

    async fn join_channel(
        &self,
        connection_id: ConnectionId,
        channel: ChannelName,
    ) -> Result<bool, RegistryError> {
        let mut inner = self.inner.lock().await;

        let joined = {
            let entry = inner
                .connections
                .get_mut(&connection_id)
                .ok_or(RegistryError::ConnectionNotFound(connection_id))?;
            entry.connection.join(channel)
        };

        // Membership is a set: re-joining is a no-op.
        if !joined {
            return Ok(false);
        }

        inner
            .channels
            .entry(channel)
            .or_default()
            .insert(connection_id);

        Ok(true)
    }

    async fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        let inner = self.inner.lock().await;
        inner
            .connections
            .get(&connection_id)
            .map(|entry| entry.connection.identity.clone())
    }

    async fn channel_members(&self, channel: ChannelName) -> Vec<ConnectionId> {
        let inner = self.inner.lock().await;
        inner
            .channels
            .get(&channel)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn deliver_to_channels(
        &self,
        channels: Vec<ChannelName>,
        message: String,
    ) -> DeliveryReceipt {
        // Resolution and enqueueing both happen under the lock: concurrent
        // dispatches are totally ordered, so each connection's mpsc queue
        // receives events in dispatch order. The sends are unbounded and
        // never block.
        let inner = self.inner.lock().await;

        let mut seen: HashSet<ConnectionId> = HashSet::new();
        let mut receipt = DeliveryReceipt::default();

        for channel in &channels {
            let Some(members) = inner.channels.get(channel) else {
                continue;
            };
            for connection_id in members {
                if !seen.insert(*connection_id) {
                    continue;
                }
                let Some(entry) = inner.connections.get(connection_id) else {
                    continue;
                };
                receipt.resolved += 1;
                if entry.sender.send(message.clone()).is_ok() {
                    receipt.delivered += 1;
                } else {
                    receipt.failed.push(*connection_id);
                }
            }
        }

        receipt
    }

    async fn count_connections(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.connections.len()
    }

    async fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.lock().await;

        let mut channels: Vec<(String, usize)> = inner
            .channels
            .iter()
            .map(|(name, members)| (name.to_string(), members.len()))
            .collect();
        channels.sort();

        RegistrySnapshot {
            connections: inner.connections.len(),
            channels,
        }
    }
}
