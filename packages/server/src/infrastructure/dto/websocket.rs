//! WebSocket message DTOs for the notification fan-out layer.
//!
//! Server -> client frames share one envelope shape `{ type, .., timestamp }`:
//! `type` is either a control frame name (`connected`, `subscribed`) or a
//! domain event kind (`doubt:created`, ...). Client -> server frames are the
//! subscription control messages. Nothing here is persisted; state is rebuilt
//! from scratch on every reconnect.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::EventKind;

/// Control frame type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlType {
    Connected,
    Subscribed,
}

/// Handshake acknowledgement sent once after a successful upgrade.
///
/// Carries the verified identity back to the client together with the
/// channels the server auto-joined (currently `role:<role>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: ControlType,
    pub user_id: u64,
    pub role: String,
    pub name: String,
    /// Channels joined server-side during registration
    pub channels: Vec<String>,
    pub timestamp: i64,
}

/// Per-subscription acknowledgement.
///
/// Sent for fresh joins and for idempotent re-joins alike, so a reconciling
/// client can count acks without caring whether the server already knew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribedMessage {
    pub r#type: ControlType,
    pub channel: String,
    pub timestamp: i64,
}

/// One fanned-out domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub r#type: EventKind,
    pub payload: Value,
    /// Server-assigned emission time (Unix millis); clients order by this
    pub timestamp: i64,
}

/// Subscription control messages sent by the client.
///
/// Each is validated against the connection's own verified identity before
/// any channel membership changes; disallowed requests are silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientControlMessage {
    #[serde(rename = "subscribe:mentor")]
    SubscribeMentor { mentor_id: u64 },
    #[serde(rename = "subscribe:student")]
    SubscribeStudent { student_id: u64 },
    #[serde(rename = "subscribe:cohort")]
    SubscribeCohort { cohort_id: u64 },
}

/// Parsed server -> client frame, for the client side.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    Connected(ConnectedMessage),
    Subscribed(SubscribedMessage),
    Event(EventEnvelope),
}

impl ServerMessage {
    /// Parse a raw text frame by peeking at its `type` field.
    ///
    /// Unknown event kinds fail to parse, which the caller treats as a
    /// protocol error to log, not a crash.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        match value.get("type").and_then(Value::as_str) {
            Some("connected") => Ok(Self::Connected(serde_json::from_value(value)?)),
            Some("subscribed") => Ok(Self::Subscribed(serde_json::from_value(value)?)),
            _ => Ok(Self::Event(serde_json::from_value(value)?)),
        }
    }
}
