//! Client-side error types.

use thiserror::Error;

/// Errors surfaced by the notification client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket transport failure (connect, read or write)
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server sent something the protocol does not allow here
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Reconnection gave up after exhausting the backoff schedule
    #[error("gave up reconnecting after {attempts} attempt(s)")]
    ReconnectExhausted { attempts: u32 },
}
