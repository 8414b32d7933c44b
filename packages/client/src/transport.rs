//! WebSocket transport: connect, negotiate subscriptions, deliver into the
//! store, and reconnect with backoff when the connection drops.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use kakehashi_server::domain::Role;
use kakehashi_server::infrastructure::dto::websocket::ServerMessage;

use crate::error::ClientError;
use crate::negotiator::{BackoffPolicy, ClientProfile, subscriptions};
use crate::store::{NotificationStore, StoreState};

/// Connection settings for the notification client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    /// Bearer token minted by the portal's auth service
    pub token: String,
    /// Cohort to subscribe to, when this user belongs to one
    pub cohort: Option<u64>,
    pub backoff: BackoffPolicy,
}

/// Long-running notification client.
///
/// Owns the reconnect loop; all received state lands in the shared store,
/// which the CLI reads from another thread.
pub struct NotificationClient {
    config: ClientConfig,
    store: Arc<Mutex<NotificationStore>>,
}

impl NotificationClient {
    pub fn new(config: ClientConfig, store: Arc<Mutex<NotificationStore>>) -> Self {
        Self { config, store }
    }

    /// Run until the backoff schedule is exhausted.
    ///
    /// A session that ends (server close, transport error) schedules a
    /// reconnect; a session that *reached the live state* resets the
    /// backoff, so only consecutive failures count toward the cutoff.
    pub async fn run(&self) -> Result<(), ClientError> {
        let mut attempt: u32 = 0;
        loop {
            self.set_state(StoreState::Connecting);

            match self.session().await {
                Ok(went_live) => {
                    self.set_state(StoreState::Disconnected);
                    if went_live {
                        attempt = 0;
                    }
                }
                Err(e) => {
                    tracing::warn!("session ended with error: {}", e);
                    self.set_state(StoreState::Disconnected);
                }
            }

            let Some(delay) = self.config.backoff.delay(attempt) else {
                self.set_state(StoreState::Offline);
                return Err(ClientError::ReconnectExhausted { attempts: attempt });
            };
            attempt += 1;
            tracing::info!("reconnecting in {:?} (attempt {})", delay, attempt);
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection lifetime: handshake, subscription negotiation, then
    /// the delivery loop until the connection dies.
    ///
    /// Returns whether the session reached the live state.
    async fn session(&self) -> Result<bool, ClientError> {
        let url = format!("{}?token={}", self.config.url, self.config.token);
        let (mut ws, _) = connect_async(&url).await?;

        // The first frame must be the handshake ack
        let ack = loop {
            let Some(frame) = ws.next().await else {
                return Err(ClientError::Protocol(
                    "connection closed before handshake ack".to_string(),
                ));
            };
            match frame? {
                Message::Text(text) => match ServerMessage::parse(&text) {
                    Ok(ServerMessage::Connected(ack)) => break ack,
                    Ok(other) => {
                        return Err(ClientError::Protocol(format!(
                            "expected connected ack, got {other:?}"
                        )));
                    }
                    Err(e) => return Err(ClientError::Protocol(e.to_string())),
                },
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => {
                    return Err(ClientError::Protocol(
                        "connection closed before handshake ack".to_string(),
                    ));
                }
                _ => continue,
            }
        };

        let role = Role::parse(&ack.role)
            .map_err(|_| ClientError::Protocol(format!("unknown role '{}'", ack.role)))?;
        let profile = ClientProfile {
            user_id: ack.user_id,
            role,
            cohort: self.config.cohort,
        };
        tracing::info!("connected as '{}' ({})", ack.name, ack.role);
        {
            let mut store = self.store.lock().unwrap();
            store.set_display_name(ack.name.clone());
            store.set_state(StoreState::Connected);
        }

        // Re-establish the full subscription set; the server remembers
        // nothing across connections.
        let pending = subscriptions(&profile);
        let mut awaiting = pending.len();
        self.set_state(StoreState::Reconciling);
        for message in pending {
            ws.send(Message::Text(message.to_string().into())).await?;
        }
        if awaiting == 0 {
            self.set_state(StoreState::Live);
        }

        let mut went_live = awaiting == 0;

        // Delivery loop
        while let Some(frame) = ws.next().await {
            let frame = frame?;
            match frame {
                Message::Text(text) => match ServerMessage::parse(&text) {
                    Ok(ServerMessage::Subscribed(ack)) => {
                        tracing::debug!("subscribed to '{}'", ack.channel);
                        awaiting = awaiting.saturating_sub(1);
                        if awaiting == 0 && !went_live {
                            self.set_state(StoreState::Live);
                            went_live = true;
                        }
                    }
                    Ok(ServerMessage::Event(envelope)) => {
                        self.store.lock().unwrap().apply_event(&envelope);
                    }
                    Ok(ServerMessage::Connected(_)) => {
                        tracing::warn!("unexpected repeated connected ack, ignoring");
                    }
                    Err(e) => {
                        tracing::warn!("unparseable frame from server: {}", e);
                    }
                },
                // tungstenite answers pings internally
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => break,
                _ => {}
            }
        }

        Ok(went_live)
    }

    fn set_state(&self, state: StoreState) {
        self.store.lock().unwrap().set_state(state);
    }
}
