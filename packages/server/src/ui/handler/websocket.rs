//! WebSocket connection handlers.
//!
//! Handshake: the client connects with `GET /ws?token=<jwt>`; a missing or
//! invalid credential refuses the upgrade with 401 before any registry state
//! exists. After the upgrade the connection is registered, auto-joined to its
//! role channel and acknowledged, then serves three concerns until it dies:
//! inbound control messages, outbound fan-out delivery, and heartbeat.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::{
    domain::{ChannelName, CohortId, ConnectionId, Identity, UserId},
    infrastructure::dto::websocket::{
        ClientControlMessage, ConnectedMessage, ControlType, SubscribedMessage,
    },
    ui::state::{AppState, ConnectQuery},
    usecase::{
        JoinChannelUseCase, JoinOutcome, SubscribeRequest, UnregisterConnectionUseCase,
        RegisterConnectionUseCase,
    },
};
use kakehashi_shared::time::now_millis;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Verify the credential before upgrading; refusal leaves no state behind.
    let Some(token) = query.token else {
        tracing::warn!("handshake refused: missing bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let identity = match state.verifier.verify(&token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("handshake refused: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // Create a channel for this connection to receive fan-out deliveries
    let (tx, rx) = mpsc::unbounded_channel();

    let register_usecase = RegisterConnectionUseCase::new(state.registry.clone());
    let (connection_id, auto_joined) = register_usecase.execute(identity.clone(), tx.clone()).await;

    tracing::info!(
        "user '{}' ({}) connected as '{}'",
        identity.user_id,
        identity.role,
        connection_id
    );

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state, connection_id, identity, auto_joined, tx, rx)
    }))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    identity: Identity,
    auto_joined: Vec<ChannelName>,
    tx: mpsc::UnboundedSender<String>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Acknowledge the handshake: the client reconciles from this message
    // (identity echo plus the channels joined server-side).
    let connected_msg = ConnectedMessage {
        r#type: ControlType::Connected,
        user_id: identity.user_id.value(),
        role: identity.role.as_str().to_string(),
        name: identity.name.clone(),
        channels: auto_joined.iter().map(ChannelName::to_string).collect(),
        timestamp: now_millis(),
    };
    let connected_json = serde_json::to_string(&connected_msg).unwrap();
    if let Err(e) = sender.send(Message::Text(connected_json.into())).await {
        tracing::error!("failed to send connected ack to '{}': {}", connection_id, e);
        let unregister = UnregisterConnectionUseCase::new(state.registry.clone());
        unregister.execute(connection_id).await;
        return;
    }

    let last_pong = Arc::new(Mutex::new(Instant::now()));

    // Task: inbound control messages (subscribe:*) and pong bookkeeping
    let recv_registry = state.registry.clone();
    let recv_pong = last_pong.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("websocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let control = match serde_json::from_str::<ClientControlMessage>(&text) {
                        Ok(control) => control,
                        Err(e) => {
                            tracing::warn!(
                                "unparseable control message from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    // Malformed ids get the same silent treatment as
                    // unauthorized requests: nothing leaks back.
                    let request = match control {
                        ClientControlMessage::SubscribeMentor { mentor_id } => {
                            UserId::new(mentor_id).ok().map(SubscribeRequest::Mentor)
                        }
                        ClientControlMessage::SubscribeStudent { student_id } => {
                            UserId::new(student_id).ok().map(SubscribeRequest::Student)
                        }
                        ClientControlMessage::SubscribeCohort { cohort_id } => {
                            CohortId::new(cohort_id).ok().map(SubscribeRequest::Cohort)
                        }
                    };
                    let Some(request) = request else {
                        tracing::debug!("subscribe with invalid id from '{}'", connection_id);
                        continue;
                    };

                    let join_usecase = JoinChannelUseCase::new(recv_registry.clone());
                    match join_usecase.execute(connection_id, request).await {
                        // Re-joins are acked too, so a reconciling client can
                        // count acks without caring what the server knew.
                        JoinOutcome::Joined(channel) | JoinOutcome::AlreadyJoined(channel) => {
                            let ack = SubscribedMessage {
                                r#type: ControlType::Subscribed,
                                channel: channel.to_string(),
                                timestamp: now_millis(),
                            };
                            if tx.send(serde_json::to_string(&ack).unwrap()).is_err() {
                                break;
                            }
                        }
                        JoinOutcome::Rejected => {
                            // Silently dropped; see JoinChannelUseCase.
                        }
                    }
                }
                Message::Pong(_) => {
                    *recv_pong.lock().unwrap() = Instant::now();
                }
                Message::Ping(_) => {
                    // The transport answers pings automatically.
                }
                Message::Close(_) => {
                    tracing::info!("connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Task: outbound deliveries plus heartbeat pings / liveness check
    let heartbeat = state.heartbeat;
    let send_pong = last_pong.clone();
    let mut send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(heartbeat.interval);
        // The first tick fires immediately; skip it
        ping.tick().await;

        loop {
            tokio::select! {
                delivery = rx.recv() => {
                    match delivery {
                        Some(msg) => {
                            if sender.send(Message::Text(msg.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    let stalled = send_pong.lock().unwrap().elapsed()
                        > heartbeat.interval + heartbeat.timeout;
                    if stalled {
                        tracing::warn!(
                            "connection '{}' missed its heartbeat, dropping",
                            connection_id
                        );
                        break;
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Unregistration is idempotent: a transport error above and an explicit
    // close both funnel through here safely.
    let unregister_usecase = UnregisterConnectionUseCase::new(state.registry.clone());
    unregister_usecase.execute(connection_id).await;

    tracing::info!(
        "user '{}' disconnected ('{}'), {} connection(s) remaining",
        identity.user_id,
        connection_id,
        unregister_usecase.count_remaining_connections().await
    );
}
