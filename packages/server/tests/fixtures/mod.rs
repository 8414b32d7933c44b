//! Shared integration-test fixtures.
//!
//! Each test starts its own server instance on a dedicated port so tests can
//! run in parallel without sharing registry state.

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use kakehashi_server::{
    HeartbeatConfig, build_router,
    infrastructure::{
        InMemoryConnectionRegistry, TokenVerifier,
        auth::{Claims, mint_token},
    },
    ui::state::AppState,
};
use kakehashi_shared::time::now_millis;

/// Signing secret shared by the test server and the tokens minted below.
pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    port: u16,
}

impl TestServer {
    /// Start a fresh server instance on the given port.
    pub async fn start(port: u16) -> Self {
        let state = Arc::new(AppState {
            registry: Arc::new(InMemoryConnectionRegistry::new()),
            verifier: TokenVerifier::new(TEST_SECRET),
            heartbeat: HeartbeatConfig::default(),
        });
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .expect("Failed to bind test port");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self { port }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://127.0.0.1:{}/ws?token={}", self.port, token),
            None => format!("ws://127.0.0.1:{}/ws", self.port),
        }
    }
}

/// Mint a token the test server will accept.
pub fn token(sub: u64, role: &str, cohort_id: Option<u64>) -> String {
    let now = now_millis() / 1000;
    mint_token(
        TEST_SECRET,
        &Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            name: format!("user-{sub}"),
            cohort_id,
            iat: now,
            exp: now + 3600,
        },
    )
    .expect("Failed to mint token")
}

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect a WebSocket client and return it together with the raw
/// `connected` acknowledgement frame.
pub async fn connect_client(server: &TestServer, token: &str) -> (WsClient, serde_json::Value) {
    let (mut ws, _) = connect_async(server.ws_url(Some(token)))
        .await
        .expect("Failed to connect");
    let ack: serde_json::Value =
        serde_json::from_str(&next_text(&mut ws).await).expect("Failed to parse ack");
    assert_eq!(ack["type"], "connected");
    (ws, ack)
}

/// Read the next text frame, skipping transport-level ping/pong.
pub async fn next_text(ws: &mut WsClient) -> String {
    loop {
        let frame = ws
            .next()
            .await
            .expect("Stream closed")
            .expect("WebSocket error");
        match frame {
            Message::Text(text) => return text.to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Send one JSON control message to the server.
pub async fn send_json(ws: &mut WsClient, json: serde_json::Value) {
    ws.send(Message::Text(json.to_string().into()))
        .await
        .expect("Failed to send");
}
