//! Server state and connection handshake types.

use serde::Deserialize;
use std::sync::Arc;

use crate::config::HeartbeatConfig;
use crate::domain::ConnectionRegistry;
use crate::infrastructure::auth::TokenVerifier;

/// Query parameters for the WebSocket handshake
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Bearer credential minted by the portal's auth service
    pub token: Option<String>,
}

/// Shared application state
///
/// The registry is the dispatcher's view of the world; everything else here
/// is immutable configuration.
pub struct AppState {
    /// Registry（共有可変状態の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Handshake credential verifier
    pub verifier: TokenVerifier,
    /// Transport liveness policy
    pub heartbeat: HeartbeatConfig,
}
