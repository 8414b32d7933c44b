//! Server configuration.
//!
//! Heartbeat timing is deliberately configuration, not contract: deployments
//! tune the interval/timeout to their network, and tests shrink them.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Environment variable consulted when `--jwt-secret` is not passed.
pub const JWT_SECRET_ENV: &str = "KAKEHASHI_JWT_SECRET";

/// Configuration errors raised before the server starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no JWT secret: pass --jwt-secret or set {JWT_SECRET_ENV}")]
    MissingJwtSecret,
}

/// Transport-level liveness policy.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// How often the server pings each connection
    pub interval: Duration,
    /// How long a pong may lag past the next ping before the connection
    /// is considered dead and unregistered
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fully-resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub jwt_secret: String,
    pub heartbeat: HeartbeatConfig,
}

/// Command line interface of the server binary.
#[derive(Debug, Parser)]
#[command(name = "kakehashi-server", about = "Real-time notification fan-out server")]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// HS256 secret used to verify handshake tokens
    /// (falls back to the KAKEHASHI_JWT_SECRET environment variable)
    #[arg(long)]
    pub jwt_secret: Option<String>,

    /// Seconds between heartbeat pings
    #[arg(long, default_value_t = 30)]
    pub heartbeat_interval_secs: u64,

    /// Seconds a pong may lag before the connection is dropped
    #[arg(long, default_value_t = 10)]
    pub heartbeat_timeout_secs: u64,
}

impl Cli {
    /// Resolve the CLI (plus environment) into a ServerConfig.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let jwt_secret = self
            .jwt_secret
            .or_else(|| std::env::var(JWT_SECRET_ENV).ok())
            .ok_or(ConfigError::MissingJwtSecret)?;

        Ok(ServerConfig {
            bind: self.bind,
            jwt_secret,
            heartbeat: HeartbeatConfig {
                interval: Duration::from_secs(self.heartbeat_interval_secs),
                timeout: Duration::from_secs(self.heartbeat_timeout_secs),
            },
        })
    }
}
