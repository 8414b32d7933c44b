//! Real-time notification fan-out server.
//!
//! Accepts authenticated WebSocket connections from portal clients, tracks
//! which channels each connection listens on, and pushes domain events to
//! every connection subscribed to an affected channel.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::{Cli, HeartbeatConfig, ServerConfig};
pub use ui::{build_router, run as run_server};
