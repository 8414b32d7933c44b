//! Data transfer objects for the wire protocol and HTTP endpoints.

pub mod http;
pub mod websocket;
