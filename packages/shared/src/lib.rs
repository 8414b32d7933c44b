//! Shared utilities for the Kakehashi notification layer.
//!
//! Small, dependency-light helpers used by both the server and the client:
//! logger setup and UTC millisecond timestamps.

pub mod logger;
pub mod time;

pub use logger::setup_logger;
pub use time::{millis_to_rfc3339, now_millis};
