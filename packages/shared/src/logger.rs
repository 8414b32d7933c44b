//! Tracing subscriber setup shared by the server and client binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise `default_level` is used
/// for the whole binary.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("logger initialized for '{}'", bin_name);
}
