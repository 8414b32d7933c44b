//! Notification fan-out server binary.
//!
//! Run with:
//! ```not_rust
//! KAKEHASHI_JWT_SECRET=... cargo run --bin kakehashi-server
//! ```

use clap::Parser;

use kakehashi_server::Cli;
use kakehashi_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    // Run the server
    if let Err(e) = kakehashi_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
