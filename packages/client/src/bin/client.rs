//! Interactive notification client binary.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-client -- --token <jwt>
//! ```

use std::sync::{Arc, Mutex};

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use kakehashi_client::{BackoffPolicy, ClientConfig, NotificationClient, NotificationStore};
use kakehashi_shared::logger::setup_logger;
use kakehashi_shared::time::millis_to_rfc3339;

#[derive(Debug, Parser)]
#[command(about = "Interactive notification client")]
struct Cli {
    /// WebSocket endpoint of the fan-out server
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Bearer token minted by the portal's auth service
    #[arg(long)]
    token: String,

    /// Cohort to subscribe to, when this user belongs to one
    #[arg(long)]
    cohort: Option<u64>,

    /// Reconnection attempts before giving up
    #[arg(long, default_value_t = 10)]
    max_reconnect_attempts: u32,

    /// Initial reconnection delay in milliseconds
    #[arg(long, default_value_t = 500)]
    backoff_base_ms: u64,

    /// Ceiling on the reconnection delay in seconds
    #[arg(long, default_value_t = 30)]
    backoff_max_delay_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let cli = Cli::parse();
    let config = ClientConfig {
        url: cli.url,
        token: cli.token,
        cohort: cli.cohort,
        backoff: BackoffPolicy {
            base: std::time::Duration::from_millis(cli.backoff_base_ms),
            max_delay: std::time::Duration::from_secs(cli.backoff_max_delay_secs),
            max_attempts: cli.max_reconnect_attempts,
            ..BackoffPolicy::default()
        },
    };

    let store = Arc::new(Mutex::new(NotificationStore::new()));

    let client = NotificationClient::new(config, store.clone());
    let transport = tokio::spawn(async move {
        if let Err(e) = client.run().await {
            tracing::error!("Client error: {}", e);
        }
    });

    // rustyline is blocking; keep it off the async runtime
    let repl = tokio::task::spawn_blocking(move || run_repl(store));
    if let Err(e) = repl.await {
        tracing::error!("REPL error: {}", e);
    }
    transport.abort();
}

fn run_repl(store: Arc<Mutex<NotificationStore>>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::error!("Failed to initialize line editor: {}", e);
            return;
        }
    };

    println!("Commands: list, read <n>, read-all, clear, log, status, quit");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if !dispatch_command(line, &store) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }
}

/// Execute one command. Returns `false` when the REPL should exit.
fn dispatch_command(line: &str, store: &Arc<Mutex<NotificationStore>>) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        "list" => {
            let store = store.lock().unwrap();
            if store.notifications().is_empty() {
                println!("(no notifications)");
            }
            for (i, n) in store.notifications().iter().enumerate() {
                let marker = if n.read { " " } else { "*" };
                println!(
                    "{marker} [{i}] {} {}",
                    millis_to_rfc3339(n.timestamp),
                    n.message
                );
            }
        }
        "read" => {
            let index = parts.next().and_then(|raw| raw.parse::<usize>().ok());
            let mut store = store.lock().unwrap();
            match index.and_then(|i| store.notifications().get(i).map(|n| n.id)) {
                Some(id) => store.mark_read(id),
                None => println!("usage: read <n>  (see `list` for indices)"),
            }
        }
        "read-all" => store.lock().unwrap().mark_all_read(),
        "clear" => store.lock().unwrap().clear(),
        "log" => {
            let store = store.lock().unwrap();
            if store.activity().next().is_none() {
                println!("(no activity)");
            }
            for entry in store.activity() {
                println!("{} {}", millis_to_rfc3339(entry.timestamp), entry.message);
            }
        }
        "status" => {
            let store = store.lock().unwrap();
            let state = store
                .state()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "not started".to_string());
            match store.display_name() {
                Some(name) => println!(
                    "{state}, signed in as {name}, {} unread",
                    store.unread_count()
                ),
                None => println!("{state}, {} unread", store.unread_count()),
            }
        }
        "quit" | "exit" => return false,
        _ => println!("unknown command: {command}"),
    }

    true
}
