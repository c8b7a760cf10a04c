//! Copimon sync client.
//!
//! Keeps a local view of one room in sync with a Copimon server and copies
//! each line typed at the prompt to the room. Items typed while the server is
//! unreachable are queued and delivered once it is back.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin copimon-client -- --room work
//! cargo run --bin copimon-client -- -s http://192.168.0.10:3001
//! ```

use std::time::Duration;

use clap::Parser;

use copimon_client::{ClientConfig, run_client};
use copimon_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "copimon-client")]
#[command(about = "Clipboard sync client for Copimon", long_about = None)]
struct Args {
    /// Server base URL (http or https)
    #[arg(
        short = 's',
        long,
        env = "COPIMON_SERVER_URL",
        default_value = copimon_client::config::DEFAULT_SERVER_URL
    )]
    server_url: String,

    /// Room to sync
    #[arg(short = 'r', long, default_value = copimon_server::domain::DEFAULT_ROOM_ID)]
    room: String,

    /// Delay before reconnecting after the connection drops (milliseconds)
    #[arg(long, default_value_t = 2000)]
    reconnect_delay_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig::new(args.server_url, args.room)
        .with_reconnect_delay(Duration::from_millis(args.reconnect_delay_ms));

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
