//! Copimon clipboard relay server.
//!
//! Persists clipboard items per room and relays them to every WebSocket
//! subscriber of that room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin copimon-server
//! cargo run --bin copimon-server -- --host 0.0.0.0 --port 3001 --database copimon.db
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use copimon_server::{infrastructure::repository::SqliteItemRepository, ui::Server};
use copimon_shared::{
    log_buffer::{DEFAULT_LOG_CAPACITY, LogBuffer},
    logger::setup_logger_with_buffer,
    time::SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "copimon-server")]
#[command(about = "Clipboard relay server with per-room history", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "COPIMON_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3001")]
    port: u16,

    /// SQLite database file holding the room history
    #[arg(short = 'd', long, env = "COPIMON_DATABASE", default_value = "copimon.db")]
    database: PathBuf,

    /// Number of recent log lines served by `GET /logs`
    #[arg(long, default_value_t = DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let log_buffer = LogBuffer::new(args.log_capacity);
    setup_logger_with_buffer(env!("CARGO_BIN_NAME"), "info", log_buffer.clone());

    // 1. Repository (durable store)
    let repository = match SqliteItemRepository::open(&args.database) {
        Ok(repository) => repository,
        Err(e) => {
            tracing::error!("Failed to open database {}: {}", args.database.display(), e);
            std::process::exit(1);
        }
    };
    tracing::info!("History stored in {}", args.database.display());

    // 2. MessagePusher, UseCases and Server
    let server = Server::with_repository(Arc::new(repository), Arc::new(SystemClock), log_buffer);

    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
