//! Copimon sync client.
//!
//! - [`SyncClient`]: connection state machine, item cache and send queue
//! - [`run_client`]: interactive CLI used by the `copimon-client` binary

pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
mod machine;
pub mod runner;
pub mod sync_client;
pub mod transport;
pub mod ui;

pub use config::ClientConfig;
pub use domain::{ConnectionState, ConnectionStatus};
pub use error::ClientError;
pub use runner::run_client;
pub use sync_client::{SubmitOutcome, SyncClient, SyncNotice};
