//! Logging setup utilities for Copimon binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::log_buffer::{LogBuffer, LogBufferLayer};

/// Crates whose events are shown at the default level
const WORKSPACE_CRATES: [&str; 3] = ["copimon_shared", "copimon_server", "copimon_client"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "copimon-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use copimon_shared::logger::setup_logger;
///
/// setup_logger("copimon-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(build_env_filter(binary_name, default_log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Same as [`setup_logger`], and also mirrors every event into `buffer`.
pub fn setup_logger_with_buffer(binary_name: &str, default_log_level: &str, buffer: LogBuffer) {
    tracing_subscriber::registry()
        .with(build_env_filter(binary_name, default_log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(LogBufferLayer::new(buffer))
        .init();
}

fn build_env_filter(binary_name: &str, default_log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into())
}

fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, default_log_level))
        .collect();
    let binary_target = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }
    directives.push(format!("tower_http={}", default_log_level));
    directives.join(",")
}
