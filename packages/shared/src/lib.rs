//! Shared utilities for Copimon.
//!
//! - `logger`: tracing subscriber setup
//! - `log_buffer`: bounded in-process log ring buffer (served by `GET /logs`, kept by the sync client)
//! - `time`: clock abstraction and timestamp formatting

pub mod log_buffer;
pub mod logger;
pub mod time;
