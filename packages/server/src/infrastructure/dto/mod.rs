//! Data Transfer Objects (DTOs) for the clipboard relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: stream message DTOs and the decode step
//! - `http`: HTTP API request / response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
