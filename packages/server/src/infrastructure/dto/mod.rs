//! Data Transfer Objects (DTOs)
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frames (both directions)
//! - `http`: HTTP API response bodies
//!
//! Domain → DTO conversions live in `conversion`.

pub mod conversion;
pub mod http;
pub mod websocket;
