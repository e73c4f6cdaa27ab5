//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event DTOs
//! - `http`: HTTP API response DTOs
//! - `conversion`: Domain → DTO conversions

pub mod conversion;
pub mod http;
pub mod websocket;
