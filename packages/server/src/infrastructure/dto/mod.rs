//! Wire-format DTOs for the WebSocket protocol.

pub mod conversion;
pub mod websocket;
