//! Room and presence manager for the idobata chat application.
//!
//! Tracks which authenticated identity is connected to which logical room,
//! multiplexes chat messages and typing signals per room, and keeps the
//! presence view consistent across joins, leaves and abrupt disconnects.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
