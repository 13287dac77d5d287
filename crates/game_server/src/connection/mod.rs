//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking, session assignment and the outbound channel the
//! world writes to.

pub mod client;
pub mod manager;
pub mod outbound;

pub use manager::ConnectionManager;
pub use outbound::WsConnection;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
