//! Client connection representation and management.
//!
//! This module defines the structure and behavior of individual client
//! connections, tracking their state and metadata.

use realm_world::EntityId;
use std::net::SocketAddr;
use std::time::SystemTime;

/// Represents an individual client connection to the server.
///
/// This structure tracks the essential information about a connected client,
/// including the player session the world assigned to it, its network address
/// and connection timing.
#[derive(Debug)]
pub struct ClientConnection {
    /// The session id assigned by the world (None until the world accepts it)
    pub player_id: Option<EntityId>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,
}

impl ClientConnection {
    /// Creates a new client connection with the specified remote address.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    ///
    /// # Returns
    ///
    /// A new `ClientConnection` instance ready for use.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            player_id: None,
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }
}
