//! Connection manager for tracking and managing client connections.
//!
//! This module provides the central registry of open client connections,
//! handling connection lifecycle, id assignment and the mapping to world
//! sessions.

use super::{client::ClientConnection, ConnectionId};
use realm_world::EntityId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Central manager for all client connections.
///
/// The `ConnectionManager` tracks active connections, assigns unique IDs
/// and remembers which world session each connection drives. It uses
/// async-safe data structures to handle concurrent access from multiple
/// connection handlers.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe connection storage
/// * Implements atomic connection ID generation
/// * Maintains the connection to player mapping
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,

    /// Atomic counter for generating unique connection IDs
    next_id: Arc<AtomicUsize>,
}

impl ConnectionManager {
    /// Creates a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Adds a new connection and returns its unique ID.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    ///
    /// # Returns
    ///
    /// A unique `ConnectionId` assigned to this connection.
    pub async fn add_connection(&self, remote_addr: SocketAddr) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let connection = ClientConnection::new(remote_addr);
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, connection);
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Removes a connection from the manager.
    ///
    /// Cleans up the connection entry and logs the disconnection.
    /// This should be called when a client disconnects or is closed by
    /// the world.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - The ID of the connection to remove
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.remove(&connection_id) {
            let duration = connection.connected_at.elapsed().unwrap_or_default();
            info!(
                "❌ Connection {} from {} disconnected after {:.1}s",
                connection_id,
                connection.remote_addr,
                duration.as_secs_f64()
            );
        }
    }

    /// Associates a world session with a connection.
    pub async fn set_player_id(&self, connection_id: ConnectionId, player_id: EntityId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.player_id = Some(player_id);
        }
    }

    /// Retrieves the world session associated with a connection.
    ///
    /// # Returns
    ///
    /// The associated `EntityId` if found, or `None` if the connection
    /// doesn't exist or the world refused it.
    pub async fn get_player_id(&self, connection_id: ConnectionId) -> Option<EntityId> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).and_then(|c| c.player_id)
    }

    /// Finds the connection driving a world session.
    pub async fn get_connection_id_by_player(&self, player_id: EntityId) -> Option<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .iter()
            .find(|(_, c)| c.player_id == Some(player_id))
            .map(|(id, _)| *id)
    }

    /// Number of connections currently open.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
