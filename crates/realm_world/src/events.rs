//! Typed notifications the world raises for its owner.
//!
//! Events are collected during a call into the world and drained with
//! [`World::drain_events`](crate::World::drain_events). They report things
//! the hosting process may care about without the world calling back into
//! it.

use serde_json::Value;

use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A player completed the handshake.
    PlayerEntered { player: EntityId, name: String },
    /// A player left the world.
    PlayerRemoved { player: EntityId },
    /// The world asked the connection to close.
    ConnectionClosed { player: EntityId, reason: String },
    /// The player count changed.
    PopulationChanged { population: usize },
    /// A well formed command with no built in handler.
    Message {
        player: EntityId,
        action: i64,
        fields: Vec<Value>,
    },
}
