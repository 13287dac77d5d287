//! Message routing logic for dispatching client frames to the world.
//!
//! This module validates incoming text frames and forwards the decoded
//! message fields to the world task, which owns all game state.

use crate::config::SecurityConfig;
use crate::connection::ConnectionId;
use crate::security::{validate_frame, SecurityError};
use crate::server::WorldInput;
use realm_world::EntityId;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Reasons a client frame did not reach the world.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// The frame failed validation; the connection should be closed
    #[error(transparent)]
    Rejected(#[from] SecurityError),

    /// The world task has stopped and no longer accepts input
    #[error("World task is not running")]
    WorldUnavailable,
}

/// Routes a raw client frame to the world.
///
/// # Arguments
///
/// * `text` - The raw frame text from the client (expected to be a JSON array)
/// * `connection_id` - The unique identifier for the client connection
/// * `player` - The world session driven by this connection
/// * `world` - Inbox of the world task
/// * `security` - Limits every frame must respect
///
/// # Returns
///
/// `Ok(())` once the message is queued for the world, or a `RoutingError`
/// when the frame was rejected or the world is gone.
///
/// # Example Message Format
///
/// A MOVE request to tile (12, 7):
/// ```json
/// [4, 12, 7]
/// ```
pub fn route_client_message(
    text: &str,
    connection_id: ConnectionId,
    player: EntityId,
    world: &mpsc::UnboundedSender<WorldInput>,
    security: &SecurityConfig,
) -> Result<(), RoutingError> {
    let fields = validate_frame(text, security).map_err(|e| {
        debug!("Rejected frame from connection {}: {}", connection_id, e);
        e
    })?;

    trace!("📨 Connection {} -> world: {}", connection_id, text);

    world
        .send(WorldInput::Message { player, fields })
        .map_err(|_| RoutingError::WorldUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_frame_reaches_world() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        route_client_message("[11,\"hi\"]", 1, EntityId(3), &sender, &SecurityConfig::default())
            .unwrap();

        match receiver.try_recv().unwrap() {
            WorldInput::Message { player, fields } => {
                assert_eq!(player, EntityId(3));
                assert_eq!(fields, vec![json!(11), json!("hi")]);
            }
            _ => panic!("expected a message input"),
        }
    }

    #[test]
    fn test_invalid_frame_is_rejected() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let err = route_client_message("not json", 1, EntityId(3), &sender, &SecurityConfig::default())
            .unwrap_err();

        assert!(matches!(err, RoutingError::Rejected(SecurityError::InvalidJson)));
        assert_eq!(err.to_string(), "Received message was not valid JSON.");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_stopped_world_is_reported() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let err = route_client_message("[4,1,1]", 1, EntityId(3), &sender, &SecurityConfig::default())
            .unwrap_err();
        assert!(matches!(err, RoutingError::WorldUnavailable));
    }
}
