//! Connection handling logic for WebSocket clients.
//!
//! This module contains the core connection handling logic that manages
//! the lifecycle of individual client connections, including WebSocket
//! handshaking, message processing, and cleanup.

use crate::{
    config::SecurityConfig,
    connection::{ConnectionManager, WsConnection},
    error::ServerError,
    messaging::{route_client_message, RoutingError},
    server::WorldInput,
};
use futures_util::{SinkExt, StreamExt};
use realm_world::Connection;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info};

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform WebSocket handshake
/// 2. Register connection with the connection manager
/// 3. Hand the world a [`WsConnection`] and wait for its session id
/// 4. Start message handling tasks (incoming and outgoing)
/// 5. Handle connection termination and cleanup
/// 6. Tell the world the session is gone
///
/// # Arguments
///
/// * `stream` - The TCP stream for the client connection
/// * `addr` - The remote address of the client
/// * `connection_manager` - Manager for tracking connections
/// * `world` - Inbox of the world task
/// * `security` - Limits applied to every inbound frame
///
/// # Returns
///
/// `Ok(())` if the connection was handled successfully, or a `ServerError`
/// if there was a failure during connection handling.
///
/// # Message Handling
///
/// The function runs two concurrent tasks:
///
/// * **Incoming Task**: Receives frames from the client and routes them to the world
/// * **Outgoing Task**: Writes the frames the world queued for this client
///
/// These tasks run until the connection is closed by either side.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    world: mpsc::UnboundedSender<WorldInput>,
    security: SecurityConfig,
) -> Result<(), ServerError> {
    // Perform WebSocket handshake
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let connection_id = connection_manager.add_connection(addr).await;

    let (outgoing_sender, mut outgoing_receiver) = mpsc::unbounded_channel();
    let (reply, answer) = oneshot::channel();
    let connect = WorldInput::Connect {
        connection: Box::new(WsConnection::new(connection_id, outgoing_sender.clone())),
        reply,
    };
    if world.send(connect).is_err() {
        connection_manager.remove_connection(connection_id).await;
        return Err(ServerError::Internal("World task is not running".to_string()));
    }
    let player = answer.await.ok().flatten();
    match player {
        Some(player) => connection_manager.set_player_id(connection_id, player).await,
        None => debug!("World refused connection {}", connection_id),
    }

    // Incoming message task - routes validated frames to the world
    let incoming_task = {
        let world = world.clone();
        let closer = WsConnection::new(connection_id, outgoing_sender.clone());

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let Some(player) = player else {
                            continue;
                        };
                        match route_client_message(&text, connection_id, player, &world, &security) {
                            Ok(()) => {}
                            Err(RoutingError::Rejected(e)) => {
                                info!("Closing connection {}: {}", connection_id, e);
                                closer.close(&e.to_string());
                            }
                            Err(RoutingError::WorldUnavailable) => {
                                error!("World is gone, dropping connection {}", connection_id);
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = outgoing_sender.send(Message::Pong(data));
                    }
                    Err(e) => {
                        error!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Outgoing message task - ends after a close frame went out
    let outgoing_task = async move {
        while let Some(message) = outgoing_receiver.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = ws_sender.send(message).await {
                debug!("Failed to send message to connection {}: {}", connection_id, e);
                break;
            }
            if closing {
                break;
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    if let Some(player) = player {
        // A world that already stopped has nothing left to clean up.
        let _ = world.send(WorldInput::Disconnect { player });
    }
    connection_manager.remove_connection(connection_id).await;
    Ok(())
}
