//! The world task.
//!
//! A single task owns the [`World`] and is the only code that touches it.
//! Connection handlers talk to it through an unbounded inbox of
//! [`WorldInput`]s; between inputs the task ticks the world on a fixed
//! interval and reports the events the world raised.

use crate::shutdown::ShutdownState;
use realm_world::{Connection, EntityId, World, WorldEvent};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Requests connection handlers send to the world task.
pub enum WorldInput {
    /// A client finished its WebSocket handshake. The reply carries the
    /// session id, or `None` when the world refused the client.
    Connect {
        connection: Box<dyn Connection>,
        reply: oneshot::Sender<Option<EntityId>>,
    },

    /// A validated message from a session.
    Message { player: EntityId, fields: Vec<Value> },

    /// The client's socket is gone.
    Disconnect { player: EntityId },
}

/// Drives `world` until shutdown and hands it back once stopped.
///
/// # Arguments
///
/// * `world` - The simulation to run
/// * `inbox` - Inputs from connection handlers
/// * `shutdown` - Internal shutdown signal of the server
/// * `shutdown_state` - Optional process wide shutdown state
///
/// The task stops when shutdown is initiated, the shutdown signal fires or
/// every sender of the inbox is dropped.
pub async fn run_world(
    mut world: World,
    mut inbox: mpsc::UnboundedReceiver<WorldInput>,
    mut shutdown: broadcast::Receiver<()>,
    shutdown_state: Option<ShutdownState>,
) -> World {
    let tick_ms = world.config().tick_ms();
    let mut ticker = interval(Duration::from_millis(tick_ms));
    info!("🕒 World tick started with interval: {}ms", tick_ms);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if shutdown_state.as_ref().is_some_and(|s| s.is_shutdown_initiated()) {
                    info!("🕒 World tick stopping - shutdown initiated");
                    break;
                }
                world.update();
            }
            input = inbox.recv() => {
                let Some(input) = input else {
                    info!("🕒 World tick stopping - no more connection handlers");
                    break;
                };
                apply_input(&mut world, input);
            }
            _ = shutdown.recv() => {
                info!("🕒 World tick stopping - shutdown signal received");
                break;
            }
        }

        report_events(world.drain_events());
    }

    info!("✅ World loop completed gracefully with {} player(s) online", world.player_count());
    world
}

fn apply_input(world: &mut World, input: WorldInput) {
    match input {
        WorldInput::Connect { connection, reply } => {
            let player = world.connect(connection);
            if reply.send(player).is_err() {
                // The handler gave up before the world answered.
                if let Some(player) = player {
                    world.disconnect(player);
                }
            }
        }
        WorldInput::Message { player, fields } => world.handle_message(player, fields),
        WorldInput::Disconnect { player } => world.disconnect(player),
    }
}

fn report_events(events: Vec<WorldEvent>) {
    for event in events {
        match event {
            WorldEvent::PlayerEntered { player, name } => {
                info!("👋 Player {} entered the world as {}", player, name);
            }
            WorldEvent::PlayerRemoved { player } => {
                info!("👋 Player {} left the world", player);
            }
            WorldEvent::ConnectionClosed { player, reason } => {
                info!("🔌 Closed session {}: {}", player, reason);
            }
            WorldEvent::PopulationChanged { population } => {
                debug!("👥 Population is now {}", population);
            }
            WorldEvent::Message { player, action, fields } => {
                debug!("📭 No handler for action {} from {}: {:?}", action, player, fields);
            }
        }
    }
}
