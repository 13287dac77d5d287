//! Core game server implementation.
//!
//! This module contains the main `GameServer` struct and its implementation,
//! tying together the accept loop, the connection registry and the world
//! task that owns the simulation.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::handlers::handle_connection,
    server::world_task::{run_world, WorldInput},
    shutdown::ShutdownState,
};
use realm_world::{Map, World};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

/// The core game server structure.
///
/// `GameServer` hosts one world over WebSocket. Every accepted client gets
/// a connection handler; all handlers feed a single world task which owns
/// the [`World`] and ticks it at the configured rate.
///
/// # Architecture
///
/// * **Accept Loop**: Admits clients up to `max_connections`
/// * **Connection Management**: Tracks open sockets and their world sessions
/// * **World Task**: Sole owner of the simulation, driven by an inbox and a ticker
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Manager for client connections
    connection_manager: Arc<ConnectionManager>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,

    /// Map to host instead of the one at `config.map_path`
    map: Option<Map>,
}

impl GameServer {
    /// Creates a new game server with the specified configuration.
    ///
    /// The world map is read from `config.map_path` when the server starts.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration parameters for server behavior
    ///
    /// # Returns
    ///
    /// A new `GameServer` instance ready to be started.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        Self {
            config,
            connection_manager: Arc::new(ConnectionManager::new()),
            shutdown_sender,
            map: None,
        }
    }

    /// Creates a game server hosting an already loaded map.
    pub fn with_map(config: ServerConfig, map: Map) -> Self {
        Self {
            map: Some(map),
            ..Self::new(config)
        }
    }

    /// Starts the game server and begins accepting connections with graceful shutdown support.
    ///
    /// The server runs until shutdown is requested through the provided
    /// shutdown state or [`GameServer::shutdown`].
    ///
    /// # Arguments
    ///
    /// * `shutdown_state` - Shared shutdown state for coordinating graceful shutdown
    ///
    /// # Returns
    ///
    /// `Ok(())` if the server started and stopped cleanly, or a `ServerError`
    /// if the map could not be loaded or the address could not be bound.
    pub async fn start_with_shutdown_state(&self, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the game server and begins accepting connections.
    ///
    /// # Startup Sequence
    ///
    /// 1. Load the world map and build the world
    /// 2. Bind the TCP listener
    /// 3. Start the world task
    /// 4. Accept connections until shutdown
    ///
    /// # Returns
    ///
    /// `Ok(())` if the server started and stopped cleanly, or a `ServerError`
    /// if there was a failure during startup or operation.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting game server on {}", self.config.bind_address);

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address)))?;

        self.serve(listener, shutdown_state).await
    }

    /// Runs the server on an already bound listener.
    ///
    /// Useful when the caller needs the bound address up front, for example
    /// when listening on port 0.
    pub async fn serve(&self, listener: TcpListener, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        let world = self.build_world()?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        info!("🌍 World {} ready, listening on {}", self.config.world.id, local_addr);

        let (world_sender, world_inbox) = mpsc::unbounded_channel::<WorldInput>();
        let world_task = tokio::spawn(run_world(
            world,
            world_inbox,
            self.shutdown_sender.subscribe(),
            shutdown_state.clone(),
        ));

        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let accept_loop = async {
            loop {
                // Check if shutdown has been initiated
                if let Some(ref shutdown_state) = shutdown_state {
                    if shutdown_state.is_shutdown_initiated() {
                        info!("🛑 Accept loop stopping - shutdown initiated");
                        break;
                    }
                }

                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let open = self.connection_manager.connection_count().await;
                        if open >= self.config.max_connections {
                            warn!("🚫 Refusing {} - {} connections open", addr, open);
                            drop(stream);
                            continue;
                        }

                        let connection_manager = self.connection_manager.clone();
                        let world_sender = world_sender.clone();
                        let security = self.config.security.clone();

                        // Spawn individual connection handler
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, addr, connection_manager, world_sender, security).await
                            {
                                error!("Connection error: {:?}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        break;
                    }
                }
            }
        };

        // Run until shutdown is initiated or internal shutdown signal
        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_receiver.recv() => {
                info!("Internal shutdown signal received");
            }
            _ = Self::wait_for_shutdown(shutdown_state.clone()) => {}
        }

        // Server shutdown cleanup
        info!("🧹 Performing server cleanup...");
        let _ = self.shutdown_sender.send(());
        drop(world_sender);
        match world_task.await {
            Ok(world) => info!("🌍 World stopped with {} player(s) online", world.player_count()),
            Err(e) => error!("World task failed: {}", e),
        }
        if let Some(shutdown_state) = shutdown_state {
            shutdown_state.complete_shutdown();
        }

        info!("✅ Server cleanup completed");
        Ok(())
    }

    fn build_world(&self) -> Result<World, ServerError> {
        self.config.world.validate().map_err(ServerError::Internal)?;
        let map = match &self.map {
            Some(map) => map.clone(),
            None => {
                info!("🗺️ Loading map from: {}", self.config.map_path.display());
                Map::load(&self.config.map_path)?
            }
        };
        Ok(World::new(self.config.world.clone(), map))
    }

    /// Polls the shared shutdown state; never resolves without one.
    async fn wait_for_shutdown(shutdown_state: Option<ShutdownState>) {
        let Some(shutdown_state) = shutdown_state else {
            return std::future::pending().await;
        };
        let mut poll = tokio::time::interval(tokio::time::Duration::from_millis(100));
        while !shutdown_state.is_shutdown_initiated() {
            poll.tick().await;
        }
    }

    /// Initiates server shutdown.
    ///
    /// Signals the accept loop and the world task to stop.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the shutdown signal was sent successfully.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    /// Gets the connection manager.
    pub fn get_connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    /// Gets the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
