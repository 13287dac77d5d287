//! Factory functions for realm servers.
//!
//! A server either reads its map from `ServerConfig::map_path` when it
//! starts, or hosts a [`Map`] the caller already loaded.

use crate::{config::ServerConfig, server::GameServer};
use realm_world::Map;

/// Server on `127.0.0.1:8000` hosting `maps/world_server.json`.
///
/// The world ticks 50 times per second and admits 200 players; the map is
/// only read once the server is started.
pub fn create_server() -> GameServer {
    GameServer::new(ServerConfig::default())
}

/// Server driven entirely by `config`.
///
/// # Example
///
/// ```rust,no_run
/// use game_server::{create_server_with_config, ServerConfig};
///
/// let mut config = ServerConfig::default();
/// config.map_path = "maps/small.json".into();
/// config.world.updates_per_second = 20;
/// config.world.max_players = 32;
///
/// let server = create_server_with_config(config);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> GameServer {
    GameServer::new(config)
}

/// Server hosting `map` instead of the file named by `config.map_path`.
///
/// Useful when the map is generated or embedded.
///
/// # Example
///
/// ```rust,no_run
/// use game_server::{create_server_with_map, ServerConfig};
/// use realm_world::Map;
///
/// # fn main() -> Result<(), realm_world::MapError> {
/// let map = Map::from_json(r#"{ "width": 56, "height": 24 }"#)?;
/// let server = create_server_with_map(ServerConfig::default(), map);
/// # Ok(())
/// # }
/// ```
pub fn create_server_with_map(config: ServerConfig, map: Map) -> GameServer {
    GameServer::with_map(config, map)
}
