//! # Realm World - Entity Lifecycle and Interest Management
//!
//! The simulation core of a realm server: every entity of a world, the
//! spawn control areas that keep it populated, the zone groups that decide
//! who hears about what, the hostility of mobs and the protocol of player
//! sessions.
//!
//! The crate does no I/O. A host hands it client connections through the
//! [`Connection`] trait, feeds it decoded JSON messages and calls
//! [`World::update`] at the configured rate. Everything the world wants to
//! tell a client goes back through that client's connection.
//!
//! ## Key Types
//!
//! * [`World`] - orchestrator owning registries, groups and the scheduler
//! * [`Map`] - collision grid, checkpoints, doors and spawn layout
//! * [`WorldConfig`] - rates, delays and limits of a world
//! * [`WorldEvent`] - typed notices for the host (population, closes, ...)
//! * [`Message`] / [`Command`] - outbound notifications and inbound commands
//!
//! ## Usage
//!
//! ```rust,no_run
//! use realm_world::{Map, World, WorldConfig};
//!
//! # fn main() -> Result<(), realm_world::MapError> {
//! let map = Map::load("maps/world_server.json")?;
//! let mut world = World::new(WorldConfig::default(), map);
//! world.update();
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! A [`World`] is driven from one thread. Connections must not block; they
//! queue outbound data for the transport and return.

pub mod area;
pub mod checkpoint;
pub mod command;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod events;
pub mod format;
pub mod formulas;
pub mod item;
pub mod kinds;
pub mod map;
pub mod message;
pub mod mob;
pub mod npc;
pub mod player;
pub mod sanitize;
pub mod scheduler;
pub mod timer;
pub mod types;
pub mod world;
pub mod zones;

pub use command::Command;
pub use config::WorldConfig;
pub use connection::Connection;
pub use error::{MapError, ProtocolError};
pub use events::WorldEvent;
pub use kinds::Kind;
pub use map::Map;
pub use message::{Message, MessageType};
pub use types::{EntityId, EntityType, Orientation, Position};
pub use world::World;
