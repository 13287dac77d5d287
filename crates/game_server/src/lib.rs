//! # Game Server - WebSocket Host for a Realm World
//!
//! Networking and runtime for a realm server. The simulation itself lives in
//! [`realm_world`]; this crate puts one world on the network and keeps it
//! ticking.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Accept Loop** - Admits WebSocket clients up to `max_connections`
//! * **Connection Manager** - Tracks open sockets and the world session each drives
//! * **Frame Validation** - Rejects oversized or malformed frames before the world sees them
//! * **World Task** - The single owner of the [`realm_world::World`], ticked on a fixed interval
//!
//! ### Message Flow
//!
//! 1. Client sends a text frame holding a JSON array, e.g. `[4, 12, 7]`
//! 2. The connection handler validates the frame against [`SecurityConfig`]
//! 3. The fields are queued in the world task's inbox
//! 4. The world handles the message and queues notifications for clients
//! 5. Each tick the world flushes one batch per client through its
//!    [`WsConnection`](connection::WsConnection), an unbounded channel drained
//!    by the client's outgoing task
//!
//! ## Configuration
//!
//! The server can be configured through the [`ServerConfig`] struct:
//!
//! * **Network settings** - Bind address and connection limit
//! * **World** - Map path and [`realm_world::WorldConfig`] tunables
//! * **Security** - Frame size, nesting and collection limits
//!
//! ## Error Handling
//!
//! The server uses structured error types ([`ServerError`]) to categorize failures:
//!
//! * **Network errors** - Binding and handshake failures
//! * **Map errors** - The world map could not be loaded
//! * **Internal errors** - The world task stopped or the world config is invalid
//!
//! ## Thread Safety
//!
//! * Connection management uses `Arc<RwLock<HashMap>>` for thread-safe state
//! * The world is never shared: only the world task touches it, everything
//!   else talks to it through channels
//! * Shutdown is coordinated through [`ShutdownState`] and a broadcast channel

// Re-export core types and functions for easy access
pub use config::{SecurityConfig, ServerConfig};
pub use error::ServerError;
pub use server::GameServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config, create_server_with_map};

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod utils;

// Internal modules (not part of public API)
mod messaging;
mod tests;
