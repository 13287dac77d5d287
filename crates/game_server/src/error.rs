//! Error types and handling for the game server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes.

use realm_world::MapError;

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related, internal and startup failures
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors such as a world task that stopped responding
    #[error("Internal error: {0}")]
    Internal(String),

    /// The world map could not be loaded
    #[error("Map error: {0}")]
    Map(#[from] MapError),
}
