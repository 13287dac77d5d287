//! Error types for the world simulation.
//!
//! Nothing in here is fatal to the simulation itself. Protocol errors end
//! a single player's connection and map errors stop a world from being
//! built in the first place.

use serde_json::Value;

/// Reasons for closing a player connection.
///
/// The `Display` text is sent to the client as the close reason.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// The message did not match the field layout of its type
    #[error("Invalid {message_type} message format: {payload}")]
    InvalidFormat {
        message_type: &'static str,
        payload: String,
    },

    /// The first message of a session was not a HELLO
    #[error("Invalid handshake message: {payload}")]
    InvalidHandshake { payload: String },

    /// A HELLO arrived while the player was alive in the world
    #[error("Cannot initiate handshake twice: {payload}")]
    RepeatedHandshake { payload: String },

    /// No message arrived before the idle deadline
    #[error("Player was idle for too long")]
    IdleTimeout,
}

/// Errors raised while building a world map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The map file could not be read
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    /// The map file is not valid map JSON
    #[error("Failed to parse map: {0}")]
    Parse(#[from] serde_json::Error),

    /// The map parsed but describes an unusable world
    #[error("Invalid map: {0}")]
    Invalid(String),
}

/// Renders message fields the way they are echoed in close reasons:
/// comma separated, strings unquoted, nested arrays flattened.
pub fn echo_payload(fields: &[Value]) -> String {
    fields.iter().map(echo_value).collect::<Vec<_>>().join(",")
}

fn echo_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => echo_payload(items),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
