//! Outbound side of a client connection as seen by the world.

use serde_json::Value;

/// Handle the world uses to reach one client.
///
/// Implementations must not block: the world calls these from its single
/// simulation thread and expects them to hand the data off and return.
pub trait Connection: Send {
    /// Sends one message, or a batch as an array of messages.
    fn send(&self, payload: Value);

    /// Sends a bare text frame.
    fn send_raw(&self, text: &str);

    /// Closes the connection, telling the client why.
    fn close(&self, reason: &str);
}
