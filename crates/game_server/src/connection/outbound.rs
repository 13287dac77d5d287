//! The world's handle on a WebSocket client.
//!
//! [`WsConnection`] implements [`realm_world::Connection`] by pushing
//! frames into an unbounded channel drained by the connection's outgoing
//! task, so the world never waits on a socket.

use super::ConnectionId;
use realm_world::Connection;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::trace;

/// Outbound side of one client connection.
#[derive(Debug, Clone)]
pub struct WsConnection {
    connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<Message>,
}

impl WsConnection {
    pub fn new(connection_id: ConnectionId, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { connection_id, sender }
    }

    fn enqueue(&self, message: Message) {
        // The outgoing task is gone once the socket closed; late frames are dropped.
        if self.sender.send(message).is_err() {
            trace!("Dropping frame for closed connection {}", self.connection_id);
        }
    }
}

impl Connection for WsConnection {
    fn send(&self, payload: Value) {
        self.enqueue(Message::Text(payload.to_string().into()));
    }

    fn send_raw(&self, text: &str) {
        self.enqueue(Message::Text(text.to_string().into()));
    }

    fn close(&self, reason: &str) {
        self.enqueue(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_string().into(),
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frames_are_queued_in_order() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let connection = WsConnection::new(1, sender);

        connection.send_raw("go");
        connection.send(json!([[1, 5, "bob", 5, 5, 80]]));
        connection.close("World is full");

        assert_eq!(receiver.try_recv().unwrap(), Message::Text("go".to_string().into()));
        assert_eq!(
            receiver.try_recv().unwrap(),
            Message::Text(r#"[[1,5,"bob",5,5,80]]"#.to_string().into())
        );
        match receiver.try_recv().unwrap() {
            Message::Close(Some(frame)) => assert_eq!(frame.reason.as_str(), "World is full"),
            other => panic!("expected a close frame, got {:?}", other),
        }
    }

    #[test]
    fn test_send_after_receiver_dropped_is_ignored() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let connection = WsConnection::new(2, sender);
        connection.send(json!([17, 1, 1]));
        connection.close("bye");
    }
}
