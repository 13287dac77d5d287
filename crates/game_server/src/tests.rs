// Include tests
#[cfg(test)]
mod tests {
    use crate::*;
    use futures::{SinkExt, StreamExt};
    use realm_world::Map;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    const TEST_MAP: &str = r#"{
        "width": 56,
        "height": 24,
        "collisions": [],
        "checkpoints": [{"id": 1, "x": 10, "y": 10, "w": 1, "h": 1, "s": 1}]
    }"#;

    fn test_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.bind_address = "127.0.0.1:0".parse().unwrap();
        config.world.rng_seed = Some(5);
        config
    }

    async fn start(config: ServerConfig) -> (String, ShutdownState, JoinHandle<Result<(), ServerError>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let server = Arc::new(create_server_with_map(config, Map::from_json(TEST_MAP).unwrap()));
        let state = ShutdownState::new();
        let server_state = state.clone();
        let handle = tokio::spawn(async move { server.serve(listener, Some(server_state)).await });
        (url, state, handle)
    }

    async fn next_message(client: &mut Client) -> Message {
        timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for the server")
            .expect("stream ended")
            .expect("websocket error")
    }

    async fn next_text(client: &mut Client) -> serde_json::Value {
        loop {
            match next_message(client).await {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("expected text, got {:?}", other),
            }
        }
    }

    async fn stop(state: ShutdownState, handle: JoinHandle<Result<(), ServerError>>) {
        state.initiate_shutdown();
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        assert!(state.is_shutdown_complete());
    }

    #[test]
    fn test_core_server_creation() {
        let server = create_server();
        assert_eq!(server.config().max_connections, 1000);

        let config = ServerConfig {
            max_connections: 5,
            ..Default::default()
        };
        let server = create_server_with_config(config);
        assert_eq!(server.config().max_connections, 5);

        let server = create_server_with_map(test_config(), Map::from_json(TEST_MAP).unwrap());
        assert_eq!(server.config().world.rng_seed, Some(5));
        assert_eq!(server.config().world.updates_per_second, 50);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_map_fails_startup() {
        let mut config = test_config();
        config.map_path = "does/not/exist.json".into();
        let server = GameServer::new(config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = server.serve(listener, None).await;
        assert!(matches!(result, Err(ServerError::Map(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_enters_world() {
        let (url, state, handle) = start(test_config()).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();

        assert_eq!(next_message(&mut client).await, Message::Text("go".to_string().into()));

        client
            .send(Message::Text(r#"[0,"bob",21,60]"#.to_string().into()))
            .await
            .unwrap();
        let welcome = next_text(&mut client).await;
        assert_eq!(welcome[0], 1);
        assert_eq!(welcome[2], "bob");
        assert_eq!(welcome[5], 80);

        // The first batch carries the population notice.
        let batch = next_text(&mut client).await;
        let messages = batch.as_array().unwrap();
        assert!(messages.contains(&serde_json::json!([17, 1, 1])));

        client.close(None).await.unwrap();
        stop(state, handle).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_json_closes_connection() {
        let (url, state, handle) = start(test_config()).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut client).await;

        client.send(Message::Text("{nope".to_string().into())).await.unwrap();
        match next_message(&mut client).await {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.reason.as_str(), "Received message was not valid JSON.");
            }
            other => panic!("expected a close frame, got {:?}", other),
        }

        stop(state, handle).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_handshake_violation_closes_connection() {
        let (url, state, handle) = start(test_config()).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut client).await;

        client.send(Message::Text("[4,6,6]".to_string().into())).await.unwrap();
        match next_message(&mut client).await {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.reason.as_str(), "Invalid handshake message: 4,6,6");
            }
            other => panic!("expected a close frame, got {:?}", other),
        }

        stop(state, handle).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_world_refuses_players() {
        let mut config = test_config();
        config.world.max_players = 1;
        let (url, state, handle) = start(config).await;

        let (mut first, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut first).await;

        let (mut second, _) = connect_async(url.as_str()).await.unwrap();
        match next_message(&mut second).await {
            Message::Close(Some(frame)) => assert_eq!(frame.reason.as_str(), "World is full"),
            other => panic!("expected a close frame, got {:?}", other),
        }

        stop(state, handle).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_limit_refuses_sockets() {
        let mut config = test_config();
        config.max_connections = 1;
        let (url, state, handle) = start(config).await;

        let (mut first, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut first).await;

        let second = timeout(Duration::from_secs(2), connect_async(url.as_str()))
            .await
            .expect("refusal took too long");
        assert!(second.is_err());

        stop(state, handle).await;
    }
}
