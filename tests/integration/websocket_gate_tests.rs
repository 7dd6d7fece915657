//! WebSocket gate integration tests
//!
//! A real server on a loopback port with a real client, so the JSON notices
//! and the 1008 close frame are checked on the wire.

#[cfg(test)]
mod tests {
    use crate::common::TestGateway;
    use crate::common::fixtures::websocket_config;
    use actix_web::{HttpServer, web};
    use futures::{SinkExt, StreamExt};
    use ratelimit_gateway::server::create_app;
    use ratelimit_gateway::storage::CounterStore;
    use serde_json::Value;
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Start of a 10s window
    const WS_NOW: u64 = 1_000_030;

    async fn start_server(gateway: &TestGateway) -> (String, actix_web::dev::ServerHandle) {
        let state = web::Data::new(gateway.state());
        let server = HttpServer::new(move || create_app(state.clone()))
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("ws://{}/ws", addr), handle)
    }

    async fn connect(url: &str, principal: &str) -> Client {
        let mut request = url.into_client_request().unwrap();
        request
            .headers_mut()
            .insert("x-principal-id", principal.parse().unwrap());
        let (client, _) = connect_async(request).await.unwrap();
        client
    }

    async fn send_text(client: &mut Client) -> Message {
        client.send(Message::Text("hello".into())).await.unwrap();
        client.next().await.unwrap().unwrap()
    }

    fn notice(message: Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text notice, got {:?}", other),
        }
    }

    /// Over quota once: warned. Over quota again in the next window: closed with 1008
    #[actix_web::test]
    async fn test_warn_then_close_on_the_wire() {
        let gateway = TestGateway::with_config(websocket_config(3), WS_NOW);
        let (url, handle) = start_server(&gateway).await;
        let mut client = connect(&url, "chatty").await;

        for _ in 0..3 {
            assert_eq!(notice(send_text(&mut client).await)["type"], "ack");
        }
        let warning = notice(send_text(&mut client).await);
        assert_eq!(warning["type"], "rate_limit_exceeded");
        assert_eq!(warning["retry_after"], 10);

        gateway.clock.advance(10);
        for _ in 0..3 {
            assert_eq!(notice(send_text(&mut client).await)["type"], "ack");
        }
        match send_text(&mut client).await {
            Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1008),
            other => panic!("expected a policy close, got {:?}", other),
        }

        handle.stop(true).await;
    }

    /// Messages sent while throttled are dropped without a reply or a count
    #[actix_web::test]
    async fn test_throttled_messages_are_dropped_silently() {
        let gateway = TestGateway::with_config(websocket_config(3), WS_NOW);
        let (url, handle) = start_server(&gateway).await;
        let mut client = connect(&url, "quiet").await;

        for _ in 0..3 {
            send_text(&mut client).await;
        }
        assert_eq!(
            notice(send_text(&mut client).await)["type"],
            "rate_limit_exceeded"
        );

        for _ in 0..5 {
            client.send(Message::Text("ignored".into())).await.unwrap();
        }
        // The pong is the very next frame, so nothing answered the drops.
        client.send(Message::Ping(b"sync".to_vec())).await.unwrap();
        match client.next().await.unwrap().unwrap() {
            Message::Pong(payload) => assert_eq!(payload, b"sync".to_vec()),
            other => panic!("expected pong, got {:?}", other),
        }

        let key = "rl:websocket:message:quiet:10:1000030";
        assert_eq!(gateway.store.read(key).await.unwrap(), 4);

        client.close(None).await.unwrap();
        handle.stop(true).await;
    }

    /// Each connection of a principal draws from the same message budget
    #[actix_web::test]
    async fn test_connections_share_the_principal_budget() {
        let gateway = TestGateway::with_config(websocket_config(3), WS_NOW);
        let (url, handle) = start_server(&gateway).await;
        let mut first = connect(&url, "multi-tab").await;
        let mut second = connect(&url, "multi-tab").await;

        assert_eq!(notice(send_text(&mut first).await)["type"], "ack");
        assert_eq!(notice(send_text(&mut second).await)["type"], "ack");
        assert_eq!(notice(send_text(&mut first).await)["type"], "ack");
        assert_eq!(
            notice(send_text(&mut second).await)["type"],
            "rate_limit_exceeded"
        );

        handle.stop(true).await;
    }
}
