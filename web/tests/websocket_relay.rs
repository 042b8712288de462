use clap::Parser;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use service::{config::Config, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let config = Config::parse_from(["messaging_relay"]);
    let relay = service::init_relay(&config);
    let app_state = AppState::new(config, &relay);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(web::serve(listener, app_state));
    addr
}

async fn connect_with_header(addr: SocketAddr, name: &str) -> Client {
    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("name", HeaderValue::from_str(name).unwrap());
    let (client, _) = connect_async(request).await.unwrap();
    client
}

async fn connect_with_query(addr: SocketAddr, name: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws?name={name}"))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::text(frame.to_string())).await.unwrap();
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if message.is_text() {
            return serde_json::from_str(message.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_alice_and_bob_exchange_messages() {
    let addr = start_server().await;
    let mut alice = connect_with_header(addr, "alice").await;
    let mut bob = connect_with_query(addr, "bob").await;

    send(&mut alice, json!({"type": "send_to", "to": "bob", "body": "hi"})).await;
    assert_eq!(next_json(&mut bob).await, json!({"from": "alice", "body": "hi"}));

    send(&mut alice, json!({"type": "send_to", "to": "carol", "body": "hi"})).await;
    assert_eq!(
        next_json(&mut alice).await,
        json!({"type": "error", "reason": "recipient_offline", "recipient": "carol"})
    );

    send(&mut alice, json!({"type": "broadcast", "body": "hello all"})).await;
    assert_eq!(
        next_json(&mut alice).await,
        json!({"from": "alice", "body": "hello all"})
    );
    assert_eq!(
        next_json(&mut bob).await,
        json!({"from": "alice", "body": "hello all"})
    );
}

#[tokio::test]
async fn test_handshake_without_identity_is_rejected() {
    let addr = start_server().await;

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 401),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("connection without identity must be rejected"),
    }
}

#[tokio::test]
async fn test_messages_from_one_connection_arrive_in_order() {
    let addr = start_server().await;
    let mut alice = connect_with_header(addr, "alice").await;
    let mut bob = connect_with_header(addr, "bob").await;

    for n in 0..20 {
        send(&mut alice, json!({"type": "send_to", "to": "bob", "body": format!("m{n}")})).await;
    }

    for n in 0..20 {
        assert_eq!(next_json(&mut bob).await["body"], format!("m{n}"));
    }
}

#[tokio::test]
async fn test_every_device_of_a_recipient_receives_the_message() {
    let addr = start_server().await;
    let mut alice = connect_with_header(addr, "alice").await;
    let mut phone = connect_with_header(addr, "bob").await;
    let mut laptop = connect_with_header(addr, "bob").await;

    send(&mut alice, json!({"type": "send_to", "to": "bob", "body": "ping"})).await;

    assert_eq!(next_json(&mut phone).await["body"], "ping");
    assert_eq!(next_json(&mut laptop).await["body"], "ping");
}

#[tokio::test]
async fn test_disconnected_recipient_goes_offline() {
    let addr = start_server().await;
    let mut alice = connect_with_header(addr, "alice").await;
    let mut bob = connect_with_header(addr, "bob").await;

    bob.close(None).await.unwrap();
    drop(bob);

    // Teardown is asynchronous on the server side; poll until it lands.
    let mut reason = Value::Null;
    for _ in 0..50 {
        send(&mut alice, json!({"type": "send_to", "to": "bob", "body": "still there?"})).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Ok(Some(Ok(message))) = timeout(Duration::from_millis(50), alice.next()).await {
            let frame: Value = serde_json::from_str(message.to_text().unwrap()).unwrap();
            if frame["type"] == "error" {
                reason = frame["reason"].clone();
                break;
            }
        }
    }
    assert_eq!(reason, "recipient_offline");
}

#[tokio::test]
async fn test_malformed_frame_gets_a_notice() {
    let addr = start_server().await;
    let mut alice = connect_with_header(addr, "alice").await;

    alice.send(Message::text("not json".to_string())).await.unwrap();

    assert_eq!(
        next_json(&mut alice).await,
        json!({"type": "error", "reason": "malformed_frame"})
    );
}
