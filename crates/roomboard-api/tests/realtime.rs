mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roomboard_api::{AppState, router};
use roomboard_gateway::BroadcastScope;

use common::*;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, room_id: &str) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/{}", addr, room_id))
        .await
        .unwrap();
    ws
}

async fn wait_for_subscribers(state: &AppState, expected: usize) {
    for _ in 0..200 {
        if state.hub.subscriber_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} subscribers, have {}",
        expected,
        state.hub.subscriber_count().await
    );
}

/// Next text frame, skipping control frames.
async fn next_text(ws: &mut Client) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return text.as_str().to_string();
        }
    }
}

#[tokio::test]
async fn room_subscribers_get_created_and_update_tokens() {
    let state = test_state(BroadcastScope::Room);
    let addr = serve(state.clone()).await;
    let app = router(state.clone());

    let mut general = connect(addr, "general").await;
    let mut random = connect(addr, "random").await;
    wait_for_subscribers(&state, 2).await;

    let message = post_message(&app, "general", "hello").await;
    assert_eq!(next_text(&mut general).await, wire_id(&message));

    let id = message["id"].as_str().unwrap();
    vote(&app, id, "bob", "like").await;
    assert_eq!(next_text(&mut general).await, format!("update:{}", wire_id(&message)));

    // the other room only hears about its own messages
    let other = post_message(&app, "random", "psst").await;
    assert_eq!(next_text(&mut random).await, wire_id(&other));
}

#[tokio::test]
async fn global_scope_reaches_every_room() {
    let state = test_state(BroadcastScope::Global);
    let addr = serve(state.clone()).await;
    let app = router(state.clone());

    let mut general = connect(addr, "general").await;
    let mut random = connect(addr, "random").await;
    wait_for_subscribers(&state, 2).await;

    let message = post_message(&app, "general", "everyone hears this").await;
    assert_eq!(next_text(&mut general).await, wire_id(&message));
    assert_eq!(next_text(&mut random).await, wire_id(&message));
}

#[tokio::test]
async fn disconnected_client_is_unsubscribed() {
    let state = test_state(BroadcastScope::Room);
    let addr = serve(state.clone()).await;
    let app = router(state.clone());

    let mut leaving = connect(addr, "general").await;
    let mut staying = connect(addr, "general").await;
    wait_for_subscribers(&state, 2).await;

    leaving.close(None).await.unwrap();
    wait_for_subscribers(&state, 1).await;

    let message = post_message(&app, "general", "still here?").await;
    assert_eq!(next_text(&mut staying).await, wire_id(&message));
}

#[tokio::test]
async fn shutdown_closes_connections() {
    let state = test_state(BroadcastScope::Room);
    let addr = serve(state.clone()).await;

    let mut client = connect(addr, "general").await;
    wait_for_subscribers(&state, 1).await;

    assert_eq!(state.hub.close_all().await, 1);

    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}
