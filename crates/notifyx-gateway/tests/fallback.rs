//! Loopback tests: drive the client against a local stub gateway and verify
//! the ordered-fallback behavior plus the per-operation winner memo.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use notifyx_gateway::GatewayClient;

#[derive(Clone)]
struct StubState {
    requests: Arc<AtomicUsize>,
    /// When set, the `/message/sendText` endpoint rejects every body shape.
    break_send_text: Arc<AtomicBool>,
}

async fn send_text_stub(
    State(state): State<StubState>,
    Path(_instance): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if headers.get("apikey").is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "missing apikey"})));
    }
    if state.break_send_text.load(Ordering::SeqCst) {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "endpoint disabled"})));
    }

    // only the simplified `{number, text}` body is understood
    if body.get("textMessage").is_some() || body.get("to").is_some() {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "unknown payload format"})));
    }
    if body.get("number").is_some() && body.get("text").is_some() {
        return (StatusCode::OK, Json(json!({"key": {"id": "stub-message-1"}})));
    }
    (StatusCode::BAD_REQUEST, Json(json!({"message": "unknown payload format"})))
}

async fn alt_text_stub(
    State(state): State<StubState>,
    Path(_instance): Path<String>,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({"messageId": "alt-message-1"})))
}

async fn start_stub(state: StubState) -> SocketAddr {
    let app = Router::new()
        .route("/message/sendText/{instance}", post(send_text_stub))
        .route("/message/text/{instance}", post(alt_text_stub))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn falls_back_to_the_first_working_shape_and_memoizes_it() {
    let state = StubState {
        requests: Arc::new(AtomicUsize::new(0)),
        break_send_text: Arc::new(AtomicBool::new(false)),
    };
    let addr = start_stub(state.clone()).await;
    let client = GatewayClient::new(format!("http://{addr}"), "test-key");

    // shape 0 (long form) fails, shape 1 (simplified) wins
    let receipt = client.send_text("main", "5511999", "hello").await.unwrap();
    assert_eq!(receipt.message_id, "stub-message-1");
    assert_eq!(state.requests.load(Ordering::SeqCst), 2);

    // the winner is memoized: the next send goes straight to shape 1
    client.send_text("main", "5511999", "again").await.unwrap();
    assert_eq!(state.requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn revalidates_after_the_cached_shape_stops_working() {
    let state = StubState {
        requests: Arc::new(AtomicUsize::new(0)),
        break_send_text: Arc::new(AtomicBool::new(false)),
    };
    let addr = start_stub(state.clone()).await;
    let client = GatewayClient::new(format!("http://{addr}"), "test-key");

    client.send_text("main", "5511999", "hello").await.unwrap();
    assert_eq!(state.requests.load(Ordering::SeqCst), 2);

    // the previously winning endpoint goes away; the client must retry the
    // whole preference order and land on the alternate endpoint
    state.break_send_text.store(true, Ordering::SeqCst);
    let receipt = client.send_text("main", "5511999", "hello").await.unwrap();
    assert_eq!(receipt.message_id, "alt-message-1");

    // cached shape + shapes 0..2 of the retry walk = 4 more requests
    assert_eq!(state.requests.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn jid_suffix_is_stripped_before_the_gateway_sees_the_number() {
    let state = StubState {
        requests: Arc::new(AtomicUsize::new(0)),
        break_send_text: Arc::new(AtomicBool::new(false)),
    };
    let addr = start_stub(state.clone()).await;
    let client = GatewayClient::new(format!("http://{addr}"), "test-key");

    let receipt = client
        .send_text("main", "5511999@s.whatsapp.net", "hello")
        .await
        .unwrap();
    assert_eq!(receipt.message_id, "stub-message-1");
}
