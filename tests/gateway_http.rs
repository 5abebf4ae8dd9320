//! Integration tests for the HTTP gateways.
//!
//! Each test spins up an Axum stub of the marketplace (or lookup) API on a
//! random port and exercises the real request/response contract.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;

use shop_responder::channels::signing::sign;
use shop_responder::channels::shopee::{GET_MESSAGE_PATH, SEND_MESSAGE_PATH};
use shop_responder::channels::{InstantAnswerLookup, ShopeeGateway};
use shop_responder::config::Credentials;
use shop_responder::error::GatewayError;
use shop_responder::pipeline::{
    InboundMessage, MessageGateway, MessageProcessor, Poller, ProductLookup, ReplySelector,
    ResponseCatalog, RulesEngine,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const PARTNER_ID: &str = "1001";
const SHOP_ID: &str = "2002";
const SECRET: &str = "shh";

/// Client timeout used against the stub; well under `TEST_TIMEOUT`.
const HTTP_TIMEOUT: Duration = Duration::from_millis(500);

/// How the stub marketplace answers.
#[derive(Clone, Copy)]
enum Mode {
    Ok,
    ApiError,
    ServerError,
}

#[derive(Clone)]
struct StubState {
    mode: Mode,
    sent: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn credentials() -> Credentials {
    Credentials {
        partner_id: PARTNER_ID.into(),
        api_key: SecretString::from("key"),
        secret_key: SecretString::from(SECRET),
        shop_id: SHOP_ID.into(),
    }
}

fn shopee(base: impl Into<String>) -> ShopeeGateway {
    ShopeeGateway::new(credentials(), base, HTTP_TIMEOUT).unwrap()
}

fn valid_sign(path: &str, params: &HashMap<String, String>) -> bool {
    let Some(timestamp) = params.get("timestamp").and_then(|t| t.parse::<i64>().ok()) else {
        return false;
    };
    params.get("partner_id").map(String::as_str) == Some(PARTNER_ID)
        && params.get("shop_id").map(String::as_str) == Some(SHOP_ID)
        && params.get("sign")
            == Some(&sign(PARTNER_ID, path, timestamp, &SecretString::from(SECRET)))
}

async fn get_message(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.queries.lock().unwrap().push(params.clone());
    if !valid_sign(GET_MESSAGE_PATH, &params) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "error_sign"})));
    }
    match state.mode {
        Mode::Ok => (
            StatusCode::OK,
            Json(json!({
                "data": [
                    {"id": "m-1", "content": "Qual o status do meu pedido?"},
                    {"id": 77, "content": "Quero solicitar reembolso"}
                ]
            })),
        ),
        Mode::ApiError => (
            StatusCode::OK,
            Json(json!({"error": "error_auth", "message": "shop not authorized"})),
        ),
        Mode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "internal"})),
        ),
    }
}

async fn send_message(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let params: HashMap<String, String> = body
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(String::from).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default();
    if !valid_sign(SEND_MESSAGE_PATH, &params) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "error_sign"})));
    }
    match state.mode {
        Mode::Ok => {
            state.sent.lock().unwrap().push(body);
            (StatusCode::OK, Json(json!({"request_id": "r-1"})))
        }
        Mode::ApiError => (
            StatusCode::OK,
            Json(json!({"error": "error_param", "message": "message too long"})),
        ),
        Mode::ServerError => (StatusCode::BAD_GATEWAY, Json(json!({}))),
    }
}

async fn lookup(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("format").map(String::as_str) != Some("json") {
        return Json(json!({}));
    }
    match params.get("q").map(String::as_str) {
        Some("tênis de corrida") => Json(json!({
            "RelatedTopics": [{"Text": "Tênis de corrida é um calçado leve."}]
        })),
        _ => Json(json!({"RelatedTopics": []})),
    }
}

/// Start the stub on a random port; returns (base url, state).
async fn start_stub(mode: Mode) -> (String, StubState) {
    let state = StubState {
        mode,
        sent: Arc::new(Mutex::new(Vec::new())),
        queries: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/v2/message/get_message", get(get_message))
        .route("/api/v2/message/send_message", post(send_message))
        .route("/lookup", get(lookup))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn fetch_parses_pending_messages() {
    let (base, state) = start_stub(Mode::Ok).await;
    let gateway = shopee(format!("{base}/api/v2"));

    let messages = timeout(TEST_TIMEOUT, gateway.fetch_pending())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        messages,
        vec![
            InboundMessage::new("m-1", "Qual o status do meu pedido?"),
            InboundMessage::new("77", "Quero solicitar reembolso"),
        ]
    );
    let queries = state.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["partner_id"], PARTNER_ID);
}

#[tokio::test]
async fn send_posts_signed_reply() {
    let (base, state) = start_stub(Mode::Ok).await;
    let gateway = shopee(format!("{base}/api/v2/"));

    timeout(TEST_TIMEOUT, gateway.send_reply("m-1", "Obrigado!"))
        .await
        .unwrap()
        .unwrap();

    let sent = state.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["message_id"], "m-1");
    assert_eq!(sent[0]["message"], "Obrigado!");
    assert_eq!(sent[0]["shop_id"], SHOP_ID);
}

#[tokio::test]
async fn api_error_body_is_reported() {
    let (base, _state) = start_stub(Mode::ApiError).await;
    let gateway = shopee(format!("{base}/api/v2"));

    let fetch = timeout(TEST_TIMEOUT, gateway.fetch_pending()).await.unwrap();
    assert!(matches!(fetch, Err(GatewayError::Api { ref error, .. }) if error == "error_auth"));

    let send = timeout(TEST_TIMEOUT, gateway.send_reply("m-1", "oi")).await.unwrap();
    assert!(matches!(send, Err(GatewayError::Api { ref error, .. }) if error == "error_param"));
}

#[tokio::test]
async fn http_status_errors_are_reported() {
    let (base, _state) = start_stub(Mode::ServerError).await;
    let gateway = shopee(format!("{base}/api/v2"));

    let fetch = timeout(TEST_TIMEOUT, gateway.fetch_pending()).await.unwrap();
    assert!(matches!(fetch, Err(GatewayError::Status { status: 500, .. })));

    let send = timeout(TEST_TIMEOUT, gateway.send_reply("m-1", "oi")).await.unwrap();
    assert!(matches!(send, Err(GatewayError::Status { status: 502, .. })));
}

#[tokio::test]
async fn unreachable_api_is_http_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = shopee(format!("http://{addr}/api/v2"));
    let fetch = timeout(TEST_TIMEOUT, gateway.fetch_pending()).await.unwrap();
    assert!(matches!(fetch, Err(GatewayError::Http { .. })));
}

/// Listener that accepts connections and never writes a byte.
async fn start_silent_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn silent_api_times_out_as_http_error() {
    let base = start_silent_listener().await;
    let gateway = shopee(format!("{base}/api/v2"));

    let fetch = timeout(TEST_TIMEOUT, gateway.fetch_pending())
        .await
        .expect("fetch hung past the client timeout");
    assert!(matches!(fetch, Err(GatewayError::Http { .. })), "{fetch:?}");

    let send = timeout(TEST_TIMEOUT, gateway.send_reply("m-1", "oi"))
        .await
        .expect("send hung past the client timeout");
    assert!(matches!(send, Err(GatewayError::Http { .. })), "{send:?}");
}

#[tokio::test]
async fn shutdown_stops_loop_stuck_on_silent_api() {
    let base = start_silent_listener().await;
    let gateway = ShopeeGateway::new(
        credentials(),
        format!("{base}/api/v2"),
        Duration::from_secs(3600),
    )
    .unwrap();
    let processor = MessageProcessor::new(
        Arc::new(gateway),
        RulesEngine::default_rules(),
        ReplySelector::seeded(Arc::new(ResponseCatalog::default()), 0),
    );
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(Poller::new(processor, Duration::from_secs(60)).run(rx));
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).unwrap();

    let cycles = timeout(TEST_TIMEOUT, handle)
        .await
        .expect("poll loop ignored shutdown")
        .unwrap();
    assert_eq!(cycles, 0);
}

#[tokio::test]
async fn silent_lookup_times_out_as_http_error() {
    let base = start_silent_listener().await;
    let lookup = InstantAnswerLookup::new(format!("{base}/lookup"), HTTP_TIMEOUT).unwrap();

    let answer = timeout(TEST_TIMEOUT, lookup.answer("tênis"))
        .await
        .expect("lookup hung past the client timeout");
    assert!(matches!(answer, Err(GatewayError::Http { .. })), "{answer:?}");
}

#[tokio::test]
async fn lookup_returns_first_topic_or_none() {
    let (base, _state) = start_stub(Mode::Ok).await;
    let lookup = InstantAnswerLookup::new(format!("{base}/lookup"), HTTP_TIMEOUT).unwrap();

    let hit = timeout(TEST_TIMEOUT, lookup.answer("tênis de corrida"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.as_deref(), Some("Tênis de corrida é um calçado leve."));

    let miss = timeout(TEST_TIMEOUT, lookup.answer("xyz"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(miss, None);
}
