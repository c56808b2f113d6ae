use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::Mutex};

use shared::{
    domain::{Method, OperationMode},
    protocol::StatsSnapshot,
};

use super::*;

#[derive(Clone, Default)]
struct ProcessorServerState {
    requests: Arc<Mutex<Vec<ProcessRequest>>>,
    key_queries: Arc<Mutex<Vec<(u32, bool)>>>,
    has_history: Arc<Mutex<bool>>,
    fail_process_with: Arc<Mutex<Option<String>>>,
    internal_error: Arc<Mutex<bool>>,
}

fn caesar(text: &str, decrypt: bool) -> String {
    let shift: u8 = if decrypt { 23 } else { 3 };
    text.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                (((c as u8 - b'A' + shift) % 26) + b'A') as char
            } else if c.is_ascii_lowercase() {
                (((c as u8 - b'a' + shift) % 26) + b'a') as char
            } else {
                c
            }
        })
        .collect()
}

async fn handle_process(
    State(state): State<ProcessorServerState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessReply>, (StatusCode, String)> {
    if *state.internal_error.lock().await {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "history backend exploded".to_string(),
        ));
    }
    state.requests.lock().await.push(request.clone());

    if let Some(error) = state.fail_process_with.lock().await.clone() {
        return Ok(Json(ProcessReply {
            success: false,
            result: None,
            method: None,
            action: None,
            input_length: 0,
            output_length: 0,
            error: Some(error),
        }));
    }

    let result = match request.method {
        Method::Caesar => caesar(
            &request.text,
            matches!(request.action, OperationMode::Decrypt),
        ),
        _ => request.text.clone(),
    };
    Ok(Json(ProcessReply {
        success: true,
        input_length: request.text.chars().count() as u64,
        output_length: result.chars().count() as u64,
        result: Some(result),
        method: Some(request.method),
        action: Some(request.action),
        error: None,
    }))
}

#[derive(Deserialize)]
struct KeyQuery {
    length: u32,
    symbols: bool,
}

async fn handle_generate_key(
    State(state): State<ProcessorServerState>,
    Query(query): Query<KeyQuery>,
) -> Json<GeneratedKey> {
    state
        .key_queries
        .lock()
        .await
        .push((query.length, query.symbols));
    Json(GeneratedKey {
        success: true,
        key: "k".repeat(query.length as usize),
        length: query.length,
        strength: "Strong".to_string(),
        error: None,
    })
}

async fn handle_stats(State(state): State<ProcessorServerState>) -> Json<StatsReply> {
    if *state.has_history.lock().await {
        Json(StatsReply::Data(StatsSnapshot {
            total_operations: 2,
            total_characters: 10,
            average_length: 5.0,
            success_rate: 100.0,
            methods_used: [("caesar".to_string(), 2)].into_iter().collect(),
            uptime: "00:05:00".to_string(),
            most_used: "caesar".to_string(),
        }))
    } else {
        Json(StatsReply::Empty {
            message: "No history".to_string(),
        })
    }
}

async fn handle_clear_history(
    State(state): State<ProcessorServerState>,
) -> Json<ClearHistoryReply> {
    *state.has_history.lock().await = false;
    Json(ClearHistoryReply {
        message: "History cleared".to_string(),
    })
}

async fn spawn_processor_server() -> Result<(String, ProcessorServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ProcessorServerState::default();
    let app = Router::new()
        .route("/process", post(handle_process))
        .route("/generate-key", get(handle_generate_key))
        .route("/stats", get(handle_stats))
        .route("/clear-history", post(handle_clear_history))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn encrypt_request(text: &str) -> ProcessRequest {
    ProcessRequest {
        text: text.to_string(),
        method: Method::Caesar,
        password: "defaultpass".to_string(),
        action: OperationMode::Encrypt,
    }
}

#[tokio::test]
async fn encrypt_then_decrypt_round_trips_through_the_service() {
    let (server_url, _state) = spawn_processor_server().await.expect("spawn server");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let encrypted = gateway
        .process(encrypt_request("hello"))
        .await
        .expect("encrypt");
    assert_eq!(encrypted.result, "khoor");
    assert_eq!(encrypted.input_length, 5);
    assert_eq!(encrypted.output_length, 5);
    assert_eq!(encrypted.action, OperationMode::Encrypt);

    let decrypted = gateway
        .process(ProcessRequest {
            text: encrypted.result,
            method: Method::Caesar,
            password: "defaultpass".to_string(),
            action: OperationMode::Decrypt,
        })
        .await
        .expect("decrypt");
    assert_eq!(decrypted.result, "hello");
}

#[tokio::test]
async fn failure_payload_maps_to_application_error_with_service_message() {
    let (server_url, state) = spawn_processor_server().await.expect("spawn server");
    *state.fail_process_with.lock().await = Some("Wrong password entered".to_string());

    let gateway = HttpGateway::new(&server_url).expect("gateway");
    let err = gateway
        .process(encrypt_request("hello"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        GatewayError::Application("Wrong password entered".to_string())
    );
}

#[tokio::test]
async fn non_success_status_maps_to_application_error_with_body_text() {
    let (server_url, state) = spawn_processor_server().await.expect("spawn server");
    *state.internal_error.lock().await = true;

    let gateway = HttpGateway::new(&server_url).expect("gateway");
    let err = gateway
        .process(encrypt_request("hello"))
        .await
        .expect_err("must fail");
    match err {
        GatewayError::Application(message) => {
            assert!(message.contains("500"), "got {message}");
            assert!(message.contains("history backend exploded"), "got {message}");
        }
        other => panic!("unexpected error class: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_maps_to_transport_error() {
    let gateway = HttpGateway::new("http://127.0.0.1:1").expect("gateway");
    let err = gateway
        .process(encrypt_request("hello"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, GatewayError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn stats_decodes_both_reply_shapes() {
    let (server_url, state) = spawn_processor_server().await.expect("spawn server");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    match gateway.stats().await.expect("stats") {
        StatsReply::Empty { message } => assert_eq!(message, "No history"),
        StatsReply::Data(_) => panic!("expected the no-data message"),
    }

    *state.has_history.lock().await = true;
    match gateway.stats().await.expect("stats") {
        StatsReply::Data(stats) => {
            assert_eq!(stats.total_operations, 2);
            assert_eq!(stats.most_used, "caesar");
        }
        StatsReply::Empty { .. } => panic!("expected aggregate counters"),
    }
}

#[tokio::test]
async fn generate_key_forwards_query_parameters() {
    let (server_url, state) = spawn_processor_server().await.expect("spawn server");
    let gateway = HttpGateway::new(&server_url).expect("gateway");

    let key = gateway.generate_key(24, false).await.expect("key");
    assert_eq!(key.length, 24);
    assert_eq!(key.key.len(), 24);
    assert_eq!(state.key_queries.lock().await.clone(), vec![(24, false)]);
}

#[tokio::test]
async fn clear_history_returns_the_service_message() {
    let (server_url, state) = spawn_processor_server().await.expect("spawn server");
    *state.has_history.lock().await = true;

    let gateway = HttpGateway::new(&server_url).expect("gateway");
    let message = gateway.clear_history().await.expect("clear");
    assert_eq!(message, "History cleared");
    assert!(!*state.has_history.lock().await);
}

#[tokio::test]
async fn rejects_malformed_or_non_http_base_urls() {
    assert!(HttpGateway::new("not a url").is_err());
    assert!(HttpGateway::new("ftp://example.com").is_err());
}

#[tokio::test]
async fn missing_gateway_fails_every_call_softly() {
    let gateway = MissingGateway;
    assert!(matches!(
        gateway.process(encrypt_request("hello")).await,
        Err(GatewayError::Application(_))
    ));
    assert!(matches!(
        gateway.stats().await,
        Err(GatewayError::Application(_))
    ));
}
