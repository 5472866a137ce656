//! Shared harness for gateway integration tests
//!
//! Spins up the real router against in-process fakes of the identity
//! provider and the platform API, all on ephemeral ports.

// Each test binary uses its own subset of this harness.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use wharf_core::Config;
use wharf_mcp::auth::{AuthGate, IdentityVerifier};
use wharf_mcp::{AppState, McpServer};

pub const IDENTITY_SECRET: &str = "test-identity-secret";

/// Structured-token fixtures: three base64url segments whose middle part
/// tells the fake provider how to respond.
pub const TOKEN_WITH_SUBJECT: &str = "eyJhbGciOiJSUzI1NiJ9.Z29vZA.c2ln";
pub const TOKEN_WITHOUT_SUBJECT: &str = "eyJhbGciOiJSUzI1NiJ9.bm9zdWI.c2ln";
pub const TOKEN_REJECTED: &str = "eyJhbGciOiJSUzI1NiJ9.YmFk.c2ln";

/// What the fake platform observed.
#[derive(Default)]
pub struct PlatformLog {
    pub created_sessions: Vec<String>,
    pub deleted_sessions: Vec<String>,
    pub replays_started: usize,
    pub replays_stopped: usize,
}

pub type SharedLog = Arc<Mutex<PlatformLog>>;

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Fake identity provider: POST /v1/tokens/verify.
pub async fn spawn_identity_provider() -> SocketAddr {
    async fn verify(headers: axum::http::HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {IDENTITY_SECRET}"))
            .unwrap_or(false);
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "bad verification secret"})),
            );
        }

        let token = body.get("token").and_then(Value::as_str).unwrap_or("");
        if token.contains(".Z29vZA.") {
            (StatusCode::OK, Json(json!({"sub": "user-123"})))
        } else if token.contains(".bm9zdWI.") {
            // Verification "succeeds" but the payload has no subject.
            (StatusCode::OK, Json(json!({"azp": "somebody"})))
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "signature verification failed"})),
            )
        }
    }

    spawn(Router::new().route("/v1/tokens/verify", post(verify))).await
}

/// Fake platform API covering the endpoints the tests drive.
pub async fn spawn_platform(log: SharedLog) -> SocketAddr {
    #[derive(Clone)]
    struct PlatformState {
        log: SharedLog,
    }

    async fn list_browsers(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        // Two pages, linked by an opaque cursor.
        match params.get("cursor").map(String::as_str) {
            None => Json(json!({
                "data": {
                    "items": [
                        {"sessionId": "s-1", "status": "running"},
                        {"sessionId": "s-2", "status": "running"}
                    ],
                    "nextCursor": "page-2"
                }
            })),
            Some("page-2") => Json(json!({
                "data": {
                    "items": [{"sessionId": "s-3", "status": "running"}]
                }
            })),
            Some(_) => Json(json!({"data": {"items": []}})),
        }
    }

    async fn get_browser(Path(id): Path<String>) -> impl IntoResponse {
        if id == "s-1" {
            (
                StatusCode::OK,
                Json(json!({"data": {"sessionId": "s-1", "status": "running"}})),
            )
        } else {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": {"message": format!("session {id} not found")}})),
            )
        }
    }

    async fn create_browser(State(state): State<PlatformState>) -> Json<Value> {
        let mut log = state.log.lock().unwrap();
        let id = format!("created-{}", log.created_sessions.len() + 1);
        log.created_sessions.push(id.clone());
        Json(json!({"data": {"sessionId": id, "status": "running"}}))
    }

    async fn delete_browser(
        State(state): State<PlatformState>,
        Path(id): Path<String>,
    ) -> Json<Value> {
        state.log.lock().unwrap().deleted_sessions.push(id);
        Json(json!({"data": null}))
    }

    async fn start_replay(
        State(state): State<PlatformState>,
        Path(id): Path<String>,
    ) -> Json<Value> {
        state.log.lock().unwrap().replays_started += 1;
        Json(json!({
            "data": {
                "replayId": format!("rp-{id}"),
                "viewUrl": format!("https://replays.test/{id}")
            }
        }))
    }

    async fn stop_replay(State(state): State<PlatformState>) -> Json<Value> {
        state.log.lock().unwrap().replays_stopped += 1;
        Json(json!({"data": null}))
    }

    async fn run_playwright(Path(id): Path<String>) -> impl IntoResponse {
        if id.starts_with("created-") {
            // Scripts against throwaway sessions blow up in these tests, so
            // the failure-path cleanup can be observed.
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "page.goto: net::ERR_FAILED"}})),
            )
        } else {
            (
                StatusCode::OK,
                Json(json!({"data": {"value": "ok"}})),
            )
        }
    }

    async fn invoke_app(Path(name): Path<String>) -> Json<Value> {
        Json(json!({
            "data": {"id": format!("inv-{name}"), "status": "queued"}
        }))
    }

    async fn invocation_events(Path(id): Path<String>) -> String {
        [
            json!({"type": "invocation_state", "invocation": {"id": id, "status": "running"}})
                .to_string(),
            json!({
                "type": "invocation_state",
                "invocation": {"id": id, "status": "succeeded", "result": {"pages": 3}}
            })
            .to_string(),
        ]
        .join("\n")
    }

    let state = PlatformState { log };
    let router = Router::new()
        .route("/v1/browsers", get(list_browsers).post(create_browser))
        .route("/v1/browsers/:id", get(get_browser).delete(delete_browser))
        .route("/v1/sessions/:id/replays", post(start_replay))
        .route("/v1/replays/:id/stop", post(stop_replay))
        .route("/v1/sessions/:id/playwright", post(run_playwright))
        .route("/v1/apps/:name/invoke", post(invoke_app))
        .route("/v1/invocations/:id/events", get(invocation_events))
        .with_state(state);

    spawn(router).await
}

/// Boot the real gateway wired to the given fakes.
pub async fn spawn_gateway(identity: SocketAddr, platform: Option<SocketAddr>) -> SocketAddr {
    let config = Arc::new(Config {
        api_url: platform
            .map(|addr| format!("http://{addr}"))
            .unwrap_or_else(|| "http://127.0.0.1:1".to_string()),
        identity_api_url: format!("http://{identity}"),
        identity_secret: Some(IDENTITY_SECRET.to_string()),
        docs_search_url: "http://127.0.0.1:1".to_string(),
    });

    let http = reqwest::Client::new();
    let verifier = IdentityVerifier::new(http.clone(), &config);
    let state = AppState {
        server: Arc::new(McpServer::new(None).expect("build server")),
        gate: Arc::new(AuthGate::new(verifier)),
        http,
        config,
    };

    spawn(wharf_mcp::create_router(state)).await
}

/// POST a JSON-RPC request to the gateway.
pub async fn rpc(
    client: &reqwest::Client,
    gateway: SocketAddr,
    bearer: Option<&str>,
    body: Value,
) -> reqwest::Response {
    let mut request = client
        .post(format!("http://{gateway}/mcp"))
        .header("content-type", "application/json")
        .body(body.to_string());
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    request.send().await.expect("gateway reachable")
}
