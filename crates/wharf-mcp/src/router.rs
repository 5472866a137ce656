//! HTTP endpoint
//!
//! One protocol endpoint at `/mcp` for POST (request/response), GET (event
//! channel), and the CORS pre-flight, plus an unauthenticated `/health`.
//! The auth gate runs before anything reaches the dispatcher; pre-flight
//! requests bypass it entirely via the CORS layer. CORS headers are present
//! on every response, including 401 challenges.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use wharf_client::PlatformClient;
use wharf_core::{Config, Error};

use crate::auth::{parse_bearer_header, AuthGate, INVALID_TOKEN, REALM};
use crate::protocol::{JsonRpcError, McpRequest, McpResponse};
use crate::registry::RequestCx;
use crate::server::McpServer;
use crate::{SERVER_NAME, SERVER_VERSION};

/// Shared gateway state.
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub gate: Arc<AuthGate>,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

/// Create the gateway router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mcp", post(mcp_post_handler).get(mcp_get_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve the gateway until the process exits.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("MCP gateway listening on {}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the auth gate against the request headers.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<RequestCx, Error> {
    let bearer = parse_bearer_header(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    );
    let auth = state.gate.authenticate(bearer.as_deref()).await?;

    let platform = PlatformClient::new(state.http.clone(), &state.config.api_url, &auth.token);
    Ok(RequestCx {
        auth,
        platform,
        http: state.http.clone(),
        config: state.config.clone(),
    })
}

/// Render an authentication failure as a 401 challenge.
///
/// The failure message is interpolated into both the JSON body and the
/// `WWW-Authenticate` header; credential problems are never a 500.
fn challenge_response(err: &Error) -> Response {
    let description = match err {
        Error::Auth(msg) => msg.clone(),
        other => other.to_string(),
    };

    let challenge = format!(
        "Bearer realm=\"{REALM}\", error=\"{INVALID_TOKEN}\", error_description=\"{}\"",
        description.replace('"', "'")
    );
    let header_value = HeaderValue::from_str(&challenge)
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer realm=\"OAuth\", error=\"invalid_token\""));

    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": INVALID_TOKEN,
            "error_description": description,
        })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, header_value);
    response
}

/// POST /mcp: JSON-RPC request/response.
async fn mcp_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let cx = match authenticate(&state, &headers).await {
        Ok(cx) => cx,
        Err(e) => return challenge_response(&e),
    };

    let request: McpRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return Json(McpResponse::error(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON-RPC request: {e}")),
            ))
            .into_response()
        }
    };

    match state.server.handle_request(request, &cx).await {
        Some(response) => Json(response).into_response(),
        // Notifications carry no response body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// GET /mcp: server-push channel, same gate as POST.
async fn mcp_get_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(e) = authenticate(&state, &headers).await {
        return challenge_response(&e);
    }

    let endpoint_event = stream::iter(vec![Ok::<_, Infallible>(
        Event::default().event("endpoint").data("/mcp"),
    )]);

    Sse::new(endpoint_event)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        )
        .into_response()
}

/// GET /health: liveness, outside the protocol endpoint and its gate.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVER_NAME,
        "version": SERVER_VERSION
    }))
}
