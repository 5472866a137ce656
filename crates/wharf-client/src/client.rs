//! Platform API client
//!
//! One `PlatformClient` is built per request, bound to the caller's bearer
//! credential. The underlying `reqwest::Client` (connection pool) is shared
//! across requests; only the token differs. The client owns pagination
//! cursor draining and response-envelope unwrapping so handlers never see
//! raw wire shapes.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use wharf_core::{Error, Result};

use crate::invocations::InvocationEventStream;
use crate::types::{
    ApiEnvelope, App, Browser, BrowserPool, Deployment, ExecResult, Extension, Invocation, Page,
    Profile, Proxy, Replay,
};

/// Longest upstream error body fragment quoted back to the caller.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Viewport dimensions for a new session.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u64,
    pub height: u64,
}

/// Parameters for creating a browser session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<u64>,
}

/// Parameters for creating a browser pool.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<CreateBrowserRequest>,
}

/// Parameters for registering a proxy.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProxyRequest {
    #[serde(rename = "type")]
    pub proxy_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Per-request platform API client.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlatformClient {
    /// Bind a client to a base URL and the caller's credential.
    pub fn new(http: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Send a request and unwrap the `data` envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::upstream(format!("platform request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("platform response decode failed: {e}")))?;
        Ok(envelope.data)
    }

    /// Send a request whose response body is irrelevant.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::upstream(format!("platform request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }

    /// Drain a cursor-paginated listing into a full item set.
    async fn drain_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut builder = self.request(Method::GET, path);
            if let Some(ref c) = cursor {
                builder = builder.query(&[("cursor", c.as_str())]);
            }
            let page: Page<T> = self.send(builder).await?;
            items.extend(page.items);
            match page.next_cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }
        Ok(items)
    }

    // === Browsers ===

    pub async fn list_browsers(&self) -> Result<Vec<Browser>> {
        self.drain_pages("/v1/browsers").await
    }

    pub async fn get_browser(&self, session_id: &str) -> Result<Browser> {
        self.send(self.request(Method::GET, &format!("/v1/browsers/{session_id}")))
            .await
    }

    pub async fn create_browser(&self, req: &CreateBrowserRequest) -> Result<Browser> {
        self.send(self.request(Method::POST, "/v1/browsers").json(req))
            .await
    }

    pub async fn delete_browser(&self, session_id: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/v1/browsers/{session_id}")))
            .await
    }

    // === Profiles ===

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.drain_pages("/v1/profiles").await
    }

    pub async fn get_profile(&self, name: &str) -> Result<Profile> {
        self.send(self.request(Method::GET, &format!("/v1/profiles/{name}")))
            .await
    }

    /// Capture a profile from a running session.
    pub async fn setup_profile(
        &self,
        name: &str,
        session_id: &str,
        description: Option<&str>,
    ) -> Result<Profile> {
        let body = json!({
            "name": name,
            "sessionId": session_id,
            "description": description,
        });
        self.send(self.request(Method::POST, "/v1/profiles").json(&body))
            .await
    }

    pub async fn delete_profile(&self, name: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/v1/profiles/{name}")))
            .await
    }

    // === Browser pools ===

    pub async fn list_pools(&self) -> Result<Vec<BrowserPool>> {
        self.drain_pages("/v1/browser-pools").await
    }

    /// The platform accepts either the pool id or its unique name here.
    pub async fn get_pool(&self, id_or_name: &str) -> Result<BrowserPool> {
        self.send(self.request(Method::GET, &format!("/v1/browser-pools/{id_or_name}")))
            .await
    }

    pub async fn create_pool(&self, req: &CreatePoolRequest) -> Result<BrowserPool> {
        self.send(self.request(Method::POST, "/v1/browser-pools").json(req))
            .await
    }

    pub async fn delete_pool(&self, id_or_name: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/v1/browser-pools/{id_or_name}")))
            .await
    }

    /// Discard all idle sessions in a pool.
    pub async fn flush_pool(&self, id_or_name: &str) -> Result<BrowserPool> {
        self.send(self.request(Method::POST, &format!("/v1/browser-pools/{id_or_name}/flush")))
            .await
    }

    /// Check a session out of a pool. The timeout is forwarded to the
    /// platform, not enforced here.
    pub async fn acquire_from_pool(
        &self,
        id_or_name: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<Browser> {
        let body = json!({ "timeoutSeconds": timeout_seconds });
        self.send(
            self.request(Method::POST, &format!("/v1/browser-pools/{id_or_name}/acquire"))
                .json(&body),
        )
        .await
    }

    /// Return a session to its pool.
    pub async fn release_to_pool(&self, id_or_name: &str, session_id: &str) -> Result<()> {
        let body = json!({ "sessionId": session_id });
        self.send_unit(
            self.request(Method::POST, &format!("/v1/browser-pools/{id_or_name}/release"))
                .json(&body),
        )
        .await
    }

    // === Proxies ===

    pub async fn list_proxies(&self) -> Result<Vec<Proxy>> {
        self.drain_pages("/v1/proxies").await
    }

    pub async fn create_proxy(&self, req: &CreateProxyRequest) -> Result<Proxy> {
        self.send(self.request(Method::POST, "/v1/proxies").json(req))
            .await
    }

    pub async fn delete_proxy(&self, id: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/v1/proxies/{id}")))
            .await
    }

    // === Extensions ===

    pub async fn list_extensions(&self) -> Result<Vec<Extension>> {
        self.drain_pages("/v1/extensions").await
    }

    pub async fn delete_extension(&self, id: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/v1/extensions/{id}")))
            .await
    }

    // === Apps ===

    pub async fn list_apps(&self) -> Result<Vec<App>> {
        self.drain_pages("/v1/apps").await
    }

    pub async fn get_app(&self, name: &str) -> Result<App> {
        self.send(self.request(Method::GET, &format!("/v1/apps/{name}")))
            .await
    }

    pub async fn list_deployments(&self, app_name: &str) -> Result<Vec<Deployment>> {
        self.drain_pages(&format!("/v1/apps/{app_name}/deployments"))
            .await
    }

    pub async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        self.send(self.request(Method::GET, &format!("/v1/deployments/{id}")))
            .await
    }

    /// Invoke an app. In async mode the returned invocation is typically
    /// non-terminal and should be followed via [`Self::invocation_events`].
    pub async fn invoke_app(
        &self,
        name: &str,
        payload: Option<&Value>,
        async_mode: bool,
    ) -> Result<Invocation> {
        let body = json!({ "payload": payload, "async": async_mode });
        self.send(
            self.request(Method::POST, &format!("/v1/apps/{name}/invoke"))
                .json(&body),
        )
        .await
    }

    pub async fn get_invocation(&self, id: &str) -> Result<Invocation> {
        self.send(self.request(Method::GET, &format!("/v1/invocations/{id}")))
            .await
    }

    /// Open the server-pushed event stream for an invocation.
    ///
    /// The stream is finite and cannot be restarted; consume it once.
    pub async fn invocation_events(&self, id: &str) -> Result<InvocationEventStream> {
        let response = self
            .request(Method::GET, &format!("/v1/invocations/{id}/events"))
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .map_err(|e| Error::upstream(format!("invocation event stream failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        debug!(invocation = %id, "Following invocation event stream");
        Ok(InvocationEventStream::new(response.bytes_stream()))
    }

    // === Session operations ===

    /// Drive OS-level input inside a session. The response shape varies by
    /// action, so the raw payload is returned.
    pub async fn computer_action(&self, session_id: &str, body: &Value) -> Result<Value> {
        self.send(
            self.request(Method::POST, &format!("/v1/sessions/{session_id}/computer"))
                .json(body),
        )
        .await
    }

    /// Run a shell command inside the session's OS.
    pub async fn exec_command(
        &self,
        session_id: &str,
        command: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<ExecResult> {
        let body = json!({ "command": command, "timeoutSeconds": timeout_seconds });
        self.send(
            self.request(Method::POST, &format!("/v1/sessions/{session_id}/exec"))
                .json(&body),
        )
        .await
    }

    /// Execute Playwright code against the session.
    pub async fn execute_playwright(
        &self,
        session_id: &str,
        code: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<Value> {
        let body = json!({ "code": code, "timeoutSeconds": timeout_seconds });
        self.send(
            self.request(Method::POST, &format!("/v1/sessions/{session_id}/playwright"))
                .json(&body),
        )
        .await
    }

    // === Replays ===

    pub async fn start_replay(&self, session_id: &str) -> Result<Replay> {
        self.send(self.request(Method::POST, &format!("/v1/sessions/{session_id}/replays")))
            .await
    }

    pub async fn stop_replay(&self, replay_id: &str) -> Result<()> {
        self.send_unit(self.request(Method::POST, &format!("/v1/replays/{replay_id}/stop")))
            .await
    }
}

/// Map an unsuccessful platform response onto the error taxonomy.
fn status_error(status: StatusCode, body: &str) -> Error {
    let message = extract_error_message(body);
    if status == StatusCode::NOT_FOUND {
        Error::not_found(message)
    } else {
        Error::upstream(format!("platform returned {status}: {message}"))
    }
}

/// Pull a human-readable message out of a platform error body.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let candidate = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"));
        if let Some(found) = candidate {
            if let Some(s) = found.as_str() {
                return s.to_string();
            }
            return found.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no error detail provided".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_nested_shape() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"session not found"}}"#),
            "session not found"
        );
        assert_eq!(
            extract_error_message(r#"{"error":"bad key"}"#),
            "bad key"
        );
        assert_eq!(
            extract_error_message(r#"{"message":"rate limited"}"#),
            "rate limited"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_text() {
        assert_eq!(extract_error_message("plain failure"), "plain failure");
        assert_eq!(extract_error_message("  "), "no error detail provided");
    }

    #[test]
    fn not_found_maps_to_explicit_variant() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"message":"no such session"}"#);
        assert!(matches!(err, Error::NotFound(_)));
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream sad");
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[test]
    fn create_browser_request_skips_unset_fields() {
        let req = CreateBrowserRequest {
            profile_name: Some("work".into()),
            ..Default::default()
        };
        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(wire, serde_json::json!({"profileName": "work"}));
    }
}
