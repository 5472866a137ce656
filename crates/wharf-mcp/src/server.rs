//! MCP Server
//!
//! Method dispatch for the protocol endpoint. Every request arriving here
//! has already passed the auth gate; the accompanying [`RequestCx`] is the
//! proof. Tool and resource failures are rendered into well-formed results
//! here; nothing below this layer throws past the transport.

use serde_json::{json, Value};
use tracing::debug;
use wharf_core::{Error, Result};

use crate::prompts::PromptRegistry;
use crate::protocol::{JsonRpcError, McpRequest, McpResponse};
use crate::registry::{RequestCx, ToolRegistry};
use crate::resources::ResourceRegistry;
use crate::tools;
use crate::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};

/// The protocol server: immutable registries plus dispatch.
pub struct McpServer {
    name: String,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
}

impl McpServer {
    /// Build the server and its registries. Called once at startup; the
    /// registries never change afterwards.
    pub fn new(name: Option<String>) -> Result<Self> {
        Ok(Self {
            name: name.unwrap_or_else(|| SERVER_NAME.to_string()),
            tools: tools::build_registry()?,
            resources: ResourceRegistry::new(),
            prompts: PromptRegistry::new(),
        })
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Handle one protocol request.
    ///
    /// Returns `None` for notifications, which receive no response body.
    pub async fn handle_request(&self, request: McpRequest, cx: &RequestCx) -> Option<McpResponse> {
        debug!(method = %request.method, "Handling MCP request");

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "initialized" | "notifications/initialized" => {
                McpResponse::success(request.id.clone(), json!({}))
            }
            "ping" => McpResponse::success(request.id.clone(), json!({})),
            "tools/list" => self.handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(&request, cx).await,
            "resources/list" => self.handle_resources_list(&request),
            "resources/read" => self.handle_resources_read(&request, cx).await,
            "prompts/list" => McpResponse::success(
                request.id.clone(),
                json!({ "prompts": self.prompts.list() }),
            ),
            "prompts/get" => self.handle_prompts_get(&request),
            _ => McpResponse::error(
                request.id.clone(),
                JsonRpcError::method_not_found(&request.method),
            ),
        };

        if request.is_notification() {
            None
        } else {
            Some(response)
        }
    }

    fn handle_initialize(&self, request: &McpRequest) -> McpResponse {
        let client_name = request
            .params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|ci| ci.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");
        debug!(client = %client_name, "Client initializing");

        McpResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "subscribe": false, "listChanged": false },
                    "prompts": { "listChanged": false }
                },
                "serverInfo": {
                    "name": self.name,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: &McpRequest) -> McpResponse {
        McpResponse::success(request.id.clone(), json!({ "tools": self.tools.list() }))
    }

    async fn handle_tools_call(&self, request: &McpRequest, cx: &RequestCx) -> McpResponse {
        let params = match &request.params {
            Some(p) => p,
            None => {
                return McpResponse::error(
                    request.id.clone(),
                    JsonRpcError::invalid_params("Missing params"),
                )
            }
        };

        let tool_name = match params.get("name").and_then(|n| n.as_str()) {
            Some(n) => n,
            None => {
                return McpResponse::error(
                    request.id.clone(),
                    JsonRpcError::invalid_params("Missing tool name"),
                )
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.tools.dispatch(tool_name, arguments, cx).await {
            Some(output) => McpResponse::success(request.id.clone(), output.into_result()),
            None => McpResponse::error(
                request.id.clone(),
                JsonRpcError::new(-32001, format!("Tool '{}' is not available", tool_name)),
            ),
        }
    }

    fn handle_resources_list(&self, request: &McpRequest) -> McpResponse {
        McpResponse::success(
            request.id.clone(),
            json!({ "resources": self.resources.list_resources() }),
        )
    }

    async fn handle_resources_read(&self, request: &McpRequest, cx: &RequestCx) -> McpResponse {
        let uri = request
            .params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(|u| u.as_str())
            .unwrap_or("");

        if uri.is_empty() {
            return McpResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_params("Missing uri"),
            );
        }

        match self.resources.resolve(uri, cx).await {
            Ok(text) => McpResponse::success(
                request.id.clone(),
                json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": "text/plain",
                        "text": text
                    }]
                }),
            ),
            Err(Error::NotFound(detail)) => McpResponse::error(
                request.id.clone(),
                JsonRpcError::new(-32002, format!("Resource not found: {detail}")),
            ),
            Err(Error::InvalidUri(bad)) => McpResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_params(format!("Invalid resource URI: {bad}")),
            ),
            Err(e) => McpResponse::error(
                request.id.clone(),
                JsonRpcError::internal_error(e.to_string()),
            ),
        }
    }

    fn handle_prompts_get(&self, request: &McpRequest) -> McpResponse {
        let params = request.params.clone().unwrap_or(json!({}));
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.prompts.get(name, &arguments) {
            Some(result) => McpResponse::success(request.id.clone(), result),
            None => McpResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_params(format!("Unknown prompt: {name}")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests_support::offline_cx;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(None).unwrap()
    }

    #[tokio::test]
    async fn initialize_advertises_capabilities() {
        let cx = offline_cx();
        let request = McpRequest::new("initialize").with_id(json!(1));
        let response = server().handle_request(request, &cx).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let cx = offline_cx();
        let request = McpRequest::new("notifications/initialized");
        assert!(server().handle_request(request, &cx).await.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_a_jsonrpc_error() {
        let cx = offline_cx();
        let request = McpRequest::new("bogus/method").with_id(json!(7));
        let response = server().handle_request(request, &cx).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_unavailable() {
        let cx = offline_cx();
        let request = McpRequest::new("tools/call")
            .with_id(json!(2))
            .with_params(json!({"name": "nonexistent", "arguments": {}}));
        let response = server().handle_request(request, &cx).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32001);
    }

    #[tokio::test]
    async fn tool_validation_failure_is_a_result_not_an_error() {
        let cx = offline_cx();
        // Both profile identifiers set: precondition failure, but still a
        // well-formed tools/call result.
        let request = McpRequest::new("tools/call").with_id(json!(3)).with_params(json!({
            "name": "manage_browsers",
            "arguments": {"action": "create", "profile_name": "a", "profile_id": "b"}
        }));
        let response = server().handle_request(request, &cx).await.unwrap();
        assert!(response.is_success());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn tools_list_reports_the_catalogue() {
        let cx = offline_cx();
        let request = McpRequest::new("tools/list").with_id(json!(4));
        let response = server().handle_request(request, &cx).await.unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 10);
    }

    #[tokio::test]
    async fn invalid_resource_uri_is_rejected_by_shape() {
        let cx = offline_cx();
        let request = McpRequest::new("resources/read")
            .with_id(json!(5))
            .with_params(json!({"uri": "widgets://x"}));
        let response = server().handle_request(request, &cx).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
