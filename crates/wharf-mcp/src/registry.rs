//! Tool Registry
//!
//! Holds every tool with its declared parameter schema, compiled once at
//! startup. The registry is read-only after construction: it is shared by
//! `Arc` with no lock, because there are no post-init writers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use wharf_client::PlatformClient;
use wharf_core::{Config, Error, Result};

use crate::auth::AuthContext;
use crate::protocol::ToolOutput;

/// Per-request handler context.
///
/// Owning an `AuthContext` is what authorizes a dispatch: handlers cannot
/// be invoked without one, by construction. The platform client is already
/// bound to the caller's credential.
pub struct RequestCx {
    pub auth: AuthContext,
    pub platform: PlatformClient,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

/// Core trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON schema for input validation
    fn input_schema(&self) -> Value;

    /// Execute with already-validated input
    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput>;
}

/// Type alias for boxed tools
pub type BoxedTool = Arc<dyn Tool>;

/// Tool metadata for `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

struct ToolEntry {
    tool: BoxedTool,
    schema: Value,
    validator: JSONSchema,
}

/// Immutable tool registry.
pub struct ToolRegistry {
    entries: HashMap<String, ToolEntry>,
    /// Registration order, kept for stable listings.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Build the registry, compiling every declared schema.
    pub fn build(tools: Vec<BoxedTool>) -> Result<Self> {
        let mut entries = HashMap::new();
        let mut order = Vec::new();
        for tool in tools {
            let name = tool.name().to_string();
            let schema = tool.input_schema();
            let validator = JSONSchema::compile(&schema)
                .map_err(|e| Error::internal(format!("invalid schema for tool {name}: {e}")))?;
            if entries
                .insert(
                    name.clone(),
                    ToolEntry {
                        tool,
                        schema,
                        validator,
                    },
                )
                .is_some()
            {
                return Err(Error::internal(format!("duplicate tool name: {name}")));
            }
            order.push(name);
        }
        Ok(Self { entries, order })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// List tools in registration order.
    pub fn list(&self) -> Vec<ToolInfo> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| ToolInfo {
                name: entry.tool.name().to_string(),
                description: entry.tool.description().to_string(),
                input_schema: entry.schema.clone(),
            })
            .collect()
    }

    /// Validate parameters and run the named tool.
    ///
    /// Never lets a handler failure escape: every error is rendered into a
    /// text-error envelope so the transport always sees a well-formed
    /// result. Returns `None` only when the tool does not exist.
    pub async fn dispatch(&self, name: &str, params: Value, cx: &RequestCx) -> Option<ToolOutput> {
        let entry = self.entries.get(name)?;

        if let Err(errors) = entry.validator.validate(&params) {
            let detail = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            debug!(tool = %name, "Rejected parameters: {detail}");
            return Some(ToolOutput::error(format!(
                "Invalid parameters for {name}: {detail}"
            )));
        }

        match entry.tool.call(params, cx).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                Some(ToolOutput::error(format!("{name} failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo input back"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"}
                },
                "required": ["message"],
                "additionalProperties": false
            })
        }

        async fn call(&self, params: Value, _cx: &RequestCx) -> Result<ToolOutput> {
            Ok(ToolOutput::json(&params))
        }
    }

    fn test_cx() -> RequestCx {
        let http = reqwest::Client::new();
        let config = Arc::new(Config {
            api_url: "http://127.0.0.1:1".into(),
            identity_api_url: "http://127.0.0.1:1".into(),
            identity_secret: None,
            docs_search_url: "http://127.0.0.1:1".into(),
        });
        RequestCx {
            auth: crate::auth::AuthContext {
                token: "key".into(),
                scopes: std::collections::HashSet::from(["apikey".to_string()]),
                client_id: crate::SERVER_NAME.into(),
                user_id: None,
                identity_token: None,
            },
            platform: PlatformClient::new(http.clone(), "http://127.0.0.1:1", "key"),
            http,
            config,
        }
    }

    #[tokio::test]
    async fn malformed_input_never_reaches_the_handler() {
        let registry = ToolRegistry::build(vec![Arc::new(EchoTool)]).unwrap();
        let cx = test_cx();
        let output = registry
            .dispatch("echo", json!({"message": 42}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);

        let output = registry
            .dispatch("echo", json!({"message": "hi"}), &cx)
            .await
            .unwrap();
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn unknown_tool_is_distinguishable_from_failure() {
        let registry = ToolRegistry::build(vec![Arc::new(EchoTool)]).unwrap();
        let cx = test_cx();
        assert!(registry.dispatch("nope", json!({}), &cx).await.is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ToolRegistry::build(vec![Arc::new(EchoTool), Arc::new(EchoTool)]);
        assert!(result.is_err());
    }
}
