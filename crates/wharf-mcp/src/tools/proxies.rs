//! Egress proxies

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_client::CreateProxyRequest;
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_str, required_str};

pub struct ManageProxiesTool;

#[async_trait]
impl Tool for ManageProxiesTool {
    fn name(&self) -> &str {
        "manage_proxies"
    }

    fn description(&self) -> &str {
        "Register, list, and delete egress proxies that browser sessions can \
         route through."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "list", "delete"],
                    "description": "Operation to perform"
                },
                "proxy_id": {
                    "type": "string",
                    "description": "Target proxy (required for delete)"
                },
                "type": {
                    "type": "string",
                    "enum": ["residential", "datacenter", "mobile", "custom"],
                    "description": "Proxy type (required for create)"
                },
                "country_code": {
                    "type": "string",
                    "description": "Two-letter exit country for managed proxy types"
                },
                "server": {
                    "type": "string",
                    "description": "host:port of a custom proxy (required when type is custom)"
                },
                "username": {
                    "type": "string",
                    "description": "Credential for a custom proxy; requires password"
                },
                "password": {
                    "type": "string",
                    "description": "Credential for a custom proxy; requires username"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("manage_proxies {action} failed: {e}"))
        }))
    }
}

impl ManageProxiesTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "create" => {
                let proxy_type = required_str(params, "type")?;
                let server = optional_str(params, "server");
                if proxy_type == "custom" && server.is_none() {
                    return Err(Error::validation(
                        "server is required when type is custom",
                    ));
                }
                let username = optional_str(params, "username");
                let password = optional_str(params, "password");
                if username.is_some() != password.is_some() {
                    return Err(Error::validation(
                        "username and password must be provided together",
                    ));
                }
                let request = CreateProxyRequest {
                    proxy_type: proxy_type.to_string(),
                    country_code: optional_str(params, "country_code").map(str::to_string),
                    server: server.map(str::to_string),
                    username: username.map(str::to_string),
                    password: password.map(str::to_string),
                };
                let proxy = cx.platform.create_proxy(&request).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&proxy)?))
            }
            "list" => {
                let proxies = cx.platform.list_proxies().await?;
                if proxies.is_empty() {
                    return Ok(ToolOutput::text("No proxies found."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&proxies)?))
            }
            "delete" => {
                let proxy_id = required_str(params, "proxy_id")?;
                cx.platform.delete_proxy(proxy_id).await?;
                Ok(ToolOutput::text(format!("Deleted proxy {proxy_id}")))
            }
            other => Err(Error::validation(format!("Unknown action: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests_support::{first_text, offline_cx};

    #[tokio::test]
    async fn custom_proxy_requires_a_server() {
        let cx = offline_cx();
        let output = ManageProxiesTool
            .call(json!({"action": "create", "type": "custom"}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("server"));
    }

    #[tokio::test]
    async fn credentials_are_co_required() {
        let cx = offline_cx();
        let output = ManageProxiesTool
            .call(
                json!({"action": "create", "type": "residential", "username": "u"}),
                &cx,
            )
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("together"));
    }
}
