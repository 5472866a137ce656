//! Browser pools

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_client::CreatePoolRequest;
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_u64, required_str};

pub struct ManageBrowserPoolsTool;

#[async_trait]
impl Tool for ManageBrowserPoolsTool {
    fn name(&self) -> &str {
        "manage_browser_pools"
    }

    fn description(&self) -> &str {
        "Manage pre-warmed browser pools: create, list, inspect, delete, or \
         flush a pool, and acquire or release sessions from it."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "list", "get", "delete", "flush", "acquire", "release"],
                    "description": "Operation to perform"
                },
                "pool": {
                    "type": "string",
                    "description": "Pool id or unique name (required for everything except create and list)"
                },
                "name": {
                    "type": "string",
                    "description": "Name for a new pool (required for create)"
                },
                "min_size": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Sessions kept warm"
                },
                "max_size": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Upper bound on concurrent sessions"
                },
                "session_id": {
                    "type": "string",
                    "description": "Session to return (required for release)"
                },
                "timeout_seconds": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "How long acquire may wait; forwarded to the platform"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("manage_browser_pools {action} failed: {e}"))
        }))
    }
}

impl ManageBrowserPoolsTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "create" => {
                let name = required_str(params, "name")?;
                let min_size = optional_u64(params, "min_size");
                let max_size = optional_u64(params, "max_size");
                if let (Some(min), Some(max)) = (min_size, max_size) {
                    if min > max {
                        return Err(Error::validation(
                            "min_size must not be greater than max_size",
                        ));
                    }
                }
                let request = CreatePoolRequest {
                    name: name.to_string(),
                    min_size,
                    max_size,
                    browser: None,
                };
                let pool = cx.platform.create_pool(&request).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&pool)?))
            }
            "list" => {
                let pools = cx.platform.list_pools().await?;
                if pools.is_empty() {
                    return Ok(ToolOutput::text("No browser pools found."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&pools)?))
            }
            "get" => {
                let pool = required_str(params, "pool")?;
                let found = cx.platform.get_pool(pool).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&found)?))
            }
            "delete" => {
                let pool = required_str(params, "pool")?;
                cx.platform.delete_pool(pool).await?;
                Ok(ToolOutput::text(format!("Deleted browser pool {pool}")))
            }
            "flush" => {
                let pool = required_str(params, "pool")?;
                let flushed = cx.platform.flush_pool(pool).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&flushed)?))
            }
            "acquire" => {
                let pool = required_str(params, "pool")?;
                let timeout = optional_u64(params, "timeout_seconds");
                let browser = cx.platform.acquire_from_pool(pool, timeout).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&browser)?))
            }
            "release" => {
                let pool = required_str(params, "pool")?;
                let session_id = required_str(params, "session_id")?;
                cx.platform.release_to_pool(pool, session_id).await?;
                Ok(ToolOutput::text(format!(
                    "Released session {session_id} back to pool {pool}"
                )))
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
    async fn create_rejects_inverted_size_bounds() {
        let cx = offline_cx();
        let output = ManageBrowserPoolsTool
            .call(
                json!({"action": "create", "name": "scrapers", "min_size": 5, "max_size": 2}),
                &cx,
            )
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("min_size"));
    }

    #[tokio::test]
    async fn release_requires_pool_and_session() {
        let cx = offline_cx();
        let output = ManageBrowserPoolsTool
            .call(json!({"action": "release", "pool": "p-1"}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("session_id"));
    }
}
