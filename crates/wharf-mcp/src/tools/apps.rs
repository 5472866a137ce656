//! Deployed automation apps

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_client::follow_invocation;
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_bool, required_str};

pub struct ManageAppsTool;

#[async_trait]
impl Tool for ManageAppsTool {
    fn name(&self) -> &str {
        "manage_apps"
    }

    fn description(&self) -> &str {
        "Work with deployed automation apps: list them, invoke one (optionally \
         asynchronously), and inspect deployments and invocations."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list_apps", "invoke", "get_deployment", "list_deployments", "get_invocation"],
                    "description": "Operation to perform"
                },
                "app_name": {
                    "type": "string",
                    "description": "Target app (required for invoke and list_deployments)"
                },
                "payload": {
                    "description": "JSON payload handed to the app on invoke"
                },
                "async_mode": {
                    "type": "boolean",
                    "description": "Invoke asynchronously and follow the invocation's event stream to its final state (default false)"
                },
                "deployment_id": {
                    "type": "string",
                    "description": "Target deployment (required for get_deployment)"
                },
                "invocation_id": {
                    "type": "string",
                    "description": "Target invocation (required for get_invocation)"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome
            .unwrap_or_else(|e| ToolOutput::error(format!("manage_apps {action} failed: {e}"))))
    }
}

impl ManageAppsTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "list_apps" => {
                let apps = cx.platform.list_apps().await?;
                if apps.is_empty() {
                    return Ok(ToolOutput::text("No apps found."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&apps)?))
            }
            "invoke" => {
                let app_name = required_str(params, "app_name")?;
                let payload = params.get("payload").filter(|p| !p.is_null());
                let async_mode = optional_bool(params, "async_mode").unwrap_or(false);

                let invocation = cx.platform.invoke_app(app_name, payload, async_mode).await?;

                // Async invocations come back non-terminal; reduce the event
                // stream to the final snapshot before reporting.
                let snapshot = if async_mode && !invocation.status.is_terminal() {
                    let events = cx.platform.invocation_events(&invocation.id).await?;
                    follow_invocation(invocation, events).await?
                } else {
                    invocation
                };
                Ok(ToolOutput::json(&serde_json::to_value(&snapshot)?))
            }
            "get_deployment" => {
                let deployment_id = required_str(params, "deployment_id")?;
                let deployment = cx.platform.get_deployment(deployment_id).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&deployment)?))
            }
            "list_deployments" => {
                let app_name = required_str(params, "app_name")?;
                let deployments = cx.platform.list_deployments(app_name).await?;
                if deployments.is_empty() {
                    return Ok(ToolOutput::text(format!(
                        "No deployments found for app {app_name}."
                    )));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&deployments)?))
            }
            "get_invocation" => {
                let invocation_id = required_str(params, "invocation_id")?;
                let invocation = cx.platform.get_invocation(invocation_id).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&invocation)?))
            }
            other => Err(Error::validation(format!("Unknown action: {other}"))),
        }
    }
}
