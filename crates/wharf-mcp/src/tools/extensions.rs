//! Browser extensions

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::required_str;

pub struct ManageExtensionsTool;

#[async_trait]
impl Tool for ManageExtensionsTool {
    fn name(&self) -> &str {
        "manage_extensions"
    }

    fn description(&self) -> &str {
        "List and delete browser extensions uploaded to the platform."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "delete"],
                    "description": "Operation to perform"
                },
                "extension_id": {
                    "type": "string",
                    "description": "Target extension (required for delete)"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("manage_extensions {action} failed: {e}"))
        }))
    }
}

impl ManageExtensionsTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "list" => {
                let extensions = cx.platform.list_extensions().await?;
                if extensions.is_empty() {
                    return Ok(ToolOutput::text("No extensions found."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&extensions)?))
            }
            "delete" => {
                let extension_id = required_str(params, "extension_id")?;
                cx.platform.delete_extension(extension_id).await?;
                Ok(ToolOutput::text(format!("Deleted extension {extension_id}")))
            }
            other => Err(Error::validation(format!("Unknown action: {other}"))),
        }
    }
}
