//! Saved browser profiles

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_str, required_str};

pub struct ManageProfilesTool;

#[async_trait]
impl Tool for ManageProfilesTool {
    fn name(&self) -> &str {
        "manage_profiles"
    }

    fn description(&self) -> &str {
        "Capture, list, and delete saved browser profiles. Setup captures the \
         cookies and storage of a running session under a profile name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["setup", "list", "delete"],
                    "description": "Operation to perform"
                },
                "name": {
                    "type": "string",
                    "description": "Profile name (required for setup and delete)"
                },
                "session_id": {
                    "type": "string",
                    "description": "Session to capture from (required for setup)"
                },
                "description": {
                    "type": "string",
                    "description": "Free-form note stored with the profile"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("manage_profiles {action} failed: {e}"))
        }))
    }
}

impl ManageProfilesTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "setup" => {
                // Setup needs both the new name and a live session to capture.
                let name = required_str(params, "name")?;
                let session_id = required_str(params, "session_id")?;
                let description = optional_str(params, "description");
                let profile = cx
                    .platform
                    .setup_profile(name, session_id, description)
                    .await?;
                Ok(ToolOutput::json(&serde_json::to_value(&profile)?))
            }
            "list" => {
                let profiles = cx.platform.list_profiles().await?;
                if profiles.is_empty() {
                    return Ok(ToolOutput::text("No profiles found."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&profiles)?))
            }
            "delete" => {
                let name = required_str(params, "name")?;
                cx.platform.delete_profile(name).await?;
                Ok(ToolOutput::text(format!("Deleted profile {name}")))
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
    async fn setup_requires_name_and_session() {
        let cx = offline_cx();
        let output = ManageProfilesTool
            .call(json!({"action": "setup", "name": "work"}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("session_id"));

        let output = ManageProfilesTool
            .call(json!({"action": "setup", "session_id": "s-1"}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(first_text(&output).contains("name"));
    }
}
