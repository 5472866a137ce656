//! Browser session lifecycle

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_client::{CreateBrowserRequest, Viewport};
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_bool, optional_str, optional_u64, required_str};

pub struct ManageBrowsersTool;

#[async_trait]
impl Tool for ManageBrowsersTool {
    fn name(&self) -> &str {
        "manage_browsers"
    }

    fn description(&self) -> &str {
        "Create, list, inspect, and delete cloud browser sessions. New sessions \
         can load a saved profile, route through a proxy, and set a viewport."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "list", "get", "delete"],
                    "description": "Operation to perform"
                },
                "session_id": {
                    "type": "string",
                    "description": "Target session (required for get and delete)"
                },
                "profile_name": {
                    "type": "string",
                    "description": "Saved profile to load at creation. Mutually exclusive with profile_id."
                },
                "profile_id": {
                    "type": "string",
                    "description": "Saved profile id to load at creation. Mutually exclusive with profile_name."
                },
                "proxy_id": {
                    "type": "string",
                    "description": "Existing proxy to route the session through"
                },
                "proxy_type": {
                    "type": "string",
                    "enum": ["residential", "datacenter", "mobile", "custom"],
                    "description": "Provision an ad-hoc proxy of this type instead of proxy_id"
                },
                "proxy_country_code": {
                    "type": "string",
                    "description": "Two-letter country code for an ad-hoc proxy"
                },
                "headless": {
                    "type": "boolean",
                    "description": "Run without a visible display (default false)"
                },
                "viewport_width": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Viewport width in pixels; requires viewport_height"
                },
                "viewport_height": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Viewport height in pixels; requires viewport_width"
                },
                "idle_timeout_minutes": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Close the session after this much inactivity"
                },
                "max_duration_minutes": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Hard cap on session lifetime"
                }
            },
            "required": ["action"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("manage_browsers {action} failed: {e}"))
        }))
    }
}

impl ManageBrowsersTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        match action {
            "create" => self.create(params, cx).await,
            "list" => {
                let browsers = cx.platform.list_browsers().await?;
                if browsers.is_empty() {
                    return Ok(ToolOutput::text("No browser sessions are running."));
                }
                Ok(ToolOutput::json(&serde_json::to_value(&browsers)?))
            }
            "get" => {
                let session_id = required_str(params, "session_id")?;
                let browser = cx.platform.get_browser(session_id).await?;
                Ok(ToolOutput::json(&serde_json::to_value(&browser)?))
            }
            "delete" => {
                let session_id = required_str(params, "session_id")?;
                cx.platform.delete_browser(session_id).await?;
                Ok(ToolOutput::text(format!(
                    "Deleted browser session {session_id}"
                )))
            }
            other => Err(Error::validation(format!("Unknown action: {other}"))),
        }
    }

    async fn create(&self, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        // Preconditions before any platform call.
        let profile_name = optional_str(params, "profile_name");
        let profile_id = optional_str(params, "profile_id");
        if profile_name.is_some() && profile_id.is_some() {
            return Err(Error::validation(
                "profile_name and profile_id are mutually exclusive",
            ));
        }

        let width = optional_u64(params, "viewport_width");
        let height = optional_u64(params, "viewport_height");
        if width.is_some() != height.is_some() {
            return Err(Error::validation(
                "viewport_width and viewport_height must be provided together",
            ));
        }

        let request = CreateBrowserRequest {
            profile_name: profile_name.map(str::to_string),
            profile_id: profile_id.map(str::to_string),
            proxy_id: optional_str(params, "proxy_id").map(str::to_string),
            proxy_type: optional_str(params, "proxy_type").map(str::to_string),
            proxy_country_code: optional_str(params, "proxy_country_code").map(str::to_string),
            headless: optional_bool(params, "headless"),
            viewport: width
                .zip(height)
                .map(|(width, height)| Viewport { width, height }),
            idle_timeout_minutes: optional_u64(params, "idle_timeout_minutes"),
            max_duration_minutes: optional_u64(params, "max_duration_minutes"),
        };

        let browser = cx.platform.create_browser(&request).await?;
        Ok(ToolOutput::json(&serde_json::to_value(&browser)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests_support::offline_cx;

    #[tokio::test]
    async fn create_rejects_profile_name_and_id_together() {
        let cx = offline_cx();
        let output = ManageBrowsersTool
            .call(
                json!({
                    "action": "create",
                    "profile_name": "work",
                    "profile_id": "prof-1"
                }),
                &cx,
            )
            .await
            .unwrap();
        assert!(output.is_error);
        let text = crate::tools::tests_support::first_text(&output);
        assert!(text.contains("mutually exclusive"), "{text}");
    }

    #[tokio::test]
    async fn create_rejects_half_a_viewport() {
        let cx = offline_cx();
        let output = ManageBrowsersTool
            .call(json!({"action": "create", "viewport_width": 1280}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        let text = crate::tools::tests_support::first_text(&output);
        assert!(text.contains("provided together"), "{text}");
    }

    #[tokio::test]
    async fn get_requires_a_session_id() {
        let cx = offline_cx();
        let output = ManageBrowsersTool
            .call(json!({"action": "get"}), &cx)
            .await
            .unwrap();
        assert!(output.is_error);
        let text = crate::tools::tests_support::first_text(&output);
        assert!(text.contains("session_id"), "{text}");
    }
}
