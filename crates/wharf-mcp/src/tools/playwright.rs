//! Playwright code execution
//!
//! The one tool that allocates a transient resource: when no session is
//! supplied, it creates one solely for this call and is responsible for
//! deleting it again on both the success and the failure path. Replay
//! recording around the execution is best-effort throughout.

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_client::CreateBrowserRequest;
use wharf_core::Result;

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{best_effort, optional_str, optional_u64, required_str};

pub struct ExecutePlaywrightCodeTool;

#[async_trait]
impl Tool for ExecutePlaywrightCodeTool {
    fn name(&self) -> &str {
        "execute_playwright_code"
    }

    fn description(&self) -> &str {
        "Execute Playwright code against a browser session. Reuses session_id \
         when given; otherwise creates a throwaway session for this call and \
         deletes it afterwards. A session replay is recorded when available."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Playwright code to run. Receives a connected `page` object."
                },
                "session_id": {
                    "type": "string",
                    "description": "Existing session to run against; omit to use a fresh one"
                },
                "timeout_seconds": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Execution timeout; forwarded to the platform"
                }
            },
            "required": ["code"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let code = required_str(&params, "code")?;
        let timeout = optional_u64(&params, "timeout_seconds");

        // REUSE the caller's session or CREATE one owned by this call.
        let (session_id, owned) = match optional_str(&params, "session_id") {
            Some(id) => (id.to_string(), false),
            None => {
                let browser = cx
                    .platform
                    .create_browser(&CreateBrowserRequest::default())
                    .await?;
                (browser.session_id, true)
            }
        };

        let replay = best_effort(
            "replay start",
            cx.platform.start_replay(&session_id).await,
        );

        let outcome = cx.platform.execute_playwright(&session_id, code, timeout).await;

        // Replay stop and owned-session cleanup run on success and failure
        // alike; their own failures never mask the primary outcome.
        if let Some(ref replay) = replay {
            best_effort(
                "replay stop",
                cx.platform.stop_replay(&replay.replay_id).await,
            );
        }
        if owned {
            best_effort(
                "session cleanup",
                cx.platform.delete_browser(&session_id).await,
            );
        }

        let result = outcome?;

        let mut rendered = json!({
            "session_id": session_id,
            "result": result,
        });
        if let Some(replay) = replay {
            if let Some(view_url) = replay.view_url {
                rendered["replay_url"] = json!(view_url);
            }
        }
        Ok(ToolOutput::json(&rendered))
    }
}
