//! Shell commands inside a session's OS

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_core::Result;

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_u64, required_str};

pub struct ExecCommandTool;

#[async_trait]
impl Tool for ExecCommandTool {
    fn name(&self) -> &str {
        "exec_command"
    }

    fn description(&self) -> &str {
        "Run a shell command inside the OS hosting a browser session and \
         return its output."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session whose OS runs the command"
                },
                "command": {
                    "type": "string",
                    "description": "Command line to execute"
                },
                "timeout_seconds": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Kill the command after this long; forwarded to the platform"
                }
            },
            "required": ["session_id", "command"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let session_id = required_str(&params, "session_id")?;
        let command = required_str(&params, "command")?;
        let timeout = optional_u64(&params, "timeout_seconds");

        let result = cx.platform.exec_command(session_id, command, timeout).await?;
        Ok(ToolOutput::json(&serde_json::to_value(&result)?))
    }
}
