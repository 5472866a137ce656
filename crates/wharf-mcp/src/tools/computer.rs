//! OS-level input inside a session

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_i64, optional_str, optional_u64, required_str};

pub struct ComputerActionTool;

#[async_trait]
impl Tool for ComputerActionTool {
    fn name(&self) -> &str {
        "computer_action"
    }

    fn description(&self) -> &str {
        "Drive OS-level input inside a browser session: click, type, press \
         keys, scroll, move the pointer, read its position, or take a \
         screenshot."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["click", "type", "press_key", "scroll", "move", "get_position", "screenshot"],
                    "description": "Input action to perform"
                },
                "session_id": {
                    "type": "string",
                    "description": "Session to act on"
                },
                "x": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Pointer x coordinate (click and move)"
                },
                "y": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Pointer y coordinate (click and move)"
                },
                "text": {
                    "type": "string",
                    "description": "Text to type (type)"
                },
                "key": {
                    "type": "string",
                    "description": "Key or chord to press, e.g. Enter or ctrl+a (press_key)"
                },
                "delta_x": {
                    "type": "integer",
                    "description": "Horizontal scroll amount (scroll)"
                },
                "delta_y": {
                    "type": "integer",
                    "description": "Vertical scroll amount (scroll)"
                }
            },
            "required": ["action", "session_id"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let action = required_str(&params, "action")?.to_string();
        let outcome = self.run(&action, &params, cx).await;
        Ok(outcome.unwrap_or_else(|e| {
            ToolOutput::error(format!("computer_action {action} failed: {e}"))
        }))
    }
}

impl ComputerActionTool {
    async fn run(&self, action: &str, params: &Value, cx: &RequestCx) -> Result<ToolOutput> {
        let session_id = required_str(params, "session_id")?;
        let body = build_action_body(action, params)?;

        let response = cx.platform.computer_action(session_id, &body).await?;

        if action == "screenshot" {
            let data = response
                .get("image")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::upstream("screenshot response carried no image data"))?;
            let mime_type = response
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            return Ok(ToolOutput::image(
                data.to_string(),
                mime_type,
                Some(format!("Screenshot of session {session_id}")),
            ));
        }

        Ok(ToolOutput::json(&response))
    }
}

/// Assemble the platform request for one action, enforcing the per-action
/// parameter requirements first.
fn build_action_body(action: &str, params: &Value) -> Result<Value> {
    let mut body = Map::new();
    body.insert("action".to_string(), json!(action));

    match action {
        "click" | "move" => {
            let x = optional_u64(params, "x");
            let y = optional_u64(params, "y");
            let (Some(x), Some(y)) = (x, y) else {
                return Err(Error::validation(format!(
                    "x and y are both required for {action}"
                )));
            };
            body.insert("x".to_string(), json!(x));
            body.insert("y".to_string(), json!(y));
        }
        "type" => {
            let text = optional_str(params, "text")
                .ok_or_else(|| Error::validation("text is required for type"))?;
            body.insert("text".to_string(), json!(text));
        }
        "press_key" => {
            let key = optional_str(params, "key")
                .ok_or_else(|| Error::validation("key is required for press_key"))?;
            body.insert("key".to_string(), json!(key));
        }
        "scroll" => {
            let delta_x = optional_i64(params, "delta_x");
            let delta_y = optional_i64(params, "delta_y");
            if delta_x.is_none() && delta_y.is_none() {
                return Err(Error::validation(
                    "scroll requires delta_x or delta_y",
                ));
            }
            if let Some(dx) = delta_x {
                body.insert("deltaX".to_string(), json!(dx));
            }
            if let Some(dy) = delta_y {
                body.insert("deltaY".to_string(), json!(dy));
            }
        }
        "get_position" | "screenshot" => {}
        other => {
            return Err(Error::validation(format!("Unknown action: {other}")));
        }
    }

    Ok(Value::Object(body))
}
