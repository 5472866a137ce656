//! Prompt catalogue
//!
//! Declarative prompt templates served over `prompts/list` and
//! `prompts/get`. Pure prose; no platform calls.

use serde_json::{json, Value};

const AUTOMATION_QUICKSTART: &str = "\
You are driving a cloud browser through the wharf gateway. A typical flow:\n\
1. Create a session with manage_browsers (action=create). Load a saved \
profile with profile_name if the target site needs an existing login.\n\
2. Drive the page with execute_playwright_code, passing the session_id you \
created. The code receives a connected `page` object.\n\
3. Use computer_action for raw input (clicks, typing, screenshots) when \
page-level automation is not enough.\n\
4. Delete the session with manage_browsers (action=delete) when finished, \
or let its idle timeout reclaim it.\n\
Prefer one long-lived session over many short ones; creation is the slow \
part. search_docs answers questions about platform behavior.";

const SESSION_TROUBLESHOOTING: &str = "\
A browser session is misbehaving. Work through it in this order:\n\
1. manage_browsers (action=get) with the session_id: confirm the session \
still exists and note its status.\n\
2. computer_action (action=screenshot): look at what the page actually \
shows; most \"stuck\" sessions are sitting on a dialog or captcha.\n\
3. exec_command with a short diagnostic (e.g. `ps aux | head`) if the OS \
side seems wedged.\n\
4. If the session is beyond recovery, delete it and create a fresh one; \
saved profiles make that cheap.";

/// Static prompt registry. Built once; read-only.
pub struct PromptRegistry;

impl PromptRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Descriptors for `prompts/list`.
    pub fn list(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "automation_quickstart",
                "description": "How to drive a cloud browser session end-to-end",
                "arguments": []
            }),
            json!({
                "name": "session_troubleshooting",
                "description": "Diagnose a stuck or misbehaving browser session",
                "arguments": [
                    {
                        "name": "session_id",
                        "description": "Session to investigate",
                        "required": false
                    }
                ]
            }),
        ]
    }

    /// Render a prompt for `prompts/get`. Unknown names return `None`.
    pub fn get(&self, name: &str, arguments: &Value) -> Option<Value> {
        let text = match name {
            "automation_quickstart" => AUTOMATION_QUICKSTART.to_string(),
            "session_troubleshooting" => {
                let mut text = SESSION_TROUBLESHOOTING.to_string();
                if let Some(session_id) = arguments.get("session_id").and_then(Value::as_str) {
                    text.push_str(&format!("\nThe session under investigation: {session_id}"));
                }
                text
            }
            _ => return None,
        };

        Some(json!({
            "description": format!("wharf prompt: {name}"),
            "messages": [
                {
                    "role": "user",
                    "content": { "type": "text", "text": text }
                }
            ]
        }))
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}
