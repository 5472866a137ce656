//! Documentation search

use async_trait::async_trait;
use serde_json::{json, Value};
use wharf_core::{Error, Result};

use crate::protocol::ToolOutput;
use crate::registry::{RequestCx, Tool};
use crate::tools::{optional_u64, required_str};

const DEFAULT_RESULT_LIMIT: u64 = 5;

pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search the platform documentation and return matching pages."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 20,
                    "description": "Maximum results to return (default 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, params: Value, cx: &RequestCx) -> Result<ToolOutput> {
        let query = required_str(&params, "query")?;
        let limit = optional_u64(&params, "limit")
            .unwrap_or(DEFAULT_RESULT_LIMIT)
            .to_string();

        let response = cx
            .http
            .get(&cx.config.docs_search_url)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| Error::upstream(format!("documentation search failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "documentation search returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("documentation search failed: {e}")))?;

        let results = payload
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if results.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No documentation found for \"{query}\"."
            )));
        }

        let mut lines = Vec::with_capacity(results.len());
        for (index, result) in results.iter().enumerate() {
            let title = result
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(untitled)");
            let url = result.get("url").and_then(Value::as_str).unwrap_or("");
            let snippet = result.get("snippet").and_then(Value::as_str).unwrap_or("");
            lines.push(format!("{}. {title}\n   {url}\n   {snippet}", index + 1));
        }
        Ok(ToolOutput::text(lines.join("\n\n")))
    }
}
