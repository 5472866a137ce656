//! Tool handlers
//!
//! One module per platform concern. Every handler follows the same
//! convention: handler-local precondition checks first (expected user
//! input mistakes, rendered as text-error envelopes), then platform calls
//! whose failures are wrapped naming the tool and action.

pub mod apps;
pub mod browsers;
pub mod computer;
pub mod docs;
pub mod exec;
pub mod extensions;
pub mod playwright;
pub mod pools;
pub mod profiles;
pub mod proxies;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use wharf_core::{Error, Result};

use crate::registry::{BoxedTool, ToolRegistry};

/// Build the full tool registry. Called once at process start.
pub fn build_registry() -> Result<ToolRegistry> {
    let tools: Vec<BoxedTool> = vec![
        Arc::new(docs::SearchDocsTool),
        Arc::new(browsers::ManageBrowsersTool),
        Arc::new(profiles::ManageProfilesTool),
        Arc::new(pools::ManageBrowserPoolsTool),
        Arc::new(proxies::ManageProxiesTool),
        Arc::new(extensions::ManageExtensionsTool),
        Arc::new(apps::ManageAppsTool),
        Arc::new(computer::ComputerActionTool),
        Arc::new(exec::ExecCommandTool),
        Arc::new(playwright::ExecutePlaywrightCodeTool),
    ];
    ToolRegistry::build(tools)
}

/// Fetch a required string parameter.
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::validation(format!("Missing required parameter: {key}")))
}

/// Fetch an optional string parameter, treating empty strings as absent.
pub(crate) fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub(crate) fn optional_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

pub(crate) fn optional_i64(params: &Value, key: &str) -> Option<i64> {
    params.get(key).and_then(Value::as_i64)
}

pub(crate) fn optional_bool(params: &Value, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

/// Run a side operation whose failure must never affect the primary
/// result: the error is observed, logged, and discarded.
pub(crate) fn best_effort<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{what} failed (ignored): {e}");
            None
        }
    }
}
