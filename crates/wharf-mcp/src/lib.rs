//! wharf-mcp: authenticated MCP gateway for the wharf platform
//!
//! Exposes the platform's remote-automation capabilities (browsers,
//! profiles, pools, proxies, apps, code execution, OS input) to AI-agent
//! clients over the Model Context Protocol, with per-request bearer
//! authentication in front of every verb.
//!
//! Request path:
//! HTTP → auth gate (classify credential, build AuthContext) → JSON-RPC
//! dispatch → tool registry / resource providers → platform client.

pub mod auth;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod router;
pub mod server;
pub mod tools;

/// MCP protocol revision implemented here.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Fixed identifier of this gateway; also the `client_id` stamped into
/// every AuthContext.
pub const SERVER_NAME: &str = "wharf-mcp";

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use auth::{AuthContext, AuthGate, CredentialShape, IdentityVerifier};
pub use protocol::{ContentItem, JsonRpcError, McpRequest, McpResponse, ToolOutput};
pub use registry::{RequestCx, Tool, ToolRegistry};
pub use router::{create_router, serve, AppState};
pub use server::McpServer;
