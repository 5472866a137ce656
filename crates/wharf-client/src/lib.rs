//! wharf-client: typed client for the wharf platform API
//!
//! A per-request adapter between the MCP gateway and the remote
//! browser-automation platform. Covers the entity endpoints (browsers,
//! profiles, pools, proxies, extensions, apps), session operations
//! (computer input, exec, Playwright), replays, and the invocation event
//! stream.

pub mod client;
pub mod invocations;
pub mod types;

pub use client::{
    CreateBrowserRequest, CreatePoolRequest, CreateProxyRequest, PlatformClient, Viewport,
};
pub use invocations::{follow_invocation, InvocationEventStream};
pub use types::{
    App, Browser, BrowserPool, Deployment, ExecResult, Extension, Invocation, InvocationEvent,
    InvocationStatus, Page, Profile, Proxy, Replay,
};
