//! Resource providers
//!
//! Maps `scheme://` URIs onto the platform's entity namespace. Every
//! provider resolves the same way: the bare scheme root lists, a single
//! identifier gets, anything else is an invalid URI. Identifier extraction
//! is a pure prefix strip with no decoding.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use wharf_core::{Error, Result};

use crate::registry::RequestCx;

/// Resource metadata for `resources/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// One URI scheme backed by a platform list/get pair.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Scheme without the `://` suffix, e.g. `profiles`.
    fn scheme(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Render the full entity listing. Must never render empty content:
    /// zero items become a plain-text sentinel.
    async fn list(&self, cx: &RequestCx) -> Result<String>;

    /// Render a single entity; a missing entity is an explicit not-found
    /// error, never a null body.
    async fn get(&self, id: &str, cx: &RequestCx) -> Result<String>;
}

/// Immutable provider registry, one entry per scheme.
pub struct ResourceRegistry {
    providers: Vec<Arc<dyn ResourceProvider>>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            providers: vec![
                Arc::new(ProfilesProvider),
                Arc::new(BrowsersProvider),
                Arc::new(PoolsProvider),
                Arc::new(AppsProvider),
            ],
        }
    }

    /// Root URIs advertised to clients.
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        self.providers
            .iter()
            .map(|p| ResourceInfo {
                uri: format!("{}://", p.scheme()),
                name: p.name().to_string(),
                description: p.description().to_string(),
                mime_type: "text/plain".to_string(),
            })
            .collect()
    }

    /// Resolve a URI against the owning provider.
    pub async fn resolve(&self, uri: &str, cx: &RequestCx) -> Result<String> {
        for provider in &self.providers {
            let root = format!("{}://", provider.scheme());
            if let Some(id) = uri.strip_prefix(root.as_str()) {
                if id.is_empty() {
                    return provider.list(cx).await;
                }
                return provider.get(id, cx).await;
            }
        }
        Err(Error::invalid_uri(uri.to_string()))
    }
}

fn render_list<T: Serialize>(items: &[T], sentinel: &str) -> Result<String> {
    if items.is_empty() {
        return Ok(sentinel.to_string());
    }
    Ok(serde_json::to_string_pretty(items)?)
}

fn render_entity<T: Serialize>(entity: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(entity)?)
}

struct ProfilesProvider;

#[async_trait]
impl ResourceProvider for ProfilesProvider {
    fn scheme(&self) -> &str {
        "profiles"
    }

    fn name(&self) -> &str {
        "Browser profiles"
    }

    fn description(&self) -> &str {
        "Saved browser profiles; append a profile name for one profile"
    }

    async fn list(&self, cx: &RequestCx) -> Result<String> {
        let profiles = cx.platform.list_profiles().await?;
        render_list(&profiles, "No profiles found.")
    }

    async fn get(&self, id: &str, cx: &RequestCx) -> Result<String> {
        let profile = cx.platform.get_profile(id).await?;
        render_entity(&profile)
    }
}

struct BrowsersProvider;

#[async_trait]
impl ResourceProvider for BrowsersProvider {
    fn scheme(&self) -> &str {
        "browsers"
    }

    fn name(&self) -> &str {
        "Browser sessions"
    }

    fn description(&self) -> &str {
        "Running browser sessions; append a session id for one session"
    }

    async fn list(&self, cx: &RequestCx) -> Result<String> {
        let browsers = cx.platform.list_browsers().await?;
        render_list(&browsers, "No browser sessions are running.")
    }

    async fn get(&self, id: &str, cx: &RequestCx) -> Result<String> {
        let browser = cx.platform.get_browser(id).await?;
        render_entity(&browser)
    }
}

struct PoolsProvider;

#[async_trait]
impl ResourceProvider for PoolsProvider {
    fn scheme(&self) -> &str {
        "browser_pools"
    }

    fn name(&self) -> &str {
        "Browser pools"
    }

    fn description(&self) -> &str {
        "Pre-warmed browser pools; append a pool id or name for one pool"
    }

    async fn list(&self, cx: &RequestCx) -> Result<String> {
        let pools = cx.platform.list_pools().await?;
        render_list(&pools, "No browser pools found.")
    }

    async fn get(&self, id: &str, cx: &RequestCx) -> Result<String> {
        let pool = cx.platform.get_pool(id).await?;
        render_entity(&pool)
    }
}

struct AppsProvider;

#[async_trait]
impl ResourceProvider for AppsProvider {
    fn scheme(&self) -> &str {
        "apps"
    }

    fn name(&self) -> &str {
        "Automation apps"
    }

    fn description(&self) -> &str {
        "Deployed automation apps; append an app name for one app"
    }

    async fn list(&self, cx: &RequestCx) -> Result<String> {
        let apps = cx.platform.list_apps().await?;
        render_list(&apps, "No apps found.")
    }

    async fn get(&self, id: &str, cx: &RequestCx) -> Result<String> {
        let app = cx.platform.get_app(id).await?;
        render_entity(&app)
    }
}
