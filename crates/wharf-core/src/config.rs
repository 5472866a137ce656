//! Environment Configuration Loader
//!
//! Loads environment variables from the canonical location
//! (`/etc/wharf/environment`), then snapshots the gateway configuration
//! exactly once. Request handling never re-reads the environment.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

/// Paths checked for an environment file, in order of priority.
pub const ENV_FILE_PATHS: &[&str] = &["/etc/wharf/environment", "/etc/wharf.env", ".env"];

/// Default base URL of the platform API.
pub const DEFAULT_API_URL: &str = "https://api.wharf.dev";

/// Default base URL of the identity provider's verification API.
pub const DEFAULT_IDENTITY_API_URL: &str = "https://id.wharf.dev";

/// Default endpoint of the documentation search backend.
pub const DEFAULT_DOCS_SEARCH_URL: &str = "https://docs.wharf.dev/api/search";

/// Gateway configuration snapshot.
///
/// Built once at startup from the process environment and shared by
/// reference afterwards; see [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the platform API (`WHARF_API_URL`).
    pub api_url: String,
    /// Base URL of the identity provider (`WHARF_IDENTITY_API_URL`).
    pub identity_api_url: String,
    /// Server-held secret for identity token verification
    /// (`WHARF_IDENTITY_SECRET`). Absent means the structured-token path
    /// cannot verify and rejects with an authentication error.
    pub identity_secret: Option<String>,
    /// Documentation search endpoint (`WHARF_DOCS_SEARCH_URL`).
    pub docs_search_url: String,
}

impl Config {
    /// Snapshot the configuration from the current environment.
    pub fn from_env() -> Self {
        Self {
            api_url: get_config("WHARF_API_URL", DEFAULT_API_URL),
            identity_api_url: get_config("WHARF_IDENTITY_API_URL", DEFAULT_IDENTITY_API_URL),
            identity_secret: get_config_opt("WHARF_IDENTITY_SECRET"),
            docs_search_url: get_config("WHARF_DOCS_SEARCH_URL", DEFAULT_DOCS_SEARCH_URL),
        }
    }
}

/// Load environment variables from the canonical configuration file.
///
/// Checks `/etc/wharf/environment` first (system-wide), then `.env` in the
/// current directory (development). Existing environment variables are
/// never overridden. Returns the path that was loaded, if any.
pub fn load_environment() -> Option<String> {
    if let Ok(custom_path) = std::env::var("WHARF_ENV_FILE") {
        if let Some(path) = try_load_env_file(&custom_path) {
            return Some(path);
        }
    }

    for path in ENV_FILE_PATHS {
        if let Some(loaded_path) = try_load_env_file(path) {
            return Some(loaded_path);
        }
    }

    debug!("No environment file found, using existing environment");
    None
}

/// Try to load an environment file from the given path.
fn try_load_env_file(path: &str) -> Option<String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return None;
    }

    match fs::read_to_string(path_obj) {
        Ok(content) => {
            let mut loaded = 0;

            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = parse_env_line(line) {
                    // Existing variables win
                    if std::env::var(&key).is_err() {
                        std::env::set_var(&key, &value);
                        loaded += 1;
                        let shown = if key.contains("SECRET") || key.contains("KEY") {
                            "***"
                        } else {
                            &value
                        };
                        debug!("Loaded: {}={}", key, shown);
                    }
                }
            }

            info!("Loaded {} environment variables from {}", loaded, path);
            Some(path.to_string())
        }
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            None
        }
    }
}

/// Parse a single environment line into a key-value pair.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    // Handles KEY=VALUE, KEY="VALUE", KEY='VALUE'
    let mut parts = line.splitn(2, '=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();

    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_line_simple() {
        let (k, v) = parse_env_line("FOO=bar").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar");
    }

    #[test]
    fn parse_env_line_quoted() {
        let (k, v) = parse_env_line("FOO=\"bar baz\"").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar baz");
    }

    #[test]
    fn parse_env_line_rejects_empty_key() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("=value").is_none());
    }

    #[test]
    fn config_defaults_apply() {
        std::env::remove_var("WHARF_DOCS_SEARCH_URL");
        let config = Config::from_env();
        assert_eq!(config.docs_search_url, DEFAULT_DOCS_SEARCH_URL);
    }

    #[test]
    fn env_file_loads_but_never_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environment");
        std::fs::write(
            &path,
            "WHARF_TEST_PRESET=from-file\n# comment\nWHARF_TEST_FRESH=\"quoted value\"\n",
        )
        .unwrap();

        std::env::set_var("WHARF_TEST_PRESET", "preset");
        std::env::remove_var("WHARF_TEST_FRESH");

        let loaded = try_load_env_file(path.to_str().unwrap());
        assert!(loaded.is_some());
        assert_eq!(std::env::var("WHARF_TEST_PRESET").unwrap(), "preset");
        assert_eq!(std::env::var("WHARF_TEST_FRESH").unwrap(), "quoted value");
    }
}
