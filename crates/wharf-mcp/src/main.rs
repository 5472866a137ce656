//! wharf-mcp-server: authenticated MCP gateway for the wharf platform
//!
//! Usage:
//!   wharf-mcp-server                          # listen on 0.0.0.0:8080
//!   wharf-mcp-server --bind 127.0.0.1:3001
//!   wharf-mcp-server --log-level debug
//!
//! Configuration comes from the environment (loaded once at startup from
//! /etc/wharf/environment or .env):
//!   WHARF_API_URL            platform API base override
//!   WHARF_IDENTITY_API_URL   identity provider base
//!   WHARF_IDENTITY_SECRET    secret for identity token verification
//!   WHARF_DOCS_SEARCH_URL    documentation search endpoint

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wharf_core::config::{load_environment, Config};
use wharf_mcp::auth::{AuthGate, IdentityVerifier};
use wharf_mcp::{AppState, McpServer};

#[derive(Parser)]
#[command(name = "wharf-mcp-server")]
#[command(about = "Authenticated MCP gateway for the wharf platform")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Server name override
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr; stdout stays clean for anything piping the process.
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Environment is read exactly once, before any request.
    load_environment();
    let config = Arc::new(Config::from_env());
    if config.identity_secret.is_none() {
        info!("WHARF_IDENTITY_SECRET not set; only opaque API keys will authenticate");
    }

    let http = reqwest::Client::new();
    let verifier = IdentityVerifier::new(http.clone(), &config);
    let gate = Arc::new(AuthGate::new(verifier));
    let server = Arc::new(McpServer::new(cli.name)?);

    info!(
        tools = server.tool_count(),
        api_url = %config.api_url,
        "Starting wharf-mcp-server"
    );

    let state = AppState {
        server,
        gate,
        http,
        config,
    };
    wharf_mcp::serve(state, &cli.bind).await
}
