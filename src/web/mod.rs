//! Web server: MOTD page, plain-text endpoints, and the Discord webhook.

mod routes;
pub mod templates;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use ed25519_dalek::VerifyingKey;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::discord::verify;
use crate::events::AppContext;

/// Shared web-layer state.
#[derive(Clone)]
pub struct WebState {
    pub ctx: AppContext,
    /// Application public key, parsed once at startup.
    pub webhook_key: VerifyingKey,
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.web_host, ctx.config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(ctx)?;

    info!(addr = %addr, "Starting web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app).await.context("Web server error")?;

    Ok(())
}

/// Create the main application router.
///
/// # Errors
///
/// Returns an error if the configured Discord public key is unusable.
pub fn create_app(ctx: AppContext) -> Result<Router> {
    let webhook_key = verify::parse_public_key(&ctx.config.discord_public_key)
        .context("Failed to parse Discord public key")?;

    let static_dir = find_static_dir();
    info!(static_dir = ?static_dir, "Serving static files");

    let state = WebState { ctx, webhook_key };

    Ok(Router::new()
        .merge(routes::router())
        .nest_service("/static", ServeDir::new(&static_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Find the static files directory.
///
/// Checks ./static (development) then the installed location, falling back
/// to ./static.
fn find_static_dir() -> PathBuf {
    let candidates = [
        PathBuf::from("./static"),
        PathBuf::from("/usr/share/motd-relay/static"),
    ];

    for path in &candidates {
        if path.exists() && path.is_dir() {
            return path.clone();
        }
    }

    PathBuf::from("./static")
}
