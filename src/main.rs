//! # Tweetauth
//!
//! A Rust web service that lets a browser authorize this app against Twitter/X
//! with OAuth 2.0 (authorization code + PKCE), stores the access token, and
//! posts tweets with optional media.
//!
//! ## Environment Variables
//!
//! - `SECRET_KEY`, `CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`: required
//! - `PORT`: Server port (defaults to 5000)
//! - `TOKEN_FILE`, `TOKENS_DIR`, `MEDIA_DIR`: storage locations
//!
//! A `.env` file in the working directory is loaded first if present.

use log::{error, info};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use tweetauth::{build_router, get_server_port, AppConfig, AppState};

/// Main entry point for the tweetauth web service.
///
/// Initializes logging, loads configuration, prepares the storage directories,
/// and serves the routes until Ctrl+C is received.
///
/// # Logging
///
/// The application uses the `env_logger` crate for structured logging. Log levels
/// can be controlled via the `RUST_LOG` environment variable.
///
/// # Example Usage
///
/// ```bash
/// # Run with default port 5000
/// cargo run
///
/// # Run with debug logging
/// RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // A missing .env file is fine; the environment may already be populated
    let dotenv = dotenvy::dotenv();

    // Initialize the logging system
    env_logger::init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = AppConfig::from_env()?;

    tokio::fs::create_dir_all(&config.tokens_dir).await?;
    tokio::fs::create_dir_all(&config.media_dir).await?;

    let state = AppState::from_config(&config);

    // Build the HTTP application with all routes and middleware
    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let port = get_server_port();
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    info!("Starting tweetauth server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
