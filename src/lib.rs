//! # Tweetauth Library
//!
//! A Rust web service library that authenticates against Twitter/X with the
//! OAuth 2.0 authorization code flow (PKCE), persists the resulting access
//! token to a JSON file, and posts tweets with optional media on behalf of the
//! authenticated user.
//!
//! ## Configuration
//!
//! - `SECRET_KEY`: Key material for the encrypted session cookie
//! - `CLIENT_ID` / `CLIENT_SECRET`: OAuth 2.0 client credentials
//! - `REDIRECT_URI`: Callback URL registered with the Twitter app
//! - `PORT`: Server port (defaults to 5000)
//!
//! ## API Endpoints
//!
//! - `GET /`: Returns a welcome message
//! - `GET /startAuth`: Redirects to Twitter's authorization page
//! - `GET /callback`: Completes authorization and stores the token
//! - `POST /postTweet`: Posts a tweet, optionally with media from a URL

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod media;
pub mod oauth;
pub mod posting;
pub mod session;
pub mod token_store;
pub mod twitter;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Re-export commonly used types and functions
pub use config::{get_server_port, AppConfig};
pub use error::{ApiError, AppError};
pub use handlers::{handle_callback, handle_post_tweet, handle_root, handle_start_auth};
pub use oauth::{OAuthClient, TwitterOAuthClient};
pub use token_store::{TokenRecord, TokenStore};
pub use twitter::{TwitterApi, TwitterClient};

use crypto::SessionCipher;
use media::MediaFetcher;
use session::SessionStore;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<dyn OAuthClient>,
    pub twitter: Arc<dyn TwitterApi>,
    pub tokens: TokenStore,
    pub fetcher: MediaFetcher,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wires the provider clients against the real Twitter endpoints.
    pub fn from_config(config: &AppConfig) -> Self {
        let http = reqwest::Client::new();
        Self::with_clients(
            config,
            Arc::new(TwitterOAuthClient::from_config(config)),
            Arc::new(TwitterClient::new(http.clone())),
            http,
        )
    }

    /// Wires the given provider clients.
    pub fn with_clients(
        config: &AppConfig,
        oauth: Arc<dyn OAuthClient>,
        twitter: Arc<dyn TwitterApi>,
        http: reqwest::Client,
    ) -> Self {
        let secure_cookie = config.redirect_uri.starts_with("https://");
        AppState {
            oauth,
            twitter,
            tokens: TokenStore::new(config.token_file.clone()),
            fetcher: MediaFetcher::new(http, config.media_dir.clone()),
            sessions: SessionStore::new(
                SessionCipher::from_secret(&config.secret_key),
                secure_cookie,
            ),
        }
    }
}

/// Builds the router with all application routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/startAuth", get(handle_start_auth))
        .route("/callback", get(handle_callback))
        .route("/postTweet", post(handle_post_tweet))
        .with_state(state)
}
