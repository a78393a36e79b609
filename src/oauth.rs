//! OAuth 2.0 authorization code flow with PKCE for Twitter/X.
//!
//! This module generates the PKCE verifier/challenge pair and CSRF state,
//! builds the authorization URL, and exchanges authorization codes for
//! access tokens. The exchange sits behind the [`OAuthClient`] trait so the
//! HTTP layer can be exercised without contacting Twitter.

use async_trait::async_trait;
use base64::Engine;
use log::{debug, error, info};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::{mask_secret, AppConfig};
use crate::error::ApiError;
use crate::twitter::sanitize_for_logging;

/// Twitter's OAuth 2.0 authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// Twitter's OAuth 2.0 token endpoint.
pub const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// Scopes requested during authorization.
pub const SCOPES: &[&str] = &["users.read", "tweet.read", "tweet.write"];

/// Token lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: i64 = 7200;

const PKCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Generates a cryptographically secure random string from the PKCE charset.
fn random_pkce_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..PKCE_CHARSET.len());
            PKCE_CHARSET[idx] as char
        })
        .collect()
}

/// Generates a 128-character PKCE code verifier.
pub fn generate_code_verifier() -> String {
    random_pkce_string(128)
}

/// Generates a CSRF state token.
pub fn generate_state() -> String {
    random_pkce_string(32)
}

/// Generates code challenge from code verifier using SHA256
pub fn generate_code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    let hash = hasher.finalize();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
}

/// Builds the authorization URL for Twitter OAuth 2.0
pub fn build_authorization_url(
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("state", state)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256");
    Ok(url.to_string())
}

/// Builds the Authorization header for OAuth 2.0 User Context authentication.
///
/// # Example
///
/// ```rust
/// use tweetauth::oauth::build_oauth2_user_context_header;
///
/// let header = build_oauth2_user_context_header("your_access_token");
/// assert_eq!(header, "Bearer your_access_token");
/// ```
pub fn build_oauth2_user_context_header(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}

/// An authorization URL together with the secrets needed to finish the flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub code_verifier: String,
    pub state: String,
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub scope: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Lifetime in seconds, falling back to [`DEFAULT_EXPIRES_IN`].
    pub fn lifetime_secs(&self) -> i64 {
        self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)
    }
}

/// The provider side of the authorization code flow.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Creates a fresh authorization URL with its PKCE verifier and state.
    fn authorization_request(&self) -> Result<AuthorizationRequest, ApiError>;

    /// Exchanges an authorization code and its PKCE verifier for an access token.
    async fn exchange_code(&self, code: &str, code_verifier: &str)
        -> Result<TokenResponse, ApiError>;
}

/// [`OAuthClient`] talking to Twitter's OAuth 2.0 endpoints.
#[derive(Debug, Clone)]
pub struct TwitterOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
}

impl TwitterOAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        TwitterOAuthClient {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        )
    }
}

#[async_trait]
impl OAuthClient for TwitterOAuthClient {
    fn authorization_request(&self) -> Result<AuthorizationRequest, ApiError> {
        let code_verifier = generate_code_verifier();
        let state = generate_state();
        let code_challenge = generate_code_challenge(&code_verifier);

        let url = build_authorization_url(
            &self.client_id,
            &self.redirect_uri,
            &state,
            &code_challenge,
        )
        .map_err(|e| ApiError::Malformed(format!("invalid authorization URL: {}", e)))?;

        Ok(AuthorizationRequest {
            url,
            code_verifier,
            state,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, ApiError> {
        info!("Exchanging authorization code for access token");

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        info!("Token endpoint responded with status: {}", status);

        if !status.is_success() {
            error!("Token exchange failed - Status: {}", status);
            debug!("Token error response: {}", sanitize_for_logging(&body, 200));
            return Err(ApiError::Status {
                operation: "token exchange",
                status,
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        debug!(
            "Received access token {} with scope '{}'",
            mask_secret(&token.access_token),
            token.scope
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 128);
        assert!(verifier.bytes().all(|b| PKCE_CHARSET.contains(&b)));
        assert_ne!(verifier, generate_code_verifier());
    }

    #[test]
    fn test_code_challenge_matches_rfc7636_example() {
        // Appendix B of RFC 7636
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGKSx0Fe1c"
        );
    }

    #[test]
    fn test_authorization_url_carries_pkce_parameters() {
        let url = build_authorization_url(
            "client-123",
            "http://localhost:5000/callback",
            "state-abc",
            "challenge-xyz",
        )
        .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("twitter.com"));
        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["redirect_uri"], "http://localhost:5000/callback");
        assert_eq!(query["scope"], "users.read tweet.read tweet.write");
        assert_eq!(query["state"], "state-abc");
        assert_eq!(query["code_challenge"], "challenge-xyz");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_authorization_request_challenge_matches_verifier() {
        let client = TwitterOAuthClient::new("id", "secret", "http://localhost/callback");
        let request = client.authorization_request().unwrap();

        let parsed = Url::parse(&request.url).unwrap();
        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        assert_eq!(query["state"], request.state);
        assert_eq!(
            query["code_challenge"],
            generate_code_challenge(&request.code_verifier)
        );
    }

    #[test]
    fn test_token_response_defaults_lifetime() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"token_type":"bearer","access_token":"abc","scope":"tweet.read"}"#,
        )
        .unwrap();
        assert_eq!(token.lifetime_secs(), 7200);

        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","scope":"tweet.read","expires_in":60}"#,
        )
        .unwrap();
        assert_eq!(token.lifetime_secs(), 60);
    }
}
