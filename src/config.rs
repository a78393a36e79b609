//! Configuration module for the tweetauth service.
//!
//! This module contains the configuration structure and environment variable handling
//! for the OAuth 2.0 flow, token persistence and media staging.

use log::{debug, error, info};
use std::env;
use std::path::PathBuf;

/// Default location of the persisted token record.
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Default directory created at startup for token material.
pub const DEFAULT_TOKENS_DIR: &str = "tokens";

/// Application configuration loaded once at startup.
///
/// Holds the OAuth 2.0 client credentials used for the authorization code flow,
/// the secret key protecting the session cookie, and the filesystem locations
/// the service reads and writes.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Key material for the encrypted session cookie
    pub secret_key: String,
    /// The Client ID for OAuth 2.0 operations
    pub client_id: String,
    /// The Client Secret for OAuth 2.0 operations
    pub client_secret: String,
    /// The callback URL registered with the Twitter app
    pub redirect_uri: String,
    /// Static OAuth 1.0a access token (not used by the OAuth 2.0 flow)
    pub access_token: Option<String>,
    /// Static OAuth 1.0a access token secret (not used by the OAuth 2.0 flow)
    pub access_token_secret: Option<String>,
    /// Where the token record is persisted
    pub token_file: PathBuf,
    /// Directory created at startup for token material
    pub tokens_dir: PathBuf,
    /// Directory downloaded media is staged in before upload
    pub media_dir: PathBuf,
}

/// Masks a secret for logging, keeping at most the first 8 characters.
///
/// # Example
///
/// ```rust
/// use tweetauth::config::mask_secret;
///
/// assert_eq!(mask_secret("abcdefghijklmnop"), "abcdefgh...");
/// assert_eq!(mask_secret("abc"), "abc...");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    format!("{}...", prefix)
}

fn required_var(name: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!("Found {} environment variable", name);
            debug!("{} (masked): {}", name, mask_secret(&value));
            Ok(value)
        }
        Ok(_) => {
            error!("{} environment variable is empty", name);
            Err(format!("{} environment variable cannot be empty", name).into())
        }
        Err(e) => {
            error!("Failed to load {} from environment: {}", name, e);
            Err(format!("Missing {} environment variable: {}", name, e).into())
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => {
            debug!("{} (masked): {}", name, mask_secret(&value));
            Some(value)
        }
        _ => {
            debug!("No {} found in environment variables", name);
            None
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by loading settings from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `SECRET_KEY`: Key material for the encrypted session cookie
    /// - `CLIENT_ID`: Client ID for OAuth 2.0 operations
    /// - `CLIENT_SECRET`: Client Secret for OAuth 2.0 operations
    /// - `REDIRECT_URI`: Callback URL registered with the Twitter app
    ///
    /// # Optional Environment Variables
    ///
    /// - `ACCESS_TOKEN` / `ACCESS_TOKEN_SECRET`: Static credentials, logged but unused
    /// - `TOKEN_FILE`: Token record path (defaults to `token.json`)
    /// - `TOKENS_DIR`: Directory created at startup (defaults to `tokens`)
    /// - `MEDIA_DIR`: Media staging directory (defaults to the system temp dir)
    ///
    /// # Returns
    ///
    /// - `Ok(AppConfig)`: If all required variables are present and non-empty
    /// - `Err(...)`: Naming the first missing variable
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading configuration from environment variables");

        let secret_key = required_var("SECRET_KEY")?;
        let client_id = required_var("CLIENT_ID")?;
        let client_secret = required_var("CLIENT_SECRET")?;
        let redirect_uri = required_var("REDIRECT_URI")?;

        let access_token = optional_var("ACCESS_TOKEN");
        let access_token_secret = optional_var("ACCESS_TOKEN_SECRET");
        if access_token.is_some() || access_token_secret.is_some() {
            info!("Static access credentials found; the OAuth 2.0 flow does not use them");
        }

        let token_file = optional_var("TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
        let tokens_dir = optional_var("TOKENS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKENS_DIR));
        let media_dir = optional_var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        info!(
            "Configuration loaded: redirect_uri={}, token_file={}, media_dir={}",
            redirect_uri,
            token_file.display(),
            media_dir.display()
        );

        Ok(AppConfig {
            secret_key,
            client_id,
            client_secret,
            redirect_uri,
            access_token,
            access_token_secret,
            token_file,
            tokens_dir,
            media_dir,
        })
    }
}

/// Gets the server port from environment variables or returns the default.
///
/// This function reads the `PORT` environment variable and parses it as a u16.
/// If the environment variable is not set, it defaults to 5000.
///
/// # Panics
///
/// This function will panic if the `PORT` environment variable is set to a value
/// that cannot be parsed as a valid port number.
pub fn get_server_port() -> u16 {
    env::var("PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse()
        .expect("PORT must be a valid number")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent parallel tests from racing on process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = ["SECRET_KEY", "CLIENT_ID", "CLIENT_SECRET", "REDIRECT_URI"];

    #[test]
    fn test_from_env_requires_client_credentials() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in VARS {
            env::set_var(var, "value-for-test");
        }
        env::remove_var("CLIENT_SECRET");

        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("CLIENT_SECRET"));

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_from_env_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in VARS {
            env::set_var(var, "value-for-test");
        }
        env::remove_var("TOKEN_FILE");
        env::remove_var("TOKENS_DIR");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.token_file, PathBuf::from("token.json"));
        assert_eq!(config.tokens_dir, PathBuf::from("tokens"));
        assert_eq!(config.client_id, "value-for-test");

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_get_server_port() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("PORT");
        assert_eq!(get_server_port(), 5000);

        env::set_var("PORT", "8080");
        assert_eq!(get_server_port(), 8080);

        env::remove_var("PORT");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("0123456789abcdef"), "01234567...");
        assert_eq!(mask_secret(""), "...");
    }
}
