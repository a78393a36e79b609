//! Terminal Authorization Script
//!
//! Runs the OAuth 2.0 PKCE flow without a browser callback: open the printed
//! URL, authorize the app, paste the `code` from the redirect, and the access
//! token is written to the same token file the server reads.

use chrono::Utc;
use std::io::{self, Write};
use url::Url;

use tweetauth::auth::expiry_from;
use tweetauth::config::{mask_secret, DEFAULT_TOKEN_FILE};
use tweetauth::oauth::{OAuthClient, TwitterOAuthClient};
use tweetauth::{TokenRecord, TokenStore};

/// Reads `name` from the environment, prompting when it is missing.
fn env_or_prompt(name: &str, prompt: &str) -> io::Result<String> {
    if let Ok(value) = std::env::var(name) {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Accepts either the bare code or the full redirect URL the browser landed on.
fn extract_code(input: &str) -> String {
    Url::parse(input)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| input.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    println!("🤖 Twitter OAuth 2.0 Authorization Helper");
    println!("==========================================");

    let client_id = env_or_prompt("CLIENT_ID", "Enter your Twitter App Client ID: ")?;
    let client_secret = env_or_prompt("CLIENT_SECRET", "Enter your Twitter App Client Secret: ")?;
    let redirect_uri = env_or_prompt(
        "REDIRECT_URI",
        "Enter your Redirect URI (e.g., http://localhost:5000/callback): ",
    )?;
    let token_file =
        std::env::var("TOKEN_FILE").unwrap_or_else(|_| DEFAULT_TOKEN_FILE.to_string());

    let client = TwitterOAuthClient::new(client_id, client_secret, redirect_uri);
    let request = client.authorization_request()?;

    println!("\n🔗 Authorization Steps:");
    println!("1. Open this URL in your browser:");
    println!("   {}", request.url);
    println!("\n2. Authorize the application");
    println!("3. Copy the 'code' parameter (or the whole callback URL)");
    println!("4. Paste it below:");

    print!("\nEnter the authorization code: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let code = extract_code(input.trim());
    if code.is_empty() {
        return Err("Authorization code is required".into());
    }

    println!("\n🔄 Exchanging code for access token...");
    let token = client.exchange_code(&code, &request.code_verifier).await?;

    let expires_at = expiry_from(Utc::now(), token.lifetime_secs()).ok_or_else(|| {
        format!(
            "Token endpoint returned invalid expires_in {}",
            token.lifetime_secs()
        )
    })?;

    let record = TokenRecord {
        expires_at,
        access_token: token.access_token,
        scope: token.scope,
    };
    TokenStore::new(&token_file).save(&record).await?;

    println!(
        "\n✅ Success! Access token {} saved to {}",
        mask_secret(&record.access_token),
        token_file
    );
    println!("⏰ Expires at: {}", record.expires_at.to_rfc3339());
    println!("🔐 Scope: {}", record.scope);

    Ok(())
}
