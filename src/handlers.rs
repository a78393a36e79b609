//! HTTP route handlers for the tweetauth service.
//!
//! This module contains all the HTTP route handler functions that process
//! incoming requests and return appropriate responses.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{complete_auth, start_auth};
use crate::error::{AppError, AppResult};
use crate::posting::{submit_post, PostRequest};
use crate::AppState;

/// Handles GET requests to the root `/` endpoint.
///
/// # Returns
///
/// A static welcome banner.
pub async fn handle_root() -> &'static str {
    "Welcome to the Twitter API OAuth 2.0 App!"
}

/// Handles GET requests to `/startAuth`.
///
/// Generates the PKCE verifier and CSRF state, stores them in the session
/// cookie, and redirects the browser to Twitter's authorization page.
///
/// # Returns
///
/// A `302 Found` redirect carrying a `Set-Cookie` header.
pub async fn handle_start_auth(State(state): State<AppState>) -> AppResult<Response> {
    let (url, session) = start_auth(&state)?;
    let cookie = state.sessions.store_cookie(&session).map_err(|e| {
        error!("Failed to seal OAuth session: {}", e);
        AppError::Unexpected(e.to_string())
    })?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, url), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

/// Query parameters Twitter appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Handles GET requests to `/callback`.
///
/// # Success Response
///
/// ```json
/// {
///   "message": "Authentication successful!",
///   "access_token": "<token>",
///   "expires_at": "2026-10-18T12:00:00+00:00",
///   "scope": "users.read tweet.read tweet.write"
/// }
/// ```
///
/// # Error Response
///
/// ```json
/// { "error": "State mismatch. Possible CSRF attack." }
/// ```
pub async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let session = state.sessions.load(&headers);
    let result = complete_auth(
        &state,
        &session,
        params.code.as_deref(),
        params.state.as_deref(),
    )
    .await;

    // Once the state check passes the verifier is spent, whatever happens next.
    let consumed = !matches!(
        result,
        Err(AppError::InvalidRequest(_)) | Err(AppError::CsrfMismatch)
    );

    let mut response = match result {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "message": "Authentication successful!",
                "access_token": record.access_token,
                "expires_at": record.expires_at.to_rfc3339(),
                "scope": record.scope,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    };

    if consumed {
        if let Ok(value) = state.sessions.clear_cookie().parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Handles POST requests to `/postTweet`.
///
/// Accepts `{"text": "...", "media_url": "..."}` where at least one field is
/// non-empty.
///
/// # Success Response
///
/// ```json
/// {
///   "message": "Tweet posted successfully!",
///   "tweet_id": "1850000000000000000",
///   "tweet_text": "hello",
///   "tweet_url": "https://twitter.com/user/status/1850000000000000000"
/// }
/// ```
pub async fn handle_post_tweet(
    State(state): State<AppState>,
    body: Result<Json<PostRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let Json(request) = body.map_err(|e| {
        AppError::InvalidRequest(format!("Invalid request body: {}", e.body_text()))
    })?;

    let posted = submit_post(&state, request).await?;
    info!("Tweet posted successfully: {}", posted.tweet_url);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Tweet posted successfully!",
            "tweet_id": posted.tweet_id,
            "tweet_text": posted.tweet_text,
            "tweet_url": posted.tweet_url,
        })),
    ))
}

