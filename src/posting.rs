//! Posting tweets with optional media on behalf of the authenticated user.

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::twitter::tweet_url;
use crate::AppState;

/// JSON body accepted by `POST /postTweet`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
}

/// A tweet that was posted successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedTweet {
    pub tweet_id: String,
    pub tweet_text: String,
    pub tweet_url: String,
}

/// Posts `request.text`, uploading `request.media_url` first when given.
///
/// Content is validated before any I/O. A staged media file never outlives
/// this call.
pub async fn submit_post(state: &AppState, request: PostRequest) -> AppResult<PostedTweet> {
    let text = request.text.as_deref().unwrap_or_default().trim().to_string();
    let media_url = request
        .media_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    if text.is_empty() && media_url.is_none() {
        return Err(AppError::MissingContent);
    }

    let token = state.tokens.load().await.ok_or(AppError::NotAuthenticated)?;
    if token.is_expired_at(Utc::now()) {
        warn!(
            "Stored access token expired at {}; Twitter will likely reject it",
            token.expires_at
        );
    }

    let mut media_ids = Vec::new();
    if let Some(media_url) = media_url {
        let staged = state.fetcher.fetch(media_url).await?;
        let category = staged.classify()?;

        info!("Uploading media");
        let media_id = state
            .twitter
            .upload_media(&token.access_token, &staged, category)
            .await
            .map_err(|e| AppError::MediaUploadFailed(e.to_string()))?;
        info!("Media uploaded successfully, Media ID: {}", media_id);

        staged.discard();
        media_ids.push(media_id);
    }

    let tweet = state
        .twitter
        .create_tweet(&token.access_token, &text, &media_ids)
        .await
        .map_err(|e| AppError::PostFailed(e.to_string()))?;

    Ok(PostedTweet {
        tweet_url: tweet_url(&tweet.id),
        tweet_id: tweet.id,
        tweet_text: tweet.text,
    })
}
