//! Tweet creation for the Twitter API v2.

use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::oauth::build_oauth2_user_context_header;

use super::api::send_authenticated;

/// Twitter API v2 tweet creation endpoint.
pub const TWEETS_URL: &str = "https://api.x.com/2/tweets";

/// A tweet as returned by the creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedTweet {
    pub id: String,
    pub text: String,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: Option<CreatedTweet>,
}

/// Builds the JSON payload for a new tweet, attaching `media_ids` when present.
pub(crate) fn tweet_payload(text: &str, media_ids: &[String]) -> serde_json::Value {
    if media_ids.is_empty() {
        json!({ "text": text })
    } else {
        json!({
            "text": text,
            "media": { "media_ids": media_ids }
        })
    }
}

/// Extracts the created tweet from the endpoint's response body.
pub(crate) fn parse_created_tweet(body: &str) -> Result<CreatedTweet, ApiError> {
    let response: CreateTweetResponse = serde_json::from_str(body)?;
    response
        .data
        .ok_or_else(|| ApiError::Malformed("tweet response has no data".to_string()))
}

/// Posts a tweet to Twitter/X using the API v2 endpoint.
///
/// # Parameters
///
/// - `client`: Shared HTTP client
/// - `access_token`: OAuth 2.0 User Context access token
/// - `text`: The text content of the tweet to post
/// - `media_ids`: Previously uploaded media to attach
pub(crate) async fn create_tweet(
    client: &Client,
    access_token: &str,
    text: &str,
    media_ids: &[String],
) -> Result<CreatedTweet, ApiError> {
    info!(
        "Starting tweet post operation with {} media attachment(s)",
        media_ids.len()
    );

    let payload = tweet_payload(text, media_ids);
    debug!("Tweet payload: {}", payload);
    debug!("Request headers: Authorization: Bearer [REDACTED], Content-Type: application/json");

    let request_builder = client
        .post(TWEETS_URL)
        .header("Authorization", build_oauth2_user_context_header(access_token))
        .json(&payload);

    let body = send_authenticated(request_builder, "post_tweet").await?;
    let tweet = parse_created_tweet(&body)?;
    info!("Tweet {} posted successfully", tweet.id);
    Ok(tweet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_without_media() {
        assert_eq!(tweet_payload("hello", &[]), json!({ "text": "hello" }));
    }

    #[test]
    fn test_payload_with_media() {
        assert_eq!(
            tweet_payload("", &["1234".to_string()]),
            json!({ "text": "", "media": { "media_ids": ["1234"] } })
        );
    }

    #[test]
    fn test_parse_created_tweet() {
        let tweet = parse_created_tweet(
            r#"{"data":{"edit_history_tweet_ids":["1850"],"id":"1850","text":"hello"}}"#,
        )
        .unwrap();
        assert_eq!(tweet.id, "1850");
        assert_eq!(tweet.text, "hello");
    }

    #[test]
    fn test_parse_created_tweet_without_data() {
        let err = parse_created_tweet(r#"{"errors":[{"message":"nope"}]}"#).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }
}
