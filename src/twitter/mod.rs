//! Twitter/X API integration module.
//!
//! This module contains the client used to upload media and post tweets with
//! an OAuth 2.0 User Context access token. Callers depend on the
//! [`TwitterApi`] trait so tests can substitute the network.

mod api;
mod tweets;
mod upload;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ApiError;
use crate::media::{MediaCategory, StagedMedia};

pub(crate) use api::sanitize_for_logging;
pub use tweets::{CreatedTweet, TWEETS_URL};
pub use upload::UPLOAD_URL;

/// Public URL template for a posted tweet.
pub fn tweet_url(tweet_id: &str) -> String {
    format!("https://twitter.com/user/status/{}", tweet_id)
}

/// Operations the service performs on behalf of the authenticated user.
#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Uploads staged media and returns the media id to attach to a tweet.
    async fn upload_media(
        &self,
        access_token: &str,
        media: &StagedMedia,
        category: MediaCategory,
    ) -> Result<String, ApiError>;

    /// Creates a tweet with optional attached media.
    async fn create_tweet(
        &self,
        access_token: &str,
        text: &str,
        media_ids: &[String],
    ) -> Result<CreatedTweet, ApiError>;
}

/// [`TwitterApi`] backed by the public Twitter endpoints.
#[derive(Debug, Clone, Default)]
pub struct TwitterClient {
    http: Client,
}

impl TwitterClient {
    pub fn new(http: Client) -> Self {
        TwitterClient { http }
    }
}

#[async_trait]
impl TwitterApi for TwitterClient {
    async fn upload_media(
        &self,
        access_token: &str,
        media: &StagedMedia,
        category: MediaCategory,
    ) -> Result<String, ApiError> {
        upload::upload_media(&self.http, access_token, media, category).await
    }

    async fn create_tweet(
        &self,
        access_token: &str,
        text: &str,
        media_ids: &[String],
    ) -> Result<CreatedTweet, ApiError> {
        tweets::create_tweet(&self.http, access_token, text, media_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_url() {
        assert_eq!(
            tweet_url("1850000000000000000"),
            "https://twitter.com/user/status/1850000000000000000"
        );
    }
}
