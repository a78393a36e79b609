//! Simple (single request) media upload.

use log::{debug, info};
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::error::ApiError;
use crate::media::{MediaCategory, StagedMedia};
use crate::oauth::build_oauth2_user_context_header;

use super::api::send_authenticated;

/// Twitter media upload endpoint.
pub const UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

#[derive(Deserialize)]
struct UploadResponse {
    media_id_string: Option<String>,
    media_id: Option<u64>,
}

/// Extracts the media identifier from the upload response body.
pub(crate) fn parse_media_id(body: &str) -> Result<String, ApiError> {
    let response: UploadResponse = serde_json::from_str(body)?;
    response
        .media_id_string
        .or_else(|| response.media_id.map(|id| id.to_string()))
        .ok_or_else(|| ApiError::Malformed("upload response has no media id".to_string()))
}

/// Uploads a staged media file and returns its media id.
pub(crate) async fn upload_media(
    client: &Client,
    access_token: &str,
    media: &StagedMedia,
    category: MediaCategory,
) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(media.path()).await?;
    info!(
        "Uploading {} ({} bytes, {}) as {}",
        media.file_name(),
        bytes.len(),
        media.mime(),
        category
    );

    let part = multipart::Part::bytes(bytes)
        .file_name(media.file_name().to_string())
        .mime_str(media.mime().as_ref())?;
    let form = multipart::Form::new()
        .text("media_category", category.as_str())
        .part("media", part);

    let request_builder = client
        .post(UPLOAD_URL)
        .header("Authorization", build_oauth2_user_context_header(access_token))
        .multipart(form);

    let body = send_authenticated(request_builder, "upload_media").await?;
    let media_id = parse_media_id(&body)?;
    debug!("Media ID: {}", media_id);
    Ok(media_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_id_prefers_string_form() {
        let id = parse_media_id(
            r#"{"media_id":710511363345354753,"media_id_string":"710511363345354753","size":11065}"#,
        )
        .unwrap();
        assert_eq!(id, "710511363345354753");
    }

    #[test]
    fn test_parse_media_id_falls_back_to_number() {
        assert_eq!(parse_media_id(r#"{"media_id":42}"#).unwrap(), "42");
    }

    #[test]
    fn test_parse_media_id_missing() {
        assert!(matches!(
            parse_media_id(r#"{"error":"bad"}"#),
            Err(ApiError::Malformed(_))
        ));
    }
}
