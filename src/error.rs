//! Error types for the tweetauth service.
//!
//! [`ApiError`] describes failures talking to Twitter or to a media host.
//! [`AppError`] is what handlers return; every variant maps to one HTTP status
//! and a JSON body of the form `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde_json::json;

/// Failure of an outbound HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote end answered with a non-success status.
    #[error("{operation} returned {status}: {body}")]
    Status {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Malformed(String),

    /// Local file handling around the request failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Malformed(e.to_string())
    }
}

/// Application-level error returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required input is missing or unreadable.
    #[error("{0}")]
    InvalidRequest(String),

    /// The callback `state` does not match the one stored at authorization start.
    #[error("State mismatch. Possible CSRF attack.")]
    CsrfMismatch,

    /// No PKCE code verifier is present in the session.
    #[error("Code verifier not found in session.")]
    SessionExpired,

    /// The authorization code could not be exchanged for a token.
    #[error("Failed to generate access token: {0}")]
    ExchangeFailed(String),

    /// Neither tweet text nor a media URL was supplied.
    #[error("Either tweet text or media_url is required")]
    MissingContent,

    /// No token has been stored yet.
    #[error("No access token available. Authenticate via /startAuth first.")]
    NotAuthenticated,

    /// The media resource could not be downloaded.
    #[error("Failed to download media{0}")]
    DownloadFailed(String),

    /// The media resource is not an image, gif or video.
    #[error("Unsupported media type")]
    UnsupportedMediaType,

    /// Twitter rejected or failed the media upload.
    #[error("Failed to upload media: {0}")]
    MediaUploadFailed(String),

    /// Twitter rejected or failed the tweet creation.
    #[error("Failed to post tweet: {0}")]
    PostFailed(String),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Download failure caused by a non-success HTTP status.
    pub fn download_status(status: u16) -> Self {
        AppError::DownloadFailed(format!(". Status code: {}", status))
    }

    /// Download failure caused by anything other than the HTTP status.
    pub fn download_reason(reason: impl std::fmt::Display) -> Self {
        AppError::DownloadFailed(format!(": {}", reason))
    }

    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::CsrfMismatch
            | AppError::SessionExpired
            | AppError::MissingContent
            | AppError::DownloadFailed(_)
            | AppError::UnsupportedMediaType => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::ExchangeFailed(_)
            | AppError::MediaUploadFailed(_)
            | AppError::PostFailed(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!("{} ({})", message, status);
        } else {
            warn!("{} ({})", message, status);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_messages() {
        assert_eq!(
            AppError::download_status(404).to_string(),
            "Failed to download media. Status code: 404"
        );
        assert_eq!(
            AppError::download_reason("connection refused").to_string(),
            "Failed to download media: connection refused"
        );
    }

    #[test]
    fn test_unexpected_message_is_neutral() {
        assert_eq!(
            AppError::Unexpected("seal failed".into()).to_string(),
            "Unexpected error: seal failed"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::CsrfMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotAuthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::MediaUploadFailed("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::UnsupportedMediaType.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
