//! Core Twitter API utilities.
//!
//! This module contains low-level helpers for sending authenticated requests
//! to the Twitter API and logging their outcome safely.

use log::{debug, error, info};

use crate::error::ApiError;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' => ' ',
            '\r' => ' ',
            '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.len() > max_len {
        let mut cut = max_len;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..cut],
            text.len()
        )
    } else {
        sanitized
    }
}

/// Sends an authenticated request and returns the response body on success.
///
/// # Parameters
///
/// - `request_builder`: A configured reqwest::RequestBuilder ready to send
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The API response body on success
/// - `Err(ApiError::Status)`: If Twitter answered with a non-success status
/// - `Err(ApiError::Transport)`: If the request could not be completed
pub(crate) async fn send_authenticated(
    request_builder: reqwest::RequestBuilder,
    operation_name: &'static str,
) -> Result<String, ApiError> {
    info!(
        "Making authenticated request for operation: {}",
        operation_name
    );

    let response = request_builder.send().await?;
    let status = response.status();
    info!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    let response_text = response.text().await?;

    if status.is_success() {
        debug!(
            "Response summary for '{}': {} bytes received",
            operation_name,
            response_text.len()
        );
        return Ok(response_text);
    }

    if status == 401 {
        error!(
            "Received 401 Unauthorized for operation '{}' - access token may be expired; re-authenticate via /startAuth",
            operation_name
        );
    } else {
        error!("Operation '{}' failed - Status: {}", operation_name, status);
    }
    debug!(
        "Error response for '{}': {}",
        operation_name,
        sanitize_for_logging(&response_text, 200)
    );

    Err(ApiError::Status {
        operation: operation_name,
        status,
        body: sanitize_for_logging(&response_text, 500),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_control_characters() {
        assert_eq!(sanitize_for_logging("a\nb\r\tc\u{7}", 100), "a b  c?");
    }

    #[test]
    fn test_sanitize_truncates_long_text() {
        let long = "x".repeat(50);
        assert_eq!(
            sanitize_for_logging(&long, 10),
            "xxxxxxxxxx... [truncated, 50 total bytes]"
        );
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let sanitized = sanitize_for_logging("ééééé", 3);
        assert!(sanitized.starts_with("é..."));
    }
}
