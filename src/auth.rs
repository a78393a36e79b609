//! The OAuth 2.0 authorization code flow as seen by the service.
//!
//! [`start_auth`] prepares the redirect to Twitter and the session to remember
//! it by; [`complete_auth`] validates the callback against that session,
//! exchanges the code, and persists the resulting token.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::info;

use crate::error::{AppError, AppResult};
use crate::session::OAuthSession;
use crate::token_store::TokenRecord;
use crate::AppState;

/// Creates an authorization URL and the session that must accompany the callback.
pub fn start_auth(state: &AppState) -> AppResult<(String, OAuthSession)> {
    let request = state
        .oauth
        .authorization_request()
        .map_err(|e| AppError::Unexpected(e.to_string()))?;
    info!("URL: {}", request.url);

    let session = OAuthSession {
        code_verifier: Some(request.code_verifier),
        state: Some(request.state),
    };
    Ok((request.url, session))
}

/// Absolute expiry for a token issued at `issued_at` with a relative lifetime.
///
/// Returns `None` when the lifetime does not fit in a representable timestamp.
pub fn expiry_from(issued_at: DateTime<Utc>, lifetime_secs: i64) -> Option<DateTime<Utc>> {
    issued_at
        .trunc_subsecs(0)
        .checked_add_signed(Duration::try_seconds(lifetime_secs)?)
}

/// Validates the callback and exchanges the authorization code for a token.
///
/// The checks run in order: code present, state matches the session, session
/// holds a verifier. Only then is Twitter contacted.
pub async fn complete_auth(
    state: &AppState,
    session: &OAuthSession,
    code: Option<&str>,
    returned_state: Option<&str>,
) -> AppResult<TokenRecord> {
    let code = code.filter(|c| !c.is_empty()).ok_or_else(|| {
        AppError::InvalidRequest("Authorization code not found in the callback URL.".to_string())
    })?;

    if returned_state != session.state.as_deref() {
        return Err(AppError::CsrfMismatch);
    }

    let code_verifier = session
        .code_verifier
        .as_deref()
        .ok_or(AppError::SessionExpired)?;

    let token = state
        .oauth
        .exchange_code(code, code_verifier)
        .await
        .map_err(|e| AppError::ExchangeFailed(e.to_string()))?;

    let expires_at = expiry_from(Utc::now(), token.lifetime_secs()).ok_or_else(|| {
        AppError::ExchangeFailed(format!("invalid expires_in {}", token.lifetime_secs()))
    })?;

    let record = TokenRecord {
        access_token: token.access_token.clone(),
        expires_at,
        scope: token.scope.clone(),
    };

    state
        .tokens
        .save(&record)
        .await
        .map_err(|e| AppError::ExchangeFailed(format!("could not persist token: {}", e)))?;

    info!("Authentication successful; token expires at {}", record.expires_at);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_from_truncates_to_the_second() {
        let issued = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
            + Duration::milliseconds(750);
        assert_eq!(
            expiry_from(issued, 7200),
            Some(Utc.with_ymd_and_hms(2026, 10, 18, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_expiry_from_rejects_out_of_range_lifetime() {
        let issued = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        assert_eq!(expiry_from(issued, i64::MAX), None);
        assert_eq!(expiry_from(issued, i64::MIN), None);
        // Representable as a duration, but past the end of chrono's calendar
        assert_eq!(expiry_from(issued, i64::MAX / 1000), None);
    }
}
