//! Cookie-backed OAuth session.
//!
//! The PKCE code verifier and CSRF state created at `/startAuth` travel to
//! `/callback` inside a single encrypted cookie.

use axum::http::{header, HeaderMap};
use cookie::{Cookie, SameSite};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::crypto::SessionCipher;

/// Name of the cookie carrying the sealed session.
pub const SESSION_COOKIE: &str = "tweetauth_session";

/// PKCE material held between authorization start and callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthSession {
    pub code_verifier: Option<String>,
    pub state: Option<String>,
}

/// Reads and writes [`OAuthSession`] values as encrypted cookies.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cipher: SessionCipher,
    secure: bool,
}

impl SessionStore {
    /// `secure` marks the cookie `Secure` (set when the redirect URI is https).
    pub fn new(cipher: SessionCipher, secure: bool) -> Self {
        SessionStore { cipher, secure }
    }

    /// Extracts the session from the request's `Cookie` headers.
    ///
    /// A missing, undecryptable or unparseable cookie yields an empty session.
    pub fn load(&self, headers: &HeaderMap) -> OAuthSession {
        let Some(sealed) = find_cookie(headers, SESSION_COOKIE) else {
            debug!("No session cookie on request");
            return OAuthSession::default();
        };

        let json = match self.cipher.open(&sealed) {
            Ok(json) => json,
            Err(e) => {
                warn!("Discarding unreadable session cookie: {}", e);
                return OAuthSession::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding malformed session payload: {}", e);
                OAuthSession::default()
            }
        }
    }

    /// Builds the `Set-Cookie` value storing `session`.
    pub fn store_cookie(
        &self,
        session: &OAuthSession,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let sealed = self.cipher.seal(&serde_json::to_string(session)?)?;
        let cookie = Cookie::build((SESSION_COOKIE, sealed))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        Ok(cookie.to_string())
    }

    /// Builds the `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.make_removal();
        cookie.to_string()
    }
}

fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_string()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store() -> SessionStore {
        SessionStore::new(SessionCipher::from_secret("test-secret"), false)
    }

    fn request_headers(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {}", pair)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_store_then_load() {
        let store = store();
        let session = OAuthSession {
            code_verifier: Some("verifier".to_string()),
            state: Some("state".to_string()),
        };

        let set_cookie = store.store_cookie(&session).unwrap();
        assert!(set_cookie.starts_with("tweetauth_session="));
        assert!(set_cookie.contains("HttpOnly"));

        assert_eq!(store.load(&request_headers(&set_cookie)), session);
    }

    #[test]
    fn test_load_without_cookie_is_empty() {
        assert_eq!(store().load(&HeaderMap::new()), OAuthSession::default());
    }

    #[test]
    fn test_cookie_from_other_key_is_empty() {
        let other = SessionStore::new(SessionCipher::from_secret("other-secret"), false);
        let set_cookie = other
            .store_cookie(&OAuthSession {
                code_verifier: Some("v".to_string()),
                state: Some("s".to_string()),
            })
            .unwrap();

        assert_eq!(
            store().load(&request_headers(&set_cookie)),
            OAuthSession::default()
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cleared = store().clear_cookie();
        assert!(cleared.starts_with("tweetauth_session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
