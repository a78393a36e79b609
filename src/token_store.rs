//! Persistence of the OAuth 2.0 access token.
//!
//! A single token record lives in one JSON file. Each successful authentication
//! overwrites it; there is no history and no per-user keying.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::mask_secret;

/// The persisted access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

impl TokenRecord {
    /// Returns `true` once `expires_at` is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Reads and writes the token file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the token file with `record`.
    pub async fn save(&self, record: &TokenRecord) -> io::Result<()> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        record
            .serialize(&mut serializer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        tokio::fs::write(&self.path, json).await?;
        info!(
            "Saved access token {} (expires {}) to {}",
            mask_secret(&record.access_token),
            record.expires_at.to_rfc3339(),
            self.path.display()
        );
        Ok(())
    }

    /// Loads the token record.
    ///
    /// Returns `None` when the file does not exist or cannot be parsed; the
    /// latter is logged rather than raised.
    pub async fn load(&self) -> Option<TokenRecord> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No token file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                error!("Error loading access token: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<TokenRecord>(&contents) {
            Ok(record) => {
                debug!(
                    "Loaded access token {} from {}",
                    mask_secret(&record.access_token),
                    self.path.display()
                );
                Some(record)
            }
            Err(e) => {
                warn!("Error loading access token: {}", e);
                None
            }
        }
    }
}
