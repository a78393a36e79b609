//! Downloading and classifying media attached to tweets.
//!
//! Media is streamed from its URL into a uniquely named staging file. The
//! staging file is owned by [`StagedMedia`] and removed when that value is
//! dropped, so every exit path of a request cleans up after itself.

use log::{debug, info, warn};
use mime::Mime;
use reqwest::{header::CONTENT_TYPE, Client};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::error::AppError;

/// Size of the write buffer used while staging downloads.
pub const CHUNK_SIZE: usize = 8192;

/// Twitter's classification of an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Gif,
    Video,
}

impl MediaCategory {
    /// The `media_category` value Twitter expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "tweet_image",
            MediaCategory::Gif => "tweet_gif",
            MediaCategory::Video => "tweet_video",
        }
    }

    /// Maps a MIME type to a category; `None` for anything but images and video.
    pub fn from_mime(mime: &Mime) -> Option<Self> {
        if mime.type_() == mime::IMAGE && mime.subtype() == mime::GIF {
            Some(MediaCategory::Gif)
        } else if mime.type_() == mime::IMAGE {
            Some(MediaCategory::Image)
        } else if mime.type_() == mime::VIDEO {
            Some(MediaCategory::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guesses a MIME type from a file name's extension.
pub fn guess_mime_from_name(file_name: &str) -> Option<Mime> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "webp" => "image/webp".parse().ok()?,
        "mp4" | "m4v" => "video/mp4".parse().ok()?,
        "mov" => "video/quicktime".parse().ok()?,
        "webm" => "video/webm".parse().ok()?,
        _ => return None,
    };
    Some(mime)
}

/// Derives a filesystem-safe file name from the last segment of a URL path.
pub fn file_name_from_url(url: &Url) -> String {
    let name: String = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.trim_matches('.').is_empty() {
        "media".to_string()
    } else {
        name
    }
}

/// A downloaded media file waiting to be uploaded.
#[derive(Debug)]
pub struct StagedMedia {
    file: NamedTempFile,
    file_name: String,
    mime: Mime,
}

impl StagedMedia {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name taken from the source URL.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &Mime {
        &self.mime
    }

    /// Determines the media category, failing for unsupported types.
    pub fn classify(&self) -> Result<MediaCategory, AppError> {
        match MediaCategory::from_mime(&self.mime) {
            Some(category) => {
                info!("Media Category: {}", category);
                Ok(category)
            }
            None => {
                warn!(
                    "Unsupported media type {} for {}",
                    self.mime, self.file_name
                );
                Err(AppError::UnsupportedMediaType)
            }
        }
    }

    /// Deletes the staging file now, logging rather than failing on error.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed staged media {}", path.display()),
            Err(e) => warn!("Failed to remove staged media {}: {}", path.display(), e),
        }
    }
}

/// Downloads media into a staging directory.
#[derive(Debug, Clone)]
pub struct MediaFetcher {
    http: Client,
    staging_dir: PathBuf,
}

impl MediaFetcher {
    pub fn new(http: Client, staging_dir: impl Into<PathBuf>) -> Self {
        MediaFetcher {
            http,
            staging_dir: staging_dir.into(),
        }
    }

    /// Streams `media_url` into a new staging file.
    ///
    /// Fails with [`AppError::DownloadFailed`] for unparseable URLs, transport
    /// errors and non-success statuses.
    pub async fn fetch(&self, media_url: &str) -> Result<StagedMedia, AppError> {
        let url = Url::parse(media_url).map_err(AppError::download_reason)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::download_reason(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        info!("Downloading media from {}", url);
        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(AppError::download_reason)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Media download from {} returned {}", url, status);
            return Err(AppError::download_status(status.as_u16()));
        }

        let file_name = file_name_from_url(&url);
        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok());
        let mime = match header_mime {
            Some(mime) if mime.essence_str() != mime::APPLICATION_OCTET_STREAM.essence_str() => {
                mime
            }
            _ => guess_mime_from_name(&file_name).unwrap_or(mime::APPLICATION_OCTET_STREAM),
        };

        let staged = tempfile::Builder::new()
            .prefix("media-")
            .suffix(&format!("-{}", file_name))
            .tempfile_in(&self.staging_dir)
            .map_err(AppError::download_reason)?;
        info!("Saving file at {}", staged.path().display());

        let handle = staged.reopen().map_err(AppError::download_reason)?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, tokio::fs::File::from_std(handle));
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(AppError::download_reason)? {
            writer
                .write_all(&chunk)
                .await
                .map_err(AppError::download_reason)?;
            written += chunk.len();
        }
        writer.flush().await.map_err(AppError::download_reason)?;
        debug!("Staged {} bytes of {}", written, mime);

        Ok(StagedMedia {
            file: staged,
            file_name,
            mime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mime(s: &str) -> Mime {
        s.parse().unwrap()
    }

    #[test]
    fn test_category_from_mime() {
        assert_eq!(
            MediaCategory::from_mime(&mime("image/png")),
            Some(MediaCategory::Image)
        );
        assert_eq!(
            MediaCategory::from_mime(&mime("image/gif")),
            Some(MediaCategory::Gif)
        );
        assert_eq!(
            MediaCategory::from_mime(&mime("video/mp4")),
            Some(MediaCategory::Video)
        );
        assert_eq!(MediaCategory::from_mime(&mime("application/pdf")), None);
        assert_eq!(MediaCategory::from_mime(&mime("text/plain")), None);
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(MediaCategory::Image.as_str(), "tweet_image");
        assert_eq!(MediaCategory::Gif.to_string(), "tweet_gif");
        assert_eq!(MediaCategory::Video.as_str(), "tweet_video");
    }

    #[test]
    fn test_guess_mime_from_name() {
        assert_eq!(guess_mime_from_name("photo.JPG"), Some(mime::IMAGE_JPEG));
        assert_eq!(guess_mime_from_name("clip.mp4"), Some(mime("video/mp4")));
        assert_eq!(guess_mime_from_name("doc.pdf"), None);
        assert_eq!(guess_mime_from_name("noext"), None);
    }

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("https://cdn.example.com/a/b/cat%20pic.png?x=1").unwrap();
        assert_eq!(file_name_from_url(&url), "cat_20pic.png");

        let url = Url::parse("https://cdn.example.com/videos/clip.mp4/").unwrap();
        assert_eq!(file_name_from_url(&url), "clip.mp4");

        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(file_name_from_url(&url), "media");

        let url = Url::parse("https://cdn.example.com/..").unwrap();
        assert_eq!(file_name_from_url(&url), "media");
    }

    #[test]
    fn test_classify_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedMedia {
            file: NamedTempFile::new_in(dir.path()).unwrap(),
            file_name: "notes.txt".to_string(),
            mime: mime::TEXT_PLAIN,
        };
        let path = staged.path().to_path_buf();

        assert!(matches!(
            staged.classify(),
            Err(AppError::UnsupportedMediaType)
        ));
        assert!(path.exists());

        staged.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedMedia {
            file: NamedTempFile::new_in(dir.path()).unwrap(),
            file_name: "clip.mp4".to_string(),
            mime: mime("video/mp4"),
        };
        let path = staged.path().to_path_buf();
        assert_eq!(staged.classify().unwrap(), MediaCategory::Video);

        drop(staged);
        assert!(!path.exists());
    }
}
