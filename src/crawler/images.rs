//! Item image downloads
//!
//! Images are best-effort: a failed download is logged and leaves the
//! record's local image path unset.

use crate::crawler::politeness::Backoff;
use crate::crawler::transport::{FetchError, TransportSession};
use crate::naming::safe_key;
use crate::storage::atomic_write;
use std::path::{Path, PathBuf};
use url::Url;

/// Sub-directory of a unit directory holding its images
pub const IMAGES_DIR: &str = "images";

/// Longest name prefix used in an image file name
const NAME_PREFIX_CHARS: usize = 80;

/// Longest accepted extension, dot included
const MAX_EXTENSION_LEN: usize = 5;

const FALLBACK_EXTENSION: &str = ".jpg";

/// Downloads images through the transport session with bounded retries
#[derive(Debug, Clone, Copy)]
pub struct ImageStore {
    retries: u32,
    backoff: Backoff,
}

impl ImageStore {
    /// # Arguments
    ///
    /// * `retries` - Extra attempts after a transient failure
    /// * `backoff` - Delay schedule between attempts
    pub fn new(retries: u32, backoff: Backoff) -> Self {
        Self { retries, backoff }
    }

    /// Fetches an image and stores it under `dir`
    ///
    /// # Returns
    ///
    /// * `Some(PathBuf)` - Path of the stored image
    /// * `None` - Download or write failed after all attempts
    pub async fn fetch_and_store(
        &self,
        session: &mut dyn TransportSession,
        url: &str,
        dir: &Path,
        name: &str,
        identifier: &str,
    ) -> Option<PathBuf> {
        let mut attempt = 0;

        let fetched = loop {
            match session.fetch_bytes(url).await {
                Ok(fetched) => break fetched,
                Err(e) if e.is_transient() && attempt < self.retries => {
                    tracing::debug!(
                        "Image {} attempt {} failed, retrying: {}",
                        url,
                        attempt + 1,
                        e
                    );
                    self.backoff.wait(attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    log_failure(url, &e);
                    return None;
                }
            }
        };

        let filename = image_filename(name, identifier, url, fetched.content_type.as_deref());
        let path = dir.join(filename);

        match atomic_write(&path, &fetched.bytes) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Could not store image {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn log_failure(url: &str, error: &FetchError) {
    tracing::warn!("Image download failed for {}: {}", url, error);
}

/// Builds `<safe name prefix>_<identifier><ext>`
///
/// The extension comes from the URL path, else from an `image/*` content
/// type, else `.jpg`.
pub fn image_filename(
    name: &str,
    identifier: &str,
    url: &str,
    content_type: Option<&str>,
) -> String {
    let prefix: String = safe_key(name).chars().take(NAME_PREFIX_CHARS).collect();
    let extension = extension_from_url(url)
        .or_else(|| content_type.and_then(extension_from_content_type))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    format!("{}_{}{}", prefix, safe_key(identifier), extension)
}

fn extension_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let last = url.path_segments()?.last()?;
    let (stem, ext) = last.rsplit_once('.')?;

    let extension = format!(".{}", ext.to_lowercase());
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && extension.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());

    valid.then_some(extension)
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim().to_lowercase();
    let subtype = mime.strip_prefix("image/")?;

    let extension = match subtype {
        "jpeg" | "pjpeg" => ".jpg".to_string(),
        "svg+xml" => ".svg".to_string(),
        other => format!(".{}", other),
    };

    (extension.len() <= MAX_EXTENSION_LEN
        && extension[1..].chars().all(|c| c.is_ascii_alphanumeric()))
    .then_some(extension)
}
