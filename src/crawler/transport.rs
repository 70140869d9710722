//! Transport seam between the crawler and the network
//!
//! Every page and image goes through a [`TransportSession`]. The crawler owns
//! exactly one session at a time and drives it sequentially, so methods take
//! `&mut self`.

use crate::crawler::resolver::SubcategoryMap;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while fetching a page or an image
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to start transport session: {0}")]
    Session(String),

    #[error("Request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Whether retrying the same request may succeed
    ///
    /// Timeouts, connection failures, truncated bodies, HTTP 429 and 5xx are
    /// transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connect { .. } | FetchError::Body { .. } => {
                true
            }
            FetchError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();

        if error.is_timeout() {
            FetchError::Timeout { url }
        } else if error.is_connect() {
            FetchError::Connect {
                url,
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url,
                status: status.as_u16(),
            }
        } else if error.is_body() || error.is_decode() {
            FetchError::Body {
                url,
                message: error.to_string(),
            }
        } else if error.is_builder() {
            FetchError::InvalidUrl {
                url,
                message: error.to_string(),
            }
        } else {
            FetchError::Other {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// Raw bytes of a binary resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBytes {
    pub bytes: Vec<u8>,
    /// Value of the Content-Type header, if any
    pub content_type: Option<String>,
}

/// A live connection to the catalog
#[async_trait]
pub trait TransportSession: Send {
    /// Loads a page and returns its markup once the page is ready
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError>;

    /// Downloads a binary resource such as an item image
    async fn fetch_bytes(&mut self, url: &str) -> Result<FetchedBytes, FetchError>;

    /// Subcategory discovery that needs the live session (e.g. a rendered menu)
    ///
    /// Sessions without such a capability return an empty map, letting the
    /// resolver fall through to its markup heuristics.
    async fn subcategory_links(
        &mut self,
        _category_url: &str,
        _max: usize,
    ) -> Result<SubcategoryMap, FetchError> {
        Ok(SubcategoryMap::new())
    }

    /// Releases the session's resources
    async fn close(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Creates transport sessions for runs that were not handed one
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn TransportSession>, FetchError>;
}
