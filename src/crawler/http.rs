//! reqwest-backed transport session
//!
//! This module handles:
//! - Building the HTTP client with the configured user agent
//! - GET requests for page markup, bounded by the page timeout
//! - Binary downloads for images, bounded by the image timeout
//! - Error classification into [`FetchError`]

use crate::config::TransportConfig;
use crate::crawler::transport::{FetchError, FetchedBytes, SessionFactory, TransportSession};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &TransportConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.page_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport session over plain HTTP
///
/// The page-ready wait is the request timeout: a page is ready once its full
/// body has arrived.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    page_timeout: Duration,
    image_timeout: Duration,
}

impl HttpSession {
    pub fn new(config: &TransportConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            image_timeout: Duration::from_secs(config.image_timeout_secs),
        })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl TransportSession for HttpSession {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.get(url, self.page_timeout).await?;

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }

    async fn fetch_bytes(&mut self, url: &str) -> Result<FetchedBytes, FetchError> {
        tracing::debug!("GET {} (binary)", url);
        let response = self.get(url, self.image_timeout).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(FetchedBytes {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Opens one [`HttpSession`] per run
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: TransportConfig,
}

impl HttpSessionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn TransportSession>, FetchError> {
        let session =
            HttpSession::new(&self.config).map_err(|e| FetchError::Session(e.to_string()))?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&TransportConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_permanent() {
        let mut session = HttpSession::new(&TransportConfig::default()).unwrap();

        let err = session.fetch("not a url").await.unwrap_err();

        assert!(!err.is_transient(), "unexpected transient error: {}", err);
    }

    #[tokio::test]
    async fn test_factory_opens_session() {
        let factory = HttpSessionFactory::new(TransportConfig::default());
        let mut session = factory.open().await.unwrap();
        assert!(session.close().await.is_ok());
    }
}
