//! In-memory transport for deterministic crawler tests

use crate::crawler::resolver::SubcategoryMap;
use crate::crawler::transport::{FetchError, FetchedBytes, SessionFactory, TransportSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct FixtureState {
    pages: HashMap<String, String>,
    bytes: HashMap<String, FetchedBytes>,
    subcategories: HashMap<String, SubcategoryMap>,
    transient_failures: HashMap<String, u32>,
    page_log: Vec<String>,
    counts: HashMap<String, usize>,
    closes: usize,
}

/// Serves canned markup and bytes keyed by exact URL
///
/// Clones share state, so a test can keep a handle on a session it gave
/// away. Unknown URLs answer HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct FixtureSession {
    state: Arc<Mutex<FixtureState>>,
}

impl FixtureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, markup: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), markup.into());
        self
    }

    pub fn with_bytes(self, url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        self.state.lock().unwrap().bytes.insert(
            url.to_string(),
            FetchedBytes {
                bytes,
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn with_subcategories(self, url: &str, map: SubcategoryMap) -> Self {
        self.state
            .lock()
            .unwrap()
            .subcategories
            .insert(url.to_string(), map);
        self
    }

    /// The next `times` requests for `url` time out
    pub fn fail_transiently(self, url: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .transient_failures
            .insert(url.to_string(), times);
        self
    }

    /// Page URLs fetched so far, in order
    pub fn fetch_log(&self) -> Vec<String> {
        self.state.lock().unwrap().page_log.clone()
    }

    /// Requests of any kind made for `url`
    pub fn fetch_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .counts
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    fn request(&self, url: &str) -> Result<(), FetchError> {
        let mut state = self.state.lock().unwrap();
        *state.counts.entry(url.to_string()).or_default() += 1;

        if let Some(remaining) = state.transient_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                });
            }
        }
        Ok(())
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl TransportSession for FixtureSession {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        self.state.lock().unwrap().page_log.push(url.to_string());
        self.request(url)?;

        let state = self.state.lock().unwrap();
        state
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    async fn fetch_bytes(&mut self, url: &str) -> Result<FetchedBytes, FetchError> {
        self.request(url)?;

        let state = self.state.lock().unwrap();
        state
            .bytes
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    async fn subcategory_links(
        &mut self,
        category_url: &str,
        _max: usize,
    ) -> Result<SubcategoryMap, FetchError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .subcategories
            .get(category_url)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Hands out clones of one fixture session, or fails to open
#[derive(Debug, Clone)]
pub struct FixtureFactory {
    session: Option<FixtureSession>,
    opened: Arc<AtomicUsize>,
}

impl FixtureFactory {
    pub fn new(session: FixtureSession) -> Self {
        Self {
            session: Some(session),
            opened: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            session: None,
            opened: Arc::default(),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FixtureFactory {
    async fn open(&self) -> Result<Box<dyn TransportSession>, FetchError> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| FetchError::Session("fixture factory refuses to open".to_string()))?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(session))
    }
}
