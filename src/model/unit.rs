use crate::naming::safe_key;
use std::path::{Path, PathBuf};

/// A category or subcategory crawled as one bounded traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionUnit {
    name: String,
    url: String,
    output_dir: Option<PathBuf>,
}

impl CollectionUnit {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            output_dir: None,
        }
    }

    /// Pins the unit's snapshot directory instead of deriving it from the name
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Filesystem-safe form of the name, used for directories and ledger tags
    pub fn key(&self) -> String {
        safe_key(&self.name)
    }

    /// Directory holding this unit's snapshot and images
    ///
    /// The pinned output directory if any, else `<root>/<key>`.
    pub fn directory_under(&self, root: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => root.join(self.key()),
        }
    }
}
