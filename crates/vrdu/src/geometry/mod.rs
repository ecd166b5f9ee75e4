//! Word geometry input.
//!
//! Rasterization and OCR happen outside this crate. What reaches the engine is
//! a [`Document`]: a page count plus, per page, an unordered list of
//! [`WordBox`] records served by a [`WordSource`].
//!
//! Two sources ship with the crate:
//!
//! - [`StaticWordSource`]: pages already held in memory (JSON uploads, tests)
//! - [`TsvWordSource`]: Tesseract TSV output, all pages in one file
//!
//! Anything else (a live OCR engine, a remote service) implements
//! [`WordSource`] directly.
//!
//! # Example
//!
//! ```rust
//! use vrdu::geometry::Document;
//! use vrdu::WordBox;
//!
//! let document = Document::from_pages(vec![vec![
//!     WordBox::new("Total", 0.96, 0.0, 0.0, 40.0, 10.0),
//!     WordBox::new("$45.00", 0.91, 80.0, 0.0, 48.0, 10.0),
//! ]]);
//! assert_eq!(document.page_count(), 1);
//! ```

pub mod tsv;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::types::WordBox;
use crate::{Result, VrduError};

pub use tsv::{TsvWordSource, extract_words_from_tsv, pages_from_tsv};

/// Supplier of per-page word geometry.
///
/// Pages are requested strictly in document order, once each. Implementations
/// may free a page's memory as soon as it has been handed out.
///
/// # Errors
///
/// A failed page should return `VrduError::GeometrySource`; the orchestrator
/// skips that page and keeps going with the rest of the document.
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Words of a 1-based page, in arbitrary order.
    async fn page_words(&self, page: usize) -> Result<Vec<WordBox>>;
}

/// Pages held in memory, each handed out exactly once.
pub struct StaticWordSource {
    pages: Mutex<Vec<Option<Vec<WordBox>>>>,
    page_count: usize,
}

impl StaticWordSource {
    pub fn new(pages: Vec<Vec<WordBox>>) -> Self {
        let page_count = pages.len();
        Self {
            pages: Mutex::new(pages.into_iter().map(Some).collect()),
            page_count,
        }
    }
}

#[async_trait]
impl WordSource for StaticWordSource {
    fn name(&self) -> &str {
        "static"
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn page_words(&self, page: usize) -> Result<Vec<WordBox>> {
        let mut pages = self.pages.lock();
        let slot = page
            .checked_sub(1)
            .and_then(|index| pages.get_mut(index))
            .ok_or_else(|| VrduError::geometry_source(page, format!("page out of range 1..={}", self.page_count)))?;

        slot.take()
            .ok_or_else(|| VrduError::geometry_source(page, "page was already consumed"))
    }
}

#[derive(Deserialize)]
struct JsonDocument {
    pages: Vec<Vec<WordBox>>,
}

/// A document submitted for extraction.
pub struct Document {
    name: Option<String>,
    source: Box<dyn WordSource>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("page_count", &self.source.page_count())
            .finish()
    }
}

impl Document {
    pub fn new(source: impl WordSource + 'static) -> Self {
        Self {
            name: None,
            source: Box::new(source),
        }
    }

    /// Document from pages already in memory.
    pub fn from_pages(pages: Vec<Vec<WordBox>>) -> Self {
        Self::new(StaticWordSource::new(pages))
    }

    /// Document from Tesseract TSV output (all pages in one file).
    ///
    /// # Errors
    ///
    /// Returns `VrduError::Parsing` when the input has no TSV header.
    pub fn from_tsv(tsv_data: &str) -> Result<Self> {
        Ok(Self::new(TsvWordSource::parse(tsv_data)?))
    }

    /// Document from JSON of the form `{"pages": [[{text, confidence, x, y, width, height}, ...], ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: JsonDocument = serde_json::from_str(json)
            .map_err(|e| VrduError::parsing_with_source("Invalid JSON document", e))?;
        Ok(Self::from_pages(parsed.pages))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }

    pub fn source(&self) -> &dyn WordSource {
        self.source.as_ref()
    }
}
