//! VRDU - Spatial Field Extraction for Scanned Documents
//!
//! Given OCR word boxes for each page of a visually rich document (invoices,
//! receipts, forms), VRDU recovers a reading order from geometry alone, locates
//! the labels a caller asks for, and reads the value next to each label or the
//! table underneath it.
//!
//! # Quick Start
//!
//! ```rust
//! use vrdu::{Document, FieldStatus, VrduConfig, WordBox, extract_document_sync};
//!
//! # fn main() -> vrdu::Result<()> {
//! let document = Document::from_pages(vec![vec![
//!     WordBox::new("Total", 0.96, 10.0, 100.0, 40.0, 12.0),
//!     WordBox::new("$45.00", 0.91, 80.0, 100.0, 48.0, 12.0),
//! ]]);
//!
//! let result = extract_document_sync(document, vec!["Total".into()], &VrduConfig::default())?;
//! let total = &result.fields["Total"];
//! assert_eq!(total.status, FieldStatus::Found);
//! assert_eq!(total.value.as_deref(), Some("$45.00"));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Geometry** (`geometry`): word sources, Tesseract TSV and JSON input
//! - **Layout** (`layout`): row bands, the spatial precedence graph, reading
//!   order and table grid reconstruction
//! - **Fields** (`fields`): fuzzy label matching, value location and format
//!   validation
//! - **Core** (`core`): configuration and the per-page / per-document pipeline
//! - **Jobs** (`jobs`): queued background extraction with status polling
//! - **API** (`api`, feature `api`): HTTP front end over the job orchestrator

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod fields;
pub mod geometry;
pub mod jobs;
pub mod layout;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{Result, VrduError};
pub use types::*;

pub use core::config::{
    Direction, DistanceMetric, GraphConfig, GridConfig, JobConfig, LocatorConfig, OcrFilterConfig, ValidationConfig,
    VrduConfig,
};
pub use core::extractor::{analyze_document, extract_document, extract_document_sync};

pub use geometry::{Document, StaticWordSource, TsvWordSource, WordSource};
pub use jobs::{Job, JobId, JobOrchestrator, JobStatus};
pub use layout::{PageLayout, reading_order, reconstruct_grid};
