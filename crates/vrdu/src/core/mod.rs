//! Core extraction orchestration module.
//!
//! # Architecture
//!
//! - **Entry points**: [`extract_document`] and [`analyze_document`]
//! - **Pipeline**: per-page filtering, layout, field location and validation,
//!   plus multi-page aggregation
//! - **Configuration**: loading, validating and discovering [`VrduConfig`]
//!
//! Background job handling sits on top of this module in [`crate::jobs`].
//!
//! # Example
//!
//! ```rust,no_run
//! use vrdu::core::config::VrduConfig;
//! use vrdu::core::extractor::extract_document;
//! use vrdu::geometry::Document;
//!
//! # async fn example() -> vrdu::Result<()> {
//! let tsv = std::fs::read_to_string("invoice.tsv")?;
//! let document = Document::from_tsv(&tsv)?;
//! let result = extract_document(document, vec!["Total".into(), "Date".into()], &VrduConfig::default()).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extractor;
pub mod pipeline;

pub use config::{
    CONFIG_FILE_NAME, Direction, DistanceMetric, GraphConfig, GridConfig, JobConfig, LocatorConfig, OcrFilterConfig,
    ValidationConfig, VrduConfig,
};
pub use extractor::{analyze_document, extract_document, extract_document_sync};
pub use pipeline::{FieldAggregator, PageOutcome, process_page};
