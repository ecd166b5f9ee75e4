//! Error types for vrdu.
//!
//! All fallible operations in the crate return [`VrduError`]. Errors follow
//! the same split used everywhere in the crate:
//!
//! **System errors bubble up unchanged:**
//! - `VrduError::Io` (from `std::io::Error`)
//!
//! **Application errors carry context:**
//! - `Parsing` - malformed TSV/JSON documents
//! - `Validation` - malformed field lists, config values, host addresses
//! - `GeometrySource` - the word geometry collaborator failed for one page
//! - `GraphConsistency` - a reading-order graph contained a cycle
//! - `JobProcessing` - unexpected failure inside a background job
//! - `Timeout` - a job exceeded its configured maximum duration
//!
//! A field whose label or value cannot be located is *not* an error: it is a
//! normal result state (see [`crate::types::FieldStatus`]). The same holds for a
//! value that fails pattern validation.
//!
//! # Example
//!
//! ```rust
//! use vrdu::{Result, VrduError};
//!
//! fn parse_fields(raw: &str) -> Result<Vec<String>> {
//!     let fields: Vec<String> = raw.split(',').map(|f| f.trim().to_string()).collect();
//!     if fields.iter().any(|f| f.is_empty()) {
//!         return Err(VrduError::validation(format!("Blank field name in '{}'", raw)));
//!     }
//!     Ok(fields)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `VrduError`.
pub type Result<T> = std::result::Result<T, VrduError>;

/// Main error type for all vrdu operations.
#[derive(Debug, Error)]
pub enum VrduError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Geometry source failed on page {page}: {message}")]
    GeometrySource { page: usize, message: String },

    #[error("Graph consistency error: {0}")]
    GraphConsistency(String),

    #[error("Job processing failed: {0}")]
    JobProcessing(String),

    #[error("Job timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for VrduError {
    fn from(err: serde_json::Error) -> Self {
        VrduError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl VrduError {
    error_constructor!(parsing, Parsing);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a geometry source error for a 1-based page number.
    pub fn geometry_source<S: Into<String>>(page: usize, message: S) -> Self {
        Self::GeometrySource {
            page,
            message: message.into(),
        }
    }
}
