use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A recognized word with its page-relative bounding box.
///
/// Coordinates use the geometry source's units (pixels for Tesseract) with the
/// origin at the top-left corner of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    /// Recognition confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WordBox {
    pub fn new(text: impl Into<String>, confidence: f64, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn x_center(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn y_center(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Length of the shared horizontal extent (0 when disjoint).
    pub fn x_overlap(&self, other: &WordBox) -> f64 {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0.0)
    }

    /// Length of the shared vertical extent (0 when disjoint).
    pub fn y_overlap(&self, other: &WordBox) -> f64 {
        (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0)
    }
}

/// Declared value type of a requested field, drives pattern validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Date,
    Currency,
    Text,
}

/// One requested field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequest {
    pub name: String,
    /// Explicit kind; inferred from config or the name when `None`.
    #[serde(default)]
    pub kind: Option<FieldKind>,
    /// Reconstruct the table under the label instead of a single value.
    #[serde(default)]
    pub table: bool,
}

impl FieldRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            table: false,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn as_table(mut self) -> Self {
        self.table = true;
        self
    }
}

impl From<&str> for FieldRequest {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldRequest {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Whether a field was located, and if not, which half of the search failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Found,
    /// No word on any processed page matched the label.
    LabelMissing,
    /// The label was present but nothing plausible lay within the search radius.
    ValueMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    /// Matched after OCR character repairs.
    Repaired,
    /// No pattern match; `raw_value` is kept for inspection.
    Mismatch,
}

/// How results from several pages are merged into one value per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// The first page (in document order) where the field is found wins.
    #[default]
    FirstFound,
    /// The last page where the field is found wins.
    LastFound,
}

/// Rows and cells recovered from word positions alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    /// Row-major cell texts; every row has one entry per column (empty when missing).
    pub rows: Vec<Vec<String>>,
    /// Rows that did not align with the majority column layout, cells left to right.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unassigned: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Extraction outcome for one requested field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub field_name: String,
    /// Value callers should use: the validated value, or the raw value when
    /// validation failed. `None` when the field was not found.
    pub value: Option<String>,
    pub raw_value: Option<String>,
    pub validated_value: Option<String>,
    pub confidence: f64,
    pub found: bool,
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStatus>,
    /// 1-based page the value came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableGrid>,
}

impl ExtractedField {
    pub fn not_found(field_name: impl Into<String>, status: FieldStatus) -> Self {
        debug_assert!(status != FieldStatus::Found);
        Self {
            field_name: field_name.into(),
            value: None,
            raw_value: None,
            validated_value: None,
            confidence: 0.0,
            found: false,
            status,
            validation: None,
            page: None,
            table: None,
        }
    }
}

/// Per-page output kept in the job result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-based page number.
    pub page: usize,
    pub word_count: usize,
    /// Page text in reconstructed reading order.
    pub reading_text: String,
    /// True when the reading order fell back to arrival order.
    #[serde(default)]
    pub fallback_order: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableGrid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub page: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub page_count: usize,
    pub pages_processed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<SkippedPage>,
    pub aggregation: AggregationPolicy,
    pub elapsed_ms: u64,
}

/// Aggregated output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// One entry per requested field, in request order.
    pub fields: IndexMap<String, ExtractedField>,
    pub pages: Vec<PageSummary>,
    pub metadata: ResultMetadata,
}
