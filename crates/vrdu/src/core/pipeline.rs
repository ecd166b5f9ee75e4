//! Per-page extraction pipeline and multi-page aggregation.
//!
//! One page goes through, in order:
//! 1. Word filtering (confidence floor, empty text)
//! 2. Layout analysis: spatial graph and reading order
//! 3. Field location for every requested field, through the grid
//!    reconstructor when the field is tabular, through the radial locator
//!    otherwise
//! 4. Validation of every located value
//!
//! Everything built for the page is dropped when [`process_page`] returns;
//! only the [`PageOutcome`] survives.

use indexmap::IndexMap;

use crate::core::config::VrduConfig;
use crate::fields::{Anchor, FieldSpec, find_anchors, locate_value, validate_value};
use crate::layout::{PageLayout, build_grid};
use crate::types::{AggregationPolicy, ExtractedField, FieldStatus, PageSummary, TableGrid, WordBox};

/// Minimum data cells in the anchor's column before a plain field is read
/// from a grid instead of the radial search.
const MIN_TABULAR_DATA_ROWS: usize = 2;

/// What one page contributes to a job.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub summary: PageSummary,
    /// One entry per requested field, in request order.
    pub fields: Vec<ExtractedField>,
}

struct TableMatch {
    raw_value: String,
    confidence: f64,
    table: TableGrid,
}

/// Run the full pipeline on one page's words.
pub fn process_page(page: usize, words: Vec<WordBox>, fields: &[FieldSpec], config: &VrduConfig) -> PageOutcome {
    let received = words.len();
    let words: Vec<WordBox> = words
        .into_iter()
        .filter(|word| !word.text.trim().is_empty() && word.confidence >= config.ocr.min_confidence)
        .collect();

    tracing::debug!(page, received, kept = words.len(), "Filtered page words");

    let layout = PageLayout::analyze(words, &config.graph);
    let fields = fields
        .iter()
        .map(|spec| extract_field(&layout, page, spec, config))
        .collect();

    let table = if config.grid.page_tables {
        page_table(&layout, config)
    } else {
        None
    };

    PageOutcome {
        summary: PageSummary {
            page,
            word_count: layout.words().len(),
            reading_text: layout.reading_text(),
            fallback_order: layout.order().is_fallback(),
            table,
        },
        fields,
    }
}

fn extract_field(layout: &PageLayout, page: usize, spec: &FieldSpec, config: &VrduConfig) -> ExtractedField {
    let anchors = find_anchors(layout, &spec.name, &config.locator);
    if anchors.is_empty() {
        return ExtractedField::not_found(&spec.name, FieldStatus::LabelMissing);
    }

    if let Some(found) = anchors.iter().find_map(|anchor| table_under_anchor(layout, anchor, spec.table, config)) {
        return finish(spec, page, found.raw_value, found.confidence, Some(found.table), config);
    }

    if spec.table {
        return ExtractedField::not_found(&spec.name, FieldStatus::ValueMissing);
    }

    match locate_value(layout, &anchors, &config.locator) {
        Some(value) => finish(spec, page, value.raw_value, value.confidence, None, config),
        None => ExtractedField::not_found(&spec.name, FieldStatus::ValueMissing),
    }
}

/// Grid from the anchor's row downward, read in the anchor's column.
///
/// For a plain field (`forced == false`) this only succeeds when the anchor
/// sits in a header row of digit-free labels and its column holds enough data
/// below it.
fn table_under_anchor(layout: &PageLayout, anchor: &Anchor, forced: bool, config: &VrduConfig) -> Option<TableMatch> {
    let Some(&first) = anchor.words.first() else {
        return None;
    };
    let header_band = layout.band_of(first);

    if !forced {
        let header: Vec<usize> = (0..layout.words().len())
            .filter(|&i| layout.band_of(i) == header_band)
            .collect();
        if header.len() < config.grid.min_header_cells {
            return None;
        }
        // Column headers are labels; a row carrying values is a key/value line.
        let carries_values = header
            .iter()
            .filter(|index| !anchor.words.contains(index))
            .any(|&index| layout.words()[index].text.chars().any(|c| c.is_ascii_digit()));
        if carries_values {
            return None;
        }
    }

    let tolerance = layout.graph().row_tolerance();
    let top = anchor.region.y_center() - tolerance;
    let region: Vec<usize> = layout
        .words()
        .iter()
        .enumerate()
        .filter(|(_, word)| word.y_center() >= top)
        .map(|(index, _)| index)
        .collect();

    let grid = build_grid(layout.words(), &region, tolerance, &config.grid);
    let column = grid.column_for(anchor.region.x, anchor.region.right())?;

    let data_rows: Vec<_> = grid
        .rows
        .iter()
        .filter(|row| row.y_center > anchor.region.bottom())
        .collect();

    let column_cells: Vec<_> = data_rows
        .iter()
        .filter_map(|row| row.cells[column].as_ref())
        .filter(|cell| !cell.text.trim().is_empty())
        .collect();

    if !forced && column_cells.len() < MIN_TABULAR_DATA_ROWS {
        return None;
    }

    let (raw_value, cell_confidence) = match column_cells.first() {
        Some(cell) => (cell.text.clone(), cell.confidence),
        None => {
            let row = data_rows.first()?;
            let cells: Vec<_> = row.cells.iter().flatten().collect();
            let confidence = cells.iter().map(|c| c.confidence).sum::<f64>() / cells.len().max(1) as f64;
            let text = cells.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" | ");
            (text, confidence)
        }
    };

    Some(TableMatch {
        raw_value,
        confidence: (anchor.quality * cell_confidence).sqrt(),
        table: grid.to_table(),
    })
}

fn finish(
    spec: &FieldSpec,
    page: usize,
    raw_value: String,
    confidence: f64,
    table: Option<TableGrid>,
    config: &VrduConfig,
) -> ExtractedField {
    let outcome = validate_value(&raw_value, spec.kind, &config.validation);

    ExtractedField {
        field_name: spec.name.clone(),
        value: Some(outcome.validated_value.clone().unwrap_or_else(|| raw_value.clone())),
        raw_value: Some(raw_value),
        validated_value: outcome.validated_value,
        confidence: (confidence * outcome.confidence_factor).clamp(0.0, 1.0),
        found: true,
        status: FieldStatus::Found,
        validation: Some(outcome.status),
        page: Some(page),
        table,
    }
}

/// Page-level grid, kept when at least two rows look like table rows.
fn page_table(layout: &PageLayout, config: &VrduConfig) -> Option<TableGrid> {
    if layout.is_empty() {
        return None;
    }

    let all: Vec<usize> = (0..layout.words().len()).collect();
    let grid = build_grid(layout.words(), &all, layout.graph().row_tolerance(), &config.grid);

    let tabular_rows = grid
        .rows
        .iter()
        .filter(|row| row.cells.iter().flatten().count() >= config.grid.min_header_cells)
        .count();

    (tabular_rows >= 2).then(|| grid.to_table())
}

/// Merges per-page field results into one value per field.
#[derive(Debug, Clone)]
pub struct FieldAggregator {
    policy: AggregationPolicy,
    fields: IndexMap<String, ExtractedField>,
}

impl FieldAggregator {
    pub fn new(fields: &[FieldSpec], policy: AggregationPolicy) -> Self {
        Self {
            policy,
            fields: fields
                .iter()
                .map(|spec| {
                    (
                        spec.name.clone(),
                        ExtractedField::not_found(&spec.name, FieldStatus::LabelMissing),
                    )
                })
                .collect(),
        }
    }

    /// Fold one page's fields in. Pages must be absorbed in document order.
    pub fn absorb(&mut self, page_fields: Vec<ExtractedField>) {
        for field in page_fields {
            let Some(slot) = self.fields.get_mut(&field.field_name) else {
                continue;
            };

            if field.found {
                if !slot.found || self.policy == AggregationPolicy::LastFound {
                    *slot = field;
                }
            } else if !slot.found && field.status == FieldStatus::ValueMissing {
                slot.status = FieldStatus::ValueMissing;
            }
        }
    }

    pub fn finish(self) -> IndexMap<String, ExtractedField> {
        self.fields
    }
}
