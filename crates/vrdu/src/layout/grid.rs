//! Table grid reconstruction from word positions alone.
//!
//! Rows come from the same band clustering the graph uses. Within a row, words
//! closer than the cell gap merge into one cell. The most common cell count
//! among rows defines the majority layout; its per-position x ranges become
//! column bands, and every row is then aligned against those bands. Rows that
//! do not fit (footers, notes, page numbers) are reported separately instead of
//! being forced into columns.

use ahash::AHashMap;

use crate::core::config::{GraphConfig, GridConfig};
use crate::types::{TableGrid, WordBox};

use super::bands::{cluster_rows, median_height, row_tolerance};

/// Fraction of a cell's width that must lie inside a column band.
const MIN_CELL_ALIGNMENT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub text: String,
    /// Mean recognition confidence of the merged words.
    pub confidence: f64,
    pub x0: f64,
    pub x1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBand {
    pub x0: f64,
    pub x1: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub y_center: f64,
    /// One slot per column.
    pub cells: Vec<Option<GridCell>>,
}

/// Reconstructed grid with the geometry needed to query it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLayout {
    pub columns: Vec<ColumnBand>,
    pub rows: Vec<GridRow>,
    pub unassigned: Vec<Vec<GridCell>>,
}

impl GridLayout {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column with the largest horizontal overlap with `x0..x1`.
    pub fn column_for(&self, x0: f64, x1: f64) -> Option<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, band)| (index, overlap(x0, x1, band.x0, band.x1)))
            .filter(|(_, shared)| *shared > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(index, _)| index)
    }

    pub fn to_table(&self) -> TableGrid {
        TableGrid {
            rows: self
                .rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| cell.as_ref().map(|c| c.text.clone()).unwrap_or_default())
                        .collect()
                })
                .collect(),
            unassigned: self
                .unassigned
                .iter()
                .map(|cells| cells.iter().map(|c| c.text.clone()).collect())
                .collect(),
        }
    }
}

fn overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

struct CellBuilder {
    text: String,
    confidence_sum: f64,
    words: usize,
    x0: f64,
    x1: f64,
}

impl CellBuilder {
    fn finish(self) -> GridCell {
        GridCell {
            text: self.text,
            confidence: self.confidence_sum / self.words as f64,
            x0: self.x0,
            x1: self.x1,
        }
    }
}

fn merge_cells(words: &[WordBox], row: &[usize], max_gap: f64) -> Vec<GridCell> {
    let mut cells: Vec<CellBuilder> = Vec::new();

    for &index in row {
        let word = &words[index];
        match cells.last_mut() {
            Some(cell) if word.x - cell.x1 < max_gap => {
                cell.text.push(' ');
                cell.text.push_str(&word.text);
                cell.confidence_sum += word.confidence;
                cell.words += 1;
                cell.x1 = cell.x1.max(word.right());
            }
            _ => cells.push(CellBuilder {
                text: word.text.clone(),
                confidence_sum: word.confidence,
                words: 1,
                x0: word.x,
                x1: word.right(),
            }),
        }
    }

    cells.into_iter().map(CellBuilder::finish).collect()
}

struct SourceRow {
    y_center: f64,
    cells: Vec<GridCell>,
}

struct Alignment {
    slots: Vec<(usize, GridCell)>,
    unaligned: Vec<GridCell>,
}

fn align(cells: &[GridCell], columns: &[ColumnBand]) -> Alignment {
    let mut alignment = Alignment {
        slots: Vec::new(),
        unaligned: Vec::new(),
    };

    for cell in cells {
        let width = cell.x1 - cell.x0;
        let best = columns
            .iter()
            .enumerate()
            .map(|(index, band)| {
                let shared = if width > 0.0 {
                    overlap(cell.x0, cell.x1, band.x0, band.x1) / width
                } else if cell.x0 >= band.x0 && cell.x0 <= band.x1 {
                    1.0
                } else {
                    0.0
                };
                (index, shared)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));

        match best {
            Some((column, share)) if share >= MIN_CELL_ALIGNMENT => alignment.slots.push((column, cell.clone())),
            _ => alignment.unaligned.push(cell.clone()),
        }
    }

    alignment
}

fn majority_cell_count(rows: &[SourceRow]) -> usize {
    let mut frequency: AHashMap<usize, usize> = AHashMap::new();
    for row in rows {
        *frequency.entry(row.cells.len()).or_insert(0) += 1;
    }

    frequency
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map_or(0, |(count, _)| count)
}

/// Reconstruct the grid formed by `indices` (a subset of `words`).
///
/// `row_tolerance` is the page's row tolerance so rows cluster the same way the
/// reading order does.
pub fn build_grid(words: &[WordBox], indices: &[usize], row_tolerance: f64, config: &GridConfig) -> GridLayout {
    if indices.is_empty() {
        return GridLayout::default();
    }

    let max_gap = median_height(words, indices) * config.cell_gap_ratio;
    let rows: Vec<SourceRow> = cluster_rows(words, indices, row_tolerance)
        .into_iter()
        .map(|row| SourceRow {
            y_center: row.iter().map(|&i| words[i].y_center()).sum::<f64>() / row.len() as f64,
            cells: merge_cells(words, &row, max_gap),
        })
        .collect();

    let majority = majority_cell_count(&rows);
    if majority < 2 {
        return GridLayout::default();
    }

    let mut columns: Vec<ColumnBand> = (0..majority)
        .map(|position| {
            let mut band = ColumnBand {
                x0: f64::INFINITY,
                x1: f64::NEG_INFINITY,
            };
            for row in rows.iter().filter(|row| row.cells.len() == majority) {
                band.x0 = band.x0.min(row.cells[position].x0);
                band.x1 = band.x1.max(row.cells[position].x1);
            }
            band
        })
        .collect();

    let mut alignments: Vec<Alignment> = rows.iter().map(|row| align(&row.cells, &columns)).collect();

    let mut fill = vec![0usize; columns.len()];
    for alignment in &alignments {
        let mut seen = vec![false; columns.len()];
        for (column, _) in &alignment.slots {
            seen[*column] = true;
        }
        for (column, hit) in seen.into_iter().enumerate() {
            fill[column] += usize::from(hit);
        }
    }

    let min_fill = config.min_column_fill * rows.len() as f64;
    if fill.iter().any(|&count| (count as f64) < min_fill) {
        columns = columns
            .into_iter()
            .zip(&fill)
            .filter(|(_, count)| **count as f64 >= min_fill)
            .map(|(band, _)| band)
            .collect();
        if columns.len() < 2 {
            return GridLayout::default();
        }
        alignments = rows.iter().map(|row| align(&row.cells, &columns)).collect();
    }

    let mut layout = GridLayout {
        columns,
        rows: Vec::new(),
        unassigned: Vec::new(),
    };

    for (row, alignment) in rows.into_iter().zip(alignments) {
        let mut slots: Vec<Option<GridCell>> = vec![None; layout.columns.len()];
        for (column, cell) in alignment.slots.iter().cloned() {
            slots[column] = Some(match slots[column].take() {
                Some(mut existing) => {
                    existing.text.push(' ');
                    existing.text.push_str(&cell.text);
                    existing.confidence = existing.confidence.min(cell.confidence);
                    existing.x1 = existing.x1.max(cell.x1);
                    existing
                }
                None => cell,
            });
        }

        let covered = slots.iter().filter(|slot| slot.is_some()).count();
        let coverage = covered as f64 / layout.columns.len() as f64;
        if coverage < config.min_row_overlap || alignment.unaligned.len() > alignment.slots.len() {
            layout.unassigned.push(row.cells);
        } else {
            layout.rows.push(GridRow {
                y_center: row.y_center,
                cells: slots,
            });
        }
    }

    layout
}

/// Reconstruct a table from every word on a page.
pub fn reconstruct_grid(words: &[WordBox], graph: &GraphConfig, grid: &GridConfig) -> TableGrid {
    let all: Vec<usize> = (0..words.len()).collect();
    let tolerance = row_tolerance(median_height(words, &all), graph.row_tolerance_ratio);
    build_grid(words, &all, tolerance, grid).to_table()
}
