//! Spatial layout analysis for a single page.
//!
//! A page's words arrive in whatever order the OCR engine emitted them. This
//! module turns them into:
//!
//! - a [`SpatialGraph`] of "must be read before" edges, built over row bands
//!   whose tolerance scales with the page's median word height
//! - a deterministic [`ReadingOrder`] (Kahn's algorithm with a min-heap)
//! - [`grid::GridLayout`]s reconstructed from column alignment
//!
//! [`PageLayout`] bundles all of it for the field locator. It owns the page's
//! words and is dropped as soon as the page has been processed.

pub mod bands;
pub mod graph;
pub mod grid;
pub mod order;

pub use graph::{OrderKey, SpatialGraph};
pub use grid::{GridLayout, build_grid, reconstruct_grid};
pub use order::{ReadingOrder, resolve, topological_order};

use crate::core::config::GraphConfig;
use crate::types::WordBox;

/// Build the graph for `words` and resolve it.
pub fn reading_order(words: &[WordBox], config: &GraphConfig) -> ReadingOrder {
    resolve(&SpatialGraph::build(words, config))
}

/// Everything known about one page's layout.
#[derive(Debug)]
pub struct PageLayout {
    words: Vec<WordBox>,
    graph: SpatialGraph,
    order: ReadingOrder,
    positions: Vec<usize>,
}

impl PageLayout {
    pub fn analyze(words: Vec<WordBox>, config: &GraphConfig) -> Self {
        let graph = SpatialGraph::build(&words, config);
        let order = resolve(&graph);
        let positions = order.positions();

        tracing::debug!(
            words = words.len(),
            edges = graph.edge_count(),
            bands = graph.band_count(),
            fallback = order.is_fallback(),
            "Page layout analyzed"
        );

        Self {
            words,
            graph,
            order,
            positions,
        }
    }

    pub fn words(&self) -> &[WordBox] {
        &self.words
    }

    pub fn word(&self, index: usize) -> &WordBox {
        &self.words[index]
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn graph(&self) -> &SpatialGraph {
        &self.graph
    }

    pub fn order(&self) -> &ReadingOrder {
        &self.order
    }

    /// Reading position of word `index`.
    pub fn position(&self, index: usize) -> usize {
        self.positions[index]
    }

    pub fn band_of(&self, index: usize) -> usize {
        self.graph.band_of(index)
    }

    /// Words in reading order.
    pub fn ordered_words(&self) -> impl Iterator<Item = &WordBox> + '_ {
        self.order.indices().iter().map(|&i| &self.words[i])
    }

    /// Page text in reading order, one line per row band.
    pub fn reading_text(&self) -> String {
        let mut text = String::new();
        let mut current_band = None;

        for &index in self.order.indices() {
            let band = self.graph.band_of(index);
            match current_band {
                None => {}
                Some(previous) if previous == band => text.push(' '),
                Some(_) => text.push('\n'),
            }
            text.push_str(&self.words[index].text);
            current_band = Some(band);
        }

        text
    }
}
