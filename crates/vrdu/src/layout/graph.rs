use std::cmp::Ordering;

use crate::core::config::GraphConfig;
use crate::types::WordBox;

use super::bands::{band_indices, median_height, row_tolerance};

/// Total-order key of a node: row band, then x, then arrival index.
///
/// Edges only run from a smaller key to a larger one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderKey {
    pub band: usize,
    pub x: f64,
    pub arrival: usize,
}

impl Eq for OrderKey {}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.band
            .cmp(&other.band)
            .then_with(|| self.x.total_cmp(&other.x))
            .then_with(|| self.arrival.cmp(&other.arrival))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// "Must be read before" relation over the words of one page.
///
/// Nodes are word indices into the page's arrival-ordered word list; the graph
/// does not own the words.
#[derive(Debug, Clone, Default)]
pub struct SpatialGraph {
    keys: Vec<OrderKey>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
    band_count: usize,
    median_height: f64,
    row_tolerance: f64,
    column_band: f64,
}

impl SpatialGraph {
    /// Build the precedence graph for one page.
    pub fn build(words: &[WordBox], config: &GraphConfig) -> Self {
        if words.is_empty() {
            return Self::default();
        }

        let all: Vec<usize> = (0..words.len()).collect();
        let median = median_height(words, &all);
        let tolerance = row_tolerance(median, config.row_tolerance_ratio);
        let column_band = median * config.column_band_ratio;
        let (band_of, band_count) = band_indices(words, tolerance);

        let keys: Vec<OrderKey> = words
            .iter()
            .enumerate()
            .map(|(arrival, word)| OrderKey {
                band: band_of[arrival],
                x: word.x,
                arrival,
            })
            .collect();

        let mut sorted = all;
        sorted.sort_by_key(|&i| keys[i]);

        let mut graph = Self {
            keys,
            adjacency: vec![Vec::new(); words.len()],
            edge_count: 0,
            band_count,
            median_height: median,
            row_tolerance: tolerance,
            column_band,
        };

        for (pos, &a) in sorted.iter().enumerate() {
            for &b in &sorted[pos + 1..] {
                if graph.precedes(words, a, b) {
                    graph.adjacency[a].push(b);
                    graph.edge_count += 1;
                }
            }
        }

        graph
    }

    /// Whether `a` (with the smaller key) must be read before `b`.
    fn precedes(&self, words: &[WordBox], a: usize, b: usize) -> bool {
        let (band_a, band_b) = (self.keys[a].band, self.keys[b].band);
        if band_a == band_b {
            return true;
        }

        let (wa, wb) = (&words[a], &words[b]);
        let center = wb.x_center();
        wa.x_overlap(wb) > 0.0 || (center >= wa.x - self.column_band && center <= wa.right() + self.column_band)
    }

    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, node: usize) -> OrderKey {
        self.keys[node]
    }

    pub fn band_of(&self, node: usize) -> usize {
        self.keys[node].band
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    /// All edges as `(from, to)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    pub fn median_height(&self) -> f64 {
        self.median_height
    }

    pub fn row_tolerance(&self) -> f64 {
        self.row_tolerance
    }

    pub fn column_band(&self) -> f64 {
        self.column_band
    }

    /// Insert an edge without the ordering check. Only tests use this, to
    /// exercise cycle recovery.
    #[cfg(test)]
    pub(crate) fn insert_edge_unchecked(&mut self, from: usize, to: usize) {
        self.adjacency[from].push(to);
        self.edge_count += 1;
    }
}
