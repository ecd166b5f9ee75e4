//! Property-based tests for the spatial graph and reading order.
//!
//! Word boxes are generated with degenerate geometry mixed in (NaN, infinite
//! and negative coordinates, zero heights, stacked duplicates) to check that
//! the precedence graph stays acyclic and the resolver never falls back.

use proptest::prelude::*;
use vrdu::layout::{PageLayout, SpatialGraph, reading_order, resolve, topological_order};
use vrdu::{GraphConfig, WordBox};

fn coordinate() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -100.0..2500.0f64,
        1 => Just(0.0),
        1 => Just(-40.0),
        1 => Just(1.0e9),
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn extent() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 1.0..80.0f64,
        1 => Just(0.0),
        1 => Just(-5.0),
        1 => Just(f64::NAN),
    ]
}

fn word_box() -> impl Strategy<Value = WordBox> {
    ("[A-Za-z0-9$.]{1,8}", coordinate(), coordinate(), extent(), extent())
        .prop_map(|(text, x, y, width, height)| WordBox::new(text, 0.9, x, y, width, height))
}

fn page() -> impl Strategy<Value = Vec<WordBox>> {
    (prop::collection::vec(word_box(), 0..120), 0usize..4).prop_map(|(mut words, copies)| {
        // Stack exact duplicates of the first word.
        if let Some(first) = words.first().cloned() {
            words.extend(std::iter::repeat_n(first, copies));
        }
        words
    })
}

fn graph_config() -> impl Strategy<Value = GraphConfig> {
    (0.1..2.0f64, 0.0..3.0f64).prop_map(|(row_tolerance_ratio, column_band_ratio)| GraphConfig {
        row_tolerance_ratio,
        column_band_ratio,
    })
}

/// Property: the graph is acyclic for any set of word boxes
#[test]
fn proptest_graph_is_acyclic() {
    proptest!(|(words in page(), config in graph_config())| {
        let graph = SpatialGraph::build(&words, &config);

        prop_assert_eq!(graph.node_count(), words.len());
        prop_assert!(topological_order(&graph).is_ok());
        for (from, to) in graph.edges() {
            prop_assert!(graph.key(from) < graph.key(to), "edge {} -> {} runs against the key order", from, to);
        }
    });
}

/// Property: resolution never needs the arrival-order fallback
#[test]
fn proptest_resolution_never_falls_back() {
    proptest!(|(words in page())| {
        let order = reading_order(&words, &GraphConfig::default());

        prop_assert!(!order.is_fallback());
        let mut seen = order.indices().to_vec();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..words.len()).collect::<Vec<_>>());
    });
}

/// Property: every edge is respected by the resolved order
#[test]
fn proptest_order_respects_edges() {
    proptest!(|(words in page())| {
        let graph = SpatialGraph::build(&words, &GraphConfig::default());
        let positions = resolve(&graph).positions();

        for (from, to) in graph.edges() {
            prop_assert!(positions[from] < positions[to]);
        }
    });
}

/// Property: building the same page twice yields the same order
#[test]
fn proptest_order_is_deterministic() {
    proptest!(|(words in page())| {
        let config = GraphConfig::default();
        prop_assert_eq!(reading_order(&words, &config), reading_order(&words, &config));
    });
}

/// Property: page analysis copes with any geometry
#[test]
fn proptest_page_layout_no_panic() {
    proptest!(ProptestConfig::with_cases(64), |(words in page())| {
        let count = words.len();
        let layout = PageLayout::analyze(words, &GraphConfig::default());

        prop_assert_eq!(layout.ordered_words().count(), count);
        prop_assert!(!layout.order().is_fallback());
        let _ = layout.reading_text();
    });
}
