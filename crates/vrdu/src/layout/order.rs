use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::{Result, VrduError};

use super::graph::{OrderKey, SpatialGraph};

/// Word indices in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingOrder {
    indices: Vec<usize>,
    fallback: bool,
}

impl ReadingOrder {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// True when the graph was inconsistent and arrival order was used instead.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Reading position of every word, indexed by word index.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.indices.len()];
        for (position, &word) in self.indices.iter().enumerate() {
            positions[word] = position;
        }
        positions
    }
}

/// Kahn's algorithm with a min-heap on the node key.
///
/// # Errors
///
/// Returns `VrduError::GraphConsistency` when the graph contains a cycle.
pub fn topological_order(graph: &SpatialGraph) -> Result<Vec<usize>> {
    let n = graph.node_count();
    let mut in_degree = vec![0usize; n];
    for (_, to) in graph.edges() {
        in_degree[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<(OrderKey, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse((graph.key(node), node)))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(node);
        for &next in graph.successors(node) {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((graph.key(next), next)));
            }
        }
    }

    if order.len() != n {
        return Err(VrduError::GraphConsistency(format!(
            "cycle detected: {} of {} nodes could not be ordered",
            n - order.len(),
            n
        )));
    }

    Ok(order)
}

/// Resolve a graph into a reading order, falling back to arrival order if the
/// graph turns out to be cyclic.
pub fn resolve(graph: &SpatialGraph) -> ReadingOrder {
    match topological_order(graph) {
        Ok(indices) => ReadingOrder {
            indices,
            fallback: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, nodes = graph.node_count(), "Reading order fell back to arrival order");
            ReadingOrder {
                indices: (0..graph.node_count()).collect(),
                fallback: true,
            }
        }
    }
}
