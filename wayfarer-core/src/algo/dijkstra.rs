//! Dijkstra's algorithm over the CSR graph.
//!
//! The heap holds `(distance, node)` pairs; ties break on the smaller node
//! index, which pins down a deterministic relaxation order and therefore a
//! deterministic path among equal-cost alternatives. There is no
//! decrease-key: improved distances push a duplicate entry and stale
//! entries are discarded on pop.
//!
//! The same search core serves three callers: the public point-to-point
//! query, Yen's spur searches (through a [`PathMask`] overlay that hides
//! nodes and edges without touching the immutable graph), and the batch
//! analyser (full single-source sweeps, see [`crate::analysis`]).

use std::collections::BinaryHeap;
use std::time::Instant;

use ahash::HashSet;

use crate::algo::{MinScored, Route};
use crate::cost::CostParams;
use crate::graph::MobilityGraph;

/// Sentinel for "no predecessor" in the dense predecessor arrays.
pub(crate) const NO_PRED: usize = usize::MAX;

/// Logical overlay that hides parts of the graph from one search.
///
/// Yen's algorithm needs per-spur exclusions; masking at relaxation time
/// avoids copying or mutating the shared graph.
#[derive(Debug, Default)]
pub(crate) struct PathMask {
    pub nodes: HashSet<usize>,
    pub edges: HashSet<(usize, usize)>,
}

impl PathMask {
    fn skips(&self, from: usize, to: usize) -> bool {
        self.nodes.contains(&to) || self.edges.contains(&(from, to))
    }
}

/// Dense per-query search state. Allocated on entry, dropped with the
/// query; nothing is shared between concurrent searches.
pub(crate) struct SearchState {
    pub dist: Vec<f64>,
    pub pred_node: Vec<usize>,
    pub pred_edge: Vec<usize>,
    pub timed_out: bool,
}

impl SearchState {
    fn new(node_count: usize) -> Self {
        SearchState {
            dist: vec![f64::INFINITY; node_count],
            pred_node: vec![NO_PRED; node_count],
            pred_edge: vec![NO_PRED; node_count],
            timed_out: false,
        }
    }

    pub(crate) fn reached(&self, node: usize) -> bool {
        self.dist[node].is_finite()
    }
}

/// Core relaxation loop. With `target = None` the search settles every
/// reachable node (single-source mode); otherwise it stops as soon as the
/// target is settled. `deadline` is checked once per heap pop.
pub(crate) fn search(
    graph: &MobilityGraph,
    source: usize,
    target: Option<usize>,
    params: &CostParams,
    mask: Option<&PathMask>,
    deadline: Option<Instant>,
) -> SearchState {
    let mut state = SearchState::new(graph.node_count());
    if mask.is_some_and(|m| m.nodes.contains(&source)) {
        return state;
    }

    let mut visit_next = BinaryHeap::new();
    state.dist[source] = 0.0;
    visit_next.push(MinScored(0.0, source));

    while let Some(MinScored(node_score, node)) = visit_next.pop() {
        if deadline.is_some_and(|limit| Instant::now() >= limit) {
            state.timed_out = true;
            return state;
        }
        // Stale duplicate of an already-settled node.
        if node_score > state.dist[node] {
            continue;
        }
        if target == Some(node) {
            break;
        }

        let first_edge = graph.head(node);
        for (offset, edge) in graph.outgoing(node).iter().enumerate() {
            if mask.is_some_and(|m| m.skips(node, edge.to)) {
                continue;
            }

            let next_score = node_score + params.edge_cost(edge);
            if next_score < state.dist[edge.to] {
                state.dist[edge.to] = next_score;
                state.pred_node[edge.to] = node;
                state.pred_edge[edge.to] = first_edge + offset;
                visit_next.push(MinScored(next_score, edge.to));
            }
        }
    }

    state
}

/// Walks the predecessor chain back from `target`. Returns `None` when the
/// target was never reached.
pub(crate) fn reconstruct(state: &SearchState, source: usize, target: usize) -> Option<Vec<usize>> {
    if !state.reached(target) {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = state.pred_node[current];
        path.push(current);
    }
    path.reverse();
    Some(path)
}

pub(crate) fn shortest_masked(
    graph: &MobilityGraph,
    source: usize,
    target: usize,
    params: &CostParams,
    mask: &PathMask,
) -> Route {
    let state = search(graph, source, Some(target), params, Some(mask), None);
    match reconstruct(&state, source, target) {
        Some(path) => Route { cost: state.dist[target], path },
        None => Route::not_found(),
    }
}

/// Lowest-cost path from `source` to `target` under `params`.
///
/// Returns the single-node route with cost 0 when `source == target` and
/// the empty route when the target is unreachable. The returned cost is
/// exactly the sum of per-edge costs along the path.
///
/// # Panics
/// Panics if either index is out of `[0, node_count)`.
#[must_use]
pub fn shortest(graph: &MobilityGraph, source: usize, target: usize, params: &CostParams) -> Route {
    let (route, _) = shortest_guarded(graph, source, target, params, None);
    route
}

/// [`shortest`] with an optional wall-clock deadline, checked at each heap
/// pop. On expiry the search stops and reports `(empty route, true)`; all
/// scratch state is dropped on every exit path alike.
#[must_use]
pub fn shortest_guarded(
    graph: &MobilityGraph,
    source: usize,
    target: usize,
    params: &CostParams,
    deadline: Option<Instant>,
) -> (Route, bool) {
    assert!(source < graph.node_count(), "source index out of range");
    assert!(target < graph.node_count(), "target index out of range");

    if source == target {
        return (Route { path: vec![source], cost: 0.0 }, false);
    }

    let state = search(graph, source, Some(target), params, None, deadline);
    if state.timed_out {
        return (Route::not_found(), true);
    }

    let route = match reconstruct(&state, source, target) {
        Some(path) => Route { cost: state.dist[target], path },
        None => Route::not_found(),
    };
    (route, false)
}
