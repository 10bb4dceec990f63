//! Yen's k-shortest-loopless-paths over the Dijkstra core.
//!
//! Each accepted route is probed at every spur position: the prefix up to
//! the spur is pinned, edges that would recreate an already-known
//! continuation are hidden, nodes before the spur are hidden (which keeps
//! every candidate loopless), and a masked Dijkstra finds the cheapest
//! deviation. Exclusions are [`PathMask`] overlays on the shared immutable
//! graph; no per-spur graph copies are made.

use std::collections::BinaryHeap;
use std::time::Instant;

use ahash::{HashSet, HashSetExt};

use crate::algo::dijkstra::{shortest_guarded, shortest_masked, PathMask};
use crate::algo::{MinScored, Route};
use crate::cost::CostParams;
use crate::graph::MobilityGraph;

/// Up to `k` loopless routes from `source` to `target`, pairwise distinct
/// as node sequences and in nondecreasing cost order.
///
/// Fewer than `k` results (possibly none) are returned when the graph does
/// not contain that many distinct loopless paths; that is not an error.
/// `k == 0` requests nothing and returns nothing.
///
/// # Panics
/// Panics if either index is out of `[0, node_count)`.
#[must_use]
pub fn k_shortest(
    graph: &MobilityGraph,
    source: usize,
    target: usize,
    params: &CostParams,
    k: usize,
) -> Vec<Route> {
    let (routes, _) = k_shortest_guarded(graph, source, target, params, k, None);
    routes
}

/// [`k_shortest`] with an optional wall-clock deadline shared by all spur
/// searches. On expiry the routes accepted so far are returned along with
/// a `true` timed-out flag.
#[must_use]
pub fn k_shortest_guarded(
    graph: &MobilityGraph,
    source: usize,
    target: usize,
    params: &CostParams,
    k: usize,
    deadline: Option<Instant>,
) -> (Vec<Route>, bool) {
    if k == 0 {
        return (Vec::new(), false);
    }

    let (first, timed_out) = shortest_guarded(graph, source, target, params, deadline);
    if timed_out {
        return (Vec::new(), true);
    }
    if first.is_empty() {
        return (Vec::new(), false);
    }

    let mut accepted = vec![first];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    seen.insert(accepted[0].path.clone());

    // Candidate pool ordered by (cost, node sequence); surviving candidates
    // carry over between rounds, so the pop order is globally nondecreasing.
    let mut candidates: BinaryHeap<MinScored<Vec<usize>>> = BinaryHeap::new();

    while accepted.len() < k {
        if deadline.is_some_and(|limit| Instant::now() >= limit) {
            return (accepted, true);
        }

        let previous = accepted.last().expect("at least the shortest route").path.clone();
        let prefix_costs = cumulative_costs(graph, params, &previous);

        for spur_pos in 0..previous.len() - 1 {
            let spur_node = previous[spur_pos];
            let root = &previous[..=spur_pos];

            let mut mask = PathMask::default();
            for route in &accepted {
                if route.path.len() > spur_pos + 1 && route.path[..=spur_pos] == *root {
                    mask.edges.insert((spur_node, route.path[spur_pos + 1]));
                }
            }
            // Hiding the prefix nodes keeps the spur path disjoint from the
            // root, hence the candidate loopless.
            mask.nodes.extend(root[..spur_pos].iter().copied());

            let spur_route = shortest_masked(graph, spur_node, target, params, &mask);
            if spur_route.is_empty() {
                continue;
            }

            let mut path: Vec<usize> = root[..spur_pos].to_vec();
            path.extend(spur_route.path);
            if seen.contains(&path) {
                continue;
            }

            let cost = prefix_costs[spur_pos] + spur_route.cost;
            seen.insert(path.clone());
            candidates.push(MinScored(cost, path));
        }

        match candidates.pop() {
            Some(MinScored(cost, path)) => accepted.push(Route { path, cost }),
            None => break,
        }
    }

    (accepted, false)
}

/// `result[i]` is the cost of the first `i` edges of `path`. The path came
/// out of a search over this graph, so every consecutive pair has an edge.
fn cumulative_costs(graph: &MobilityGraph, params: &CostParams, path: &[usize]) -> Vec<f64> {
    let mut costs = Vec::with_capacity(path.len());
    let mut total = 0.0;
    costs.push(0.0);
    for pair in path.windows(2) {
        let edge = graph
            .cheapest_edge(pair[0], pair[1], params)
            .expect("accepted route traverses existing edges");
        total += params.edge_cost(edge);
        costs.push(total);
    }
    costs
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::cost::profile_params;
    use crate::graph::tests::{edge, node};
    use crate::graph::{build_graph, Mode, MobilityGraph, NodeKind};

    /// The classic Yen example graph (C..H), relabelled N0..N5.
    /// Expected 3 shortest N0 -> N5: [0,2,3,5], [0,2,4,5], [0,1,3,5].
    fn yen_example() -> MobilityGraph {
        build_graph(
            vec![
                node("N0", NodeKind::Bus),
                node("N1", NodeKind::Bus),
                node("N2", NodeKind::Bus),
                node("N3", NodeKind::Bus),
                node("N4", NodeKind::Bus),
                node("N5", NodeKind::Bus),
            ],
            vec![
                edge("N0", "N1", 3.0, Mode::Bus),
                edge("N0", "N2", 2.0, Mode::Bus),
                edge("N1", "N3", 4.0, Mode::Bus),
                edge("N2", "N1", 1.0, Mode::Bus),
                edge("N2", "N3", 2.0, Mode::Bus),
                edge("N2", "N4", 3.0, Mode::Bus),
                edge("N3", "N4", 2.0, Mode::Bus),
                edge("N3", "N5", 1.0, Mode::Bus),
                edge("N4", "N5", 2.0, Mode::Bus),
            ],
        )
        .unwrap()
    }

    #[test]
    fn finds_the_classic_three() {
        let graph = yen_example();
        let params = profile_params("standard", false).unwrap();
        let routes = k_shortest(&graph, 0, 5, &params, 3);

        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].path, vec![0, 2, 3, 5]);
        assert_eq!(routes[1].path, vec![0, 2, 4, 5]);
        assert_eq!(routes[2].path, vec![0, 1, 3, 5]);
        // alpha = 6 scales the textbook costs 5, 7, 8.
        assert_abs_diff_eq!(routes[0].cost, 30.0);
        assert_abs_diff_eq!(routes[1].cost, 42.0);
        assert_abs_diff_eq!(routes[2].cost, 48.0);
    }

    #[test]
    fn results_are_loopless_distinct_and_sorted() {
        let graph = yen_example();
        let params = profile_params("standard", false).unwrap();
        let routes = k_shortest(&graph, 0, 5, &params, 10);

        for window in routes.windows(2) {
            assert!(window[0].cost <= window[1].cost);
            assert_ne!(window[0].path, window[1].path);
        }
        for route in &routes {
            let mut seen = route.path.clone();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), route.path.len(), "route revisits a node");
        }
    }

    #[test]
    fn k_larger_than_path_space_returns_what_exists() {
        let graph = build_graph(
            vec![
                node("A", NodeKind::Bus),
                node("B", NodeKind::Bus),
                node("C", NodeKind::Bus),
            ],
            vec![
                edge("A", "B", 1.0, Mode::Bus),
                edge("B", "C", 1.0, Mode::Bus),
                edge("A", "C", 3.0, Mode::Walk),
            ],
        )
        .unwrap();
        let params = profile_params("standard", false).unwrap();

        let routes = k_shortest(&graph, 0, 2, &params, 25);
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn disconnected_pair_returns_nothing() {
        let graph = build_graph(
            vec![node("A", NodeKind::Bus), node("B", NodeKind::Bus)],
            vec![],
        )
        .unwrap();
        let params = profile_params("standard", false).unwrap();

        assert!(k_shortest(&graph, 0, 1, &params, 3).is_empty());
    }

    #[test]
    fn k_zero_requests_nothing() {
        let graph = yen_example();
        let params = profile_params("standard", false).unwrap();
        assert!(k_shortest(&graph, 0, 5, &params, 0).is_empty());
    }
}
