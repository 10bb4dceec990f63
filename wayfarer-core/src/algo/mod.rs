pub mod dijkstra;
pub mod yen;

pub use dijkstra::{shortest, shortest_guarded};
pub use yen::{k_shortest, k_shortest_guarded};

use std::cmp::Ordering;

use serde::Serialize;

/// A path through the graph as dense node indices plus its total
/// profile-weighted cost.
///
/// An empty `path` encodes "no route found" and is a legal value, not an
/// error; a single-element path is the trivial source-equals-target route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub path: Vec<usize>,
    pub cost: f64,
}

impl Route {
    #[must_use]
    pub fn not_found() -> Self {
        Route { path: Vec::new(), cost: 0.0 }
    }

    /// `true` when no route exists between the queried endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// `MinScored<K>` holds an `f64` score and a key `K` for use with a
/// `BinaryHeap` as a min-heap: ordering is reversed on the score, and ties
/// fall back to the reversed key ordering so equal-cost entries pop in
/// deterministic (smallest-key-first) order.
///
/// Scores must be finite; cost parameters are validated at construction,
/// so every score fed in here is.
#[derive(Clone, PartialEq)]
pub(crate) struct MinScored<K>(pub f64, pub K);

impl<K: PartialEq> Eq for MinScored<K> {}

impl<K: Ord> PartialOrd for MinScored<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for MinScored<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .partial_cmp(&self.0)
            .unwrap()
            .then_with(|| other.1.cmp(&self.1))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn min_scored_pops_lowest_score_first() {
        let mut heap = BinaryHeap::new();
        heap.push(MinScored(3.0, 7usize));
        heap.push(MinScored(1.0, 9));
        heap.push(MinScored(2.0, 8));

        assert_eq!(heap.pop().unwrap().1, 9);
        assert_eq!(heap.pop().unwrap().1, 8);
        assert_eq!(heap.pop().unwrap().1, 7);
    }

    #[test]
    fn ties_break_on_smallest_key() {
        let mut heap = BinaryHeap::new();
        heap.push(MinScored(1.0, 5usize));
        heap.push(MinScored(1.0, 2));
        heap.push(MinScored(1.0, 4));

        assert_eq!(heap.pop().unwrap().1, 2);
        assert_eq!(heap.pop().unwrap().1, 4);
        assert_eq!(heap.pop().unwrap().1, 5);
    }
}
