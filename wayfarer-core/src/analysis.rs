/*!
Edge-improvement analysis: which edges would pay off most if fixed.

The analyser sweeps a deterministic sample of origin/destination pairs,
computes the shortest path for each under the supplied cost model, and
aggregates, per edge, the cost that clearing its worst fixable attribute
(stairs, broken pavement, flood risk) would save across the paths that
traverse it. Heavily-used fixable edges float to the top.

Savings use the raw coefficient tuple without the profile and weather
gates: a broken pavement found on the standard profile's paths still
reports what it costs the travellers it *does* penalise. The querying
params only shape which paths the sample takes.

Sampling is stride-based and documented: origins are every
`ceil(N / MAX_SAMPLED_SOURCES)`-th node index, destinations are sampled
with the same stride, and each origin costs one full Dijkstra sweep.
Origins fan out across a rayon pool with per-worker scratch; partial
results are folded in origin order, so the outcome is reproducible.
*/

use ahash::{HashMap, HashMapExt};
use rayon::prelude::*;
use serde::Serialize;

use crate::algo::dijkstra::{search, NO_PRED};
use crate::cost::CostParams;
use crate::graph::{Edge, MobilityGraph};
use crate::itinerary::BarrierKind;

/// Cap on sampled origins (and destinations); above this node count the
/// sweep strides across the index space instead of visiting every pair.
pub const MAX_SAMPLED_SOURCES: usize = 256;

/// Impact-score thresholds for the priority buckets.
const IMPACT_HIGH: f64 = 50.0;
const IMPACT_MEDIUM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn from_score(score: f64) -> Self {
        if score > IMPACT_HIGH {
            Self::High
        } else if score > IMPACT_MEDIUM {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One ranked improvement suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeImprovement {
    pub from: String,
    pub to: String,
    pub from_idx: usize,
    pub to_idx: usize,
    /// The fixable attribute whose removal saves the most on this edge.
    pub issue: BarrierKind,
    /// Per-traversal cost of the edge under the querying params.
    pub current_cost: f64,
    /// Summed savings across all sampled shortest paths using the edge.
    pub potential_savings: f64,
    /// Number of sampled shortest paths that traverse the edge.
    pub affected_routes: usize,
    /// `potential_savings * ln(1 + affected_routes)`.
    pub impact_score: f64,
    pub priority: Priority,
}

/// Ranks fixable edges by estimated improvement impact, best first, at
/// most `max_results` entries. An empty graph yields an empty list.
#[must_use]
pub fn rank_fixable_edges(
    graph: &MobilityGraph,
    params: &CostParams,
    max_results: usize,
) -> Vec<EdgeImprovement> {
    let n = graph.node_count();
    if n == 0 || graph.edge_count() == 0 || max_results == 0 {
        return Vec::new();
    }

    let stride = n.div_ceil(MAX_SAMPLED_SOURCES).max(1);
    let sources: Vec<usize> = (0..n).step_by(stride).collect();
    log::debug!(
        "edge analysis: {} of {} nodes sampled (stride {})",
        sources.len(),
        n,
        stride
    );

    // One SSSP sweep per origin; fold in origin order for reproducibility.
    let per_source: Vec<HashMap<usize, (f64, usize)>> = sources
        .par_iter()
        .map(|&source| sweep_source(graph, params, source, stride))
        .collect();

    let mut totals: HashMap<usize, (f64, usize)> = HashMap::new();
    for local in per_source {
        for (edge_idx, (savings, count)) in local {
            let entry = totals.entry(edge_idx).or_insert((0.0, 0));
            entry.0 += savings;
            entry.1 += count;
        }
    }

    let mut improvements: Vec<EdgeImprovement> = totals
        .into_iter()
        .map(|(edge_idx, (savings, count))| {
            let edge = graph.edge(edge_idx);
            let (issue, _) = worst_fixable(edge, params)
                .expect("aggregated edges carry a fixable attribute");
            let impact_score = savings * (1.0 + count as f64).ln();
            EdgeImprovement {
                from: graph.node(edge.from).id.clone(),
                to: graph.node(edge.to).id.clone(),
                from_idx: edge.from,
                to_idx: edge.to,
                issue,
                current_cost: params.edge_cost(edge),
                potential_savings: savings,
                affected_routes: count,
                impact_score,
                priority: Priority::from_score(impact_score),
            }
        })
        .collect();

    improvements.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .expect("impact scores are finite")
            .then_with(|| (a.from_idx, a.to_idx).cmp(&(b.from_idx, b.to_idx)))
    });
    improvements.truncate(max_results);
    improvements
}

/// Shortest paths from one origin to every sampled destination, folded
/// into a local `edge index -> (savings, path count)` map.
fn sweep_source(
    graph: &MobilityGraph,
    params: &CostParams,
    source: usize,
    stride: usize,
) -> HashMap<usize, (f64, usize)> {
    let state = search(graph, source, None, params, None, None);

    let mut local: HashMap<usize, (f64, usize)> = HashMap::new();
    for target in (0..graph.node_count()).step_by(stride) {
        if target == source || !state.reached(target) {
            continue;
        }

        let mut current = target;
        while current != source {
            let edge_idx = state.pred_edge[current];
            debug_assert_ne!(edge_idx, NO_PRED);
            let edge = graph.edge(edge_idx);

            if let Some((_, savings)) = worst_fixable(edge, params) {
                let entry = local.entry(edge_idx).or_insert((0.0, 0));
                entry.0 += savings;
                entry.1 += 1;
            }
            current = edge.from;
        }
    }
    local
}

/// The fixable attribute with the largest per-traversal saving on this
/// edge, ungated by profile or weather. Returns `None` for clean edges.
fn worst_fixable(edge: &Edge, params: &CostParams) -> Option<(BarrierKind, f64)> {
    let candidates = [
        (BarrierKind::Stairs, edge.stairs, params.beta),
        (BarrierKind::BadPavement, edge.bad_pavement, params.gamma),
        (BarrierKind::FloodRisk, edge.flood_risk, params.delta),
    ];

    candidates
        .into_iter()
        .filter(|(_, flagged, _)| *flagged)
        .map(|(kind, _, coefficient)| (kind, coefficient * edge.time_min))
        .filter(|(_, savings)| *savings > 0.0)
        .max_by(|a, b| a.1.partial_cmp(&b.1).expect("savings are finite"))
}
