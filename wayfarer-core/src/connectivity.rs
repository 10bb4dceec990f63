/*!
Structural reports over the routing graph.

These are batch diagnostics, not query-path code: the CSR store is
mirrored into a petgraph `DiGraph` and component analysis is delegated to
`rustworkx-core`. The mirror relies on petgraph assigning indices in
insertion order, so mirror index `i` is exactly graph index `i`.
*/

use petgraph::graph::{DiGraph, NodeIndex};
use rustworkx_core::connectivity::{connected_components, number_connected_components};
use serde::Serialize;

use crate::graph::{Mode, MobilityGraph, NodeKind};

/// One weakly-connected component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInfo {
    pub size: usize,
    pub edge_count: usize,
    /// Directed density: `edges / (n * (n - 1))`, 0 for singletons.
    pub density: f64,
    /// Member node ids, ordered by graph index.
    pub node_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityReport {
    pub is_connected: bool,
    pub component_count: usize,
    pub largest_component_size: usize,
    /// Components ordered largest first.
    pub components: Vec<ComponentInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DegreeStats {
    pub average: f64,
    pub max: usize,
    pub min: usize,
}

/// Count of edges carrying each barrier attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarrierCounts {
    pub stairs: usize,
    pub bad_pavement: usize,
    pub flood_risk: usize,
    pub transfer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub nodes_by_kind: Vec<(NodeKind, usize)>,
    pub edges_by_mode: Vec<(Mode, usize)>,
    pub barriers: BarrierCounts,
    pub degrees: DegreeStats,
}

/// Weak-connectivity analysis of the whole graph.
#[must_use]
pub fn connectivity_report(graph: &MobilityGraph) -> ConnectivityReport {
    let mirror = mirror(graph);
    let component_count = number_connected_components(&mirror);

    let mut components: Vec<ComponentInfo> = connected_components(&mirror)
        .into_iter()
        .map(|members| {
            let mut indices: Vec<usize> = members.into_iter().map(|n| n.index()).collect();
            indices.sort_unstable();
            component_info(graph, indices)
        })
        .collect();
    components.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.node_ids.cmp(&b.node_ids)));

    ConnectivityReport {
        is_connected: component_count <= 1,
        component_count,
        largest_component_size: components.first().map_or(0, |c| c.size),
        components,
    }
}

/// Node, edge, barrier and degree statistics.
#[must_use]
pub fn structure_report(graph: &MobilityGraph) -> StructureReport {
    let n = graph.node_count();
    let e = graph.edge_count();

    let mut nodes_by_kind: Vec<(NodeKind, usize)> = Vec::new();
    for node in graph.nodes() {
        match nodes_by_kind.iter_mut().find(|(kind, _)| *kind == node.kind) {
            Some((_, count)) => *count += 1,
            None => nodes_by_kind.push((node.kind, 1)),
        }
    }

    let mut edges_by_mode: Vec<(Mode, usize)> = Vec::new();
    let mut barriers = BarrierCounts { stairs: 0, bad_pavement: 0, flood_risk: 0, transfer: 0 };
    for edge in graph.edges() {
        match edges_by_mode.iter_mut().find(|(mode, _)| *mode == edge.mode) {
            Some((_, count)) => *count += 1,
            None => edges_by_mode.push((edge.mode, 1)),
        }
        if edge.stairs {
            barriers.stairs += 1;
        }
        if edge.bad_pavement {
            barriers.bad_pavement += 1;
        }
        if edge.flood_risk {
            barriers.flood_risk += 1;
        }
        if edge.transfer {
            barriers.transfer += 1;
        }
    }

    // In-plus-out degree in one pass over the edge array.
    let mut degrees = vec![0usize; n];
    for idx in 0..n {
        degrees[idx] += graph.outgoing(idx).len();
    }
    for edge in graph.edges() {
        degrees[edge.to] += 1;
    }
    let degree_stats = DegreeStats {
        average: if n == 0 {
            0.0
        } else {
            degrees.iter().sum::<usize>() as f64 / n as f64
        },
        max: degrees.iter().copied().max().unwrap_or(0),
        min: degrees.iter().copied().min().unwrap_or(0),
    };

    StructureReport {
        node_count: n,
        edge_count: e,
        density: directed_density(n, e),
        nodes_by_kind,
        edges_by_mode,
        barriers,
        degrees: degree_stats,
    }
}

fn mirror(graph: &MobilityGraph) -> DiGraph<(), ()> {
    let mut mirror = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for _ in 0..graph.node_count() {
        mirror.add_node(());
    }
    for edge in graph.edges() {
        mirror.add_edge(NodeIndex::new(edge.from), NodeIndex::new(edge.to), ());
    }
    mirror
}

fn component_info(graph: &MobilityGraph, indices: Vec<usize>) -> ComponentInfo {
    // `indices` is sorted, so membership is a binary search away.
    let edge_count = graph
        .edges()
        .iter()
        .filter(|edge| indices.binary_search(&edge.from).is_ok())
        .count();

    ComponentInfo {
        size: indices.len(),
        edge_count,
        density: directed_density(indices.len(), edge_count),
        node_ids: indices.iter().map(|&idx| graph.node(idx).id.clone()).collect(),
    }
}

fn directed_density(n: usize, e: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        e as f64 / (n * (n - 1)) as f64
    }
}
