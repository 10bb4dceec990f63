/*!
This module defines the immutable [`MobilityGraph`] and the value types it
is built from.

# Structs
- `Node`: a place in the network (stop, station, entrance, point of interest).
- `EdgeRecord`: one parsed edge row, endpoints still identified by string id.
- `Edge`: a resolved directed edge, endpoints as dense indices.
- `MobilityGraph`: CSR adjacency over the node table plus the id → index map.

The graph uses a compressed-sparse-row layout: `heads[i]..heads[i + 1]`
delimits the outgoing edges of node `i` inside one packed edge array, so
neighbour iteration is a contiguous slice with no per-query allocation.
External string ids are resolved to indices once, at the boundary; every
hot path works on `usize` indices only.
*/

use std::fmt::{self, Display};

use ahash::{HashMap, HashMapExt};
use geo::Point;
use serde::Serialize;

use crate::cost::CostParams;
use crate::Error;

/// What a node represents on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Metro,
    Bus,
    Rail,
    Tram,
    Entrance,
    Poi,
}

impl NodeKind {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "metro" => Ok(Self::Metro),
            "bus" => Ok(Self::Bus),
            "rail" => Ok(Self::Rail),
            "tram" => Ok(Self::Tram),
            "entrance" => Ok(Self::Entrance),
            "poi" => Ok(Self::Poi),
            other => Err(Error::InvalidKind(other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metro => "metro",
            Self::Bus => "bus",
            Self::Rail => "rail",
            Self::Tram => "tram",
            Self::Entrance => "entrance",
            Self::Poi => "poi",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Travel mode of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Walk,
    Bus,
    Metro,
    Rail,
    Tram,
}

impl Mode {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "walk" => Ok(Self::Walk),
            "bus" => Ok(Self::Bus),
            "metro" => Ok(Self::Metro),
            "rail" => Ok(Self::Rail),
            "tram" => Ok(Self::Tram),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Bus => "bus",
            Self::Metro => "metro",
            Self::Rail => "rail",
            Self::Tram => "tram",
        }
    }

    /// `true` for every mode that involves boarding a vehicle.
    #[must_use]
    pub const fn is_vehicle(self) -> bool {
        !matches!(self, Self::Walk)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A place in the network. `id` is the stable external identifier; the dense
/// index a node receives at build time never leaks out of the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: NodeKind,
}

impl Node {
    /// Geographic location as an `(x = lon, y = lat)` point.
    #[must_use]
    pub fn location(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

/// One parsed edge row, as handed over by an ingestion adapter. Endpoints
/// are still external ids; [`build_graph`] resolves them to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub time_min: f64,
    pub transfer: bool,
    pub stairs: bool,
    pub bad_pavement: bool,
    pub flood_risk: bool,
    pub mode: Mode,
}

/// A resolved directed edge. `from` and `to` are dense node indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub time_min: f64,
    pub transfer: bool,
    pub stairs: bool,
    pub bad_pavement: bool,
    pub flood_risk: bool,
    pub mode: Mode,
}

/// Immutable multimodal graph: node table, CSR adjacency and id map.
///
/// Built once via [`build_graph`], then shared read-only; all accessors take
/// `&self` and the type is `Send + Sync`, so concurrent queries need no
/// synchronisation.
#[derive(Debug, Clone)]
pub struct MobilityGraph {
    nodes: Vec<Node>,
    /// `heads[i]..heads[i + 1]` is the slice of `edges` leaving node `i`.
    heads: Vec<usize>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

impl MobilityGraph {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node by dense index.
    ///
    /// # Panics
    /// Panics if `idx >= node_count()`; indices are only meaningful when
    /// they came from this graph.
    #[must_use]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Dense index for an external id, if the node exists.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Outgoing edges of node `idx` as one contiguous slice.
    #[must_use]
    pub fn outgoing(&self, idx: usize) -> &[Edge] {
        &self.edges[self.heads[idx]..self.heads[idx + 1]]
    }

    /// Packed edge array; an edge's position in it is its stable edge index.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edge by packed-array index.
    #[must_use]
    pub fn edge(&self, edge_idx: usize) -> &Edge {
        &self.edges[edge_idx]
    }

    /// Offset of node `idx`'s first outgoing edge in the packed array.
    pub(crate) fn head(&self, idx: usize) -> usize {
        self.heads[idx]
    }

    /// The cheapest edge `from -> to` under `params`, if any exists.
    ///
    /// Parallel edges between the same pair are legal; Dijkstra always
    /// relaxes the cheapest one, so path reconstruction must pick the same.
    #[must_use]
    pub fn cheapest_edge(&self, from: usize, to: usize, params: &CostParams) -> Option<&Edge> {
        self.outgoing(from)
            .iter()
            .filter(|edge| edge.to == to)
            .min_by(|a, b| {
                params
                    .edge_cost(a)
                    .partial_cmp(&params.edge_cost(b))
                    .expect("edge costs are finite")
            })
    }

}

/// Builds the immutable graph from parsed records.
///
/// Validates every construction invariant up front: unique node ids, known
/// endpoints, strictly positive traversal times, no self-loops. Any
/// violation aborts the build with a typed error; a partially-built graph
/// is never observable.
pub fn build_graph<N, E>(nodes: N, edges: E) -> Result<MobilityGraph, Error>
where
    N: IntoIterator<Item = Node>,
    E: IntoIterator<Item = EdgeRecord>,
{
    let nodes: Vec<Node> = nodes.into_iter().collect();

    let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        if index.insert(node.id.clone(), idx).is_some() {
            return Err(Error::DuplicateNodeId(node.id.clone()));
        }
    }

    let mut resolved: Vec<Edge> = Vec::new();
    for record in edges {
        let from = *index
            .get(&record.from)
            .ok_or_else(|| Error::UnknownEndpoint(record.from.clone()))?;
        let to = *index
            .get(&record.to)
            .ok_or_else(|| Error::UnknownEndpoint(record.to.clone()))?;

        if from == to {
            return Err(Error::SelfLoop(record.from));
        }
        // Zero or negative times would break Dijkstra's optimality argument.
        if !(record.time_min > 0.0) || !record.time_min.is_finite() {
            return Err(Error::NonPositiveTime {
                from: record.from,
                to: record.to,
                time: record.time_min,
            });
        }

        resolved.push(Edge {
            from,
            to,
            time_min: record.time_min,
            transfer: record.transfer,
            stairs: record.stairs,
            bad_pavement: record.bad_pavement,
            flood_risk: record.flood_risk,
            mode: record.mode,
        });
    }

    // Stable sort groups each source's edges into one contiguous run while
    // preserving input order within a source.
    resolved.sort_by_key(|edge| edge.from);

    let mut heads = vec![0usize; nodes.len() + 1];
    for edge in &resolved {
        heads[edge.from + 1] += 1;
    }
    for i in 0..nodes.len() {
        heads[i + 1] += heads[i];
    }

    Ok(MobilityGraph {
        nodes,
        heads,
        edges: resolved,
        index,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            name: format!("Station {id}"),
            lat: 0.0,
            lon: 0.0,
            kind,
        }
    }

    pub(crate) fn edge(from: &str, to: &str, time_min: f64, mode: Mode) -> EdgeRecord {
        EdgeRecord {
            from: from.to_string(),
            to: to.to_string(),
            time_min,
            transfer: false,
            stairs: false,
            bad_pavement: false,
            flood_risk: false,
            mode,
        }
    }

    #[test]
    fn csr_layout_groups_outgoing_edges() {
        let graph = build_graph(
            vec![
                node("A", NodeKind::Metro),
                node("B", NodeKind::Bus),
                node("C", NodeKind::Poi),
            ],
            vec![
                edge("B", "C", 2.0, Mode::Bus),
                edge("A", "B", 1.0, Mode::Walk),
                edge("A", "C", 4.0, Mode::Walk),
                edge("C", "A", 3.0, Mode::Walk),
            ],
        )
        .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);

        let a = graph.index_of("A").unwrap();
        let out: Vec<usize> = graph.outgoing(a).iter().map(|e| e.to).collect();
        assert_eq!(out, vec![graph.index_of("B").unwrap(), graph.index_of("C").unwrap()]);

        let b = graph.index_of("B").unwrap();
        assert_eq!(graph.outgoing(b).len(), 1);
        assert_eq!(graph.outgoing(b)[0].mode, Mode::Bus);
    }

    #[test]
    fn id_index_round_trip() {
        let graph = build_graph(
            vec![node("X", NodeKind::Entrance), node("Y", NodeKind::Tram)],
            vec![edge("X", "Y", 1.5, Mode::Walk)],
        )
        .unwrap();

        for idx in 0..graph.node_count() {
            assert_eq!(graph.index_of(&graph.node(idx).id), Some(idx));
        }
        assert_eq!(graph.index_of("missing"), None);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let result = build_graph(
            vec![node("A", NodeKind::Bus), node("A", NodeKind::Metro)],
            vec![],
        );
        assert!(matches!(result, Err(Error::DuplicateNodeId(id)) if id == "A"));
    }

    #[test]
    fn dangling_endpoint_is_rejected() {
        let result = build_graph(
            vec![node("A", NodeKind::Bus)],
            vec![edge("A", "GHOST", 1.0, Mode::Walk)],
        );
        assert!(matches!(result, Err(Error::UnknownEndpoint(id)) if id == "GHOST"));
    }

    #[test]
    fn non_positive_time_is_rejected() {
        for bad in [0.0, -3.0, f64::NAN] {
            let result = build_graph(
                vec![node("A", NodeKind::Bus), node("B", NodeKind::Bus)],
                vec![edge("A", "B", bad, Mode::Bus)],
            );
            assert!(matches!(result, Err(Error::NonPositiveTime { .. })));
        }
    }

    #[test]
    fn self_loop_is_rejected() {
        let result = build_graph(
            vec![node("A", NodeKind::Bus)],
            vec![edge("A", "A", 1.0, Mode::Walk)],
        );
        assert!(matches!(result, Err(Error::SelfLoop(id)) if id == "A"));
    }

    #[test]
    fn parse_kind_and_mode() {
        assert_eq!(NodeKind::parse("entrance").unwrap(), NodeKind::Entrance);
        assert!(NodeKind::parse("boat").is_err());
        assert_eq!(Mode::parse("tram").unwrap(), Mode::Tram);
        assert!(Mode::parse("ferry").is_err());
        assert!(Mode::Bus.is_vehicle());
        assert!(!Mode::Walk.is_vehicle());
    }
}
