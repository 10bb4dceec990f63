/*!
# wayfarer-core

Routing core for accessible urban mobility. The crate fuses scheduled
transit structure and pedestrian street segments into a single immutable
[`graph::MobilityGraph`], weights every edge through a mobility-profile
cost model, and answers point-to-point queries with Dijkstra and Yen's
loopless k-shortest-paths.

Edges carry barrier attributes (stairs, broken pavement, flood risk,
service transfers). Barriers are *costs*, never hard constraints: a
wheelchair user is steered around a staircase whenever an alternative
exists, but still receives a route when none does. All coefficients are
nonnegative, so Dijkstra's optimality argument carries over unchanged.

The graph is built once, at startup, from already-parsed node and edge
records (see [`loaders`] for the CSV adapter) and is never mutated
afterwards; queries share it read-only across threads with no
synchronisation. Per-query scratch state (distance vector, predecessor
arrays, heap) lives on the query's own stack.

# Example
```no_run
use wayfarer_core::prelude::*;

let graph = load_graph("data/nodes.csv", "data/edges.csv").unwrap();
let params = profile_params("pcd", false).unwrap();

let source = graph.index_of("A").unwrap();
let target = graph.index_of("E").unwrap();

let route = shortest(&graph, source, target, &params);
let itinerary = build_itinerary(&graph, &route, &params).unwrap();

println!("{} min, {} transfers", itinerary.total_time_min, itinerary.transfers);
```
*/

use polars::prelude::PolarsError;
use thiserror::Error;

pub mod algo;
pub mod analysis;
pub mod connectivity;
pub mod cost;
pub mod graph;
pub mod itinerary;
pub mod loaders;
pub mod prelude;
pub mod spatial;

/// Error type for graph construction and queries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("edge endpoint references unknown node id: {0}")]
    UnknownEndpoint(String),
    #[error("non-positive traversal time {time} on edge {from} -> {to}")]
    NonPositiveTime { from: String, to: String, time: f64 },
    #[error("self-loop edge on node id: {0}")]
    SelfLoop(String),
    #[error("node not found for id: {0}")]
    NodeNotFound(String),
    #[error("no edge connects {from} -> {to}")]
    UnknownEdge { from: String, to: String },
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid node kind: {0}")]
    InvalidKind(String),
    #[error("invalid transport mode: {0}")]
    InvalidMode(String),
    #[error("missing value in column: {0}")]
    MissingValue(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
