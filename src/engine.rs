//! Query façade: resolves external ids, applies profile and weather to the
//! cost model, and drives the core engines. One `Engine` owns one
//! immutable graph; all methods take `&self` and the type is `Send + Sync`,
//! so an adapter can share it behind an `Arc` and answer queries from as
//! many threads as it likes.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use wayfarer_core::algo::{k_shortest_guarded, shortest_guarded, Route};

use crate::cache::{CacheKey, RouteCache};
use wayfarer_core::analysis::{rank_fixable_edges, EdgeImprovement};
use wayfarer_core::connectivity::{connectivity_report, structure_report, ConnectivityReport, StructureReport};
use wayfarer_core::cost::{profile_params, CostParams, Profile, ProfileWeights};
use wayfarer_core::graph::{MobilityGraph, Node};
use wayfarer_core::itinerary::{build_itinerary, BarrierNote, Itinerary};
use wayfarer_core::loaders::load_graph;
use wayfarer_core::spatial::NodeLocator;
use wayfarer_core::Error;

/// Default and hard ceiling for the alternatives knob. Historically some
/// callers clamped to 3 and others allowed up to 10; 3 is the default and
/// 10 the most `with_k_max` will accept.
pub const K_MAX: usize = 3;
const K_HARD_LIMIT: usize = 10;

/// Caps for user-facing list endpoints.
const SEARCH_LIMIT: usize = 20;
const ANALYSIS_LIMIT: usize = 20;

/// The best route for one query, endpoints resolved both ways.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    /// External node ids, travel order. Empty when no route exists.
    pub path: Vec<String>,
    /// The same path as dense indices.
    pub indices: Vec<usize>,
    pub cost: f64,
    /// Set when the query deadline expired before the search finished;
    /// the path is empty in that case.
    pub timed_out: bool,
}

impl RouteSummary {
    /// `false` when the endpoints are disconnected (or the query timed out).
    #[must_use]
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// One ranked alternative with its user-facing summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub rank: usize,
    pub path: Vec<String>,
    pub cost: f64,
    pub total_time_min: f64,
    pub transfers: usize,
    pub barrier_notes: Vec<BarrierNote>,
}

/// A profile table entry, for listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileInfo {
    pub name: &'static str,
    pub weights: ProfileWeights,
}

/// A snap result with the node itself resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyNode {
    pub node: Node,
    pub distance_m: f64,
}

/// Thin query layer over one immutable graph.
pub struct Engine {
    graph: MobilityGraph,
    locator: NodeLocator,
    k_max: usize,
    deadline: Option<Duration>,
    cache: Option<RouteCache>,
}

impl Engine {
    #[must_use]
    pub fn new(graph: MobilityGraph) -> Self {
        log::debug!(
            "engine ready: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        let locator = NodeLocator::new(&graph);
        Engine { graph, locator, k_max: K_MAX, deadline: None, cache: None }
    }

    /// Loads both CSV files and wraps the resulting graph.
    pub fn from_csv<P: AsRef<Path>>(nodes_csv: P, edges_csv: P) -> Result<Self, Error> {
        Ok(Self::new(load_graph(nodes_csv, edges_csv)?))
    }

    /// Raises the alternatives ceiling, clamped to `[1, 10]`.
    #[must_use]
    pub fn with_k_max(mut self, k_max: usize) -> Self {
        self.k_max = k_max.clamp(1, K_HARD_LIMIT);
        self
    }

    /// Enforces a wall-clock budget per query; an expired search returns
    /// an empty route flagged `timed_out` instead of blocking the caller.
    #[must_use]
    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(budget);
        self
    }

    /// Caches `route` results for `ttl`, at most `capacity` entries.
    /// Results are a pure function of (graph, query), so a hit is always
    /// as good as a recomputation; the cache only ever buys time.
    #[must_use]
    pub fn with_route_cache(mut self, ttl: Duration, capacity: usize) -> Self {
        self.cache = Some(RouteCache::new(ttl, capacity));
        self
    }

    #[must_use]
    pub fn graph(&self) -> &MobilityGraph {
        &self.graph
    }

    fn resolve(&self, id: &str) -> Result<usize, Error> {
        self.graph
            .index_of(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    fn params(&self, profile: &str, rain: bool) -> Result<CostParams, Error> {
        profile_params(profile, rain)
    }

    fn query_deadline(&self) -> Option<Instant> {
        self.deadline.map(|budget| Instant::now() + budget)
    }

    fn summarise(&self, route: &Route, timed_out: bool) -> RouteSummary {
        RouteSummary {
            path: route
                .path
                .iter()
                .map(|&idx| self.graph.node(idx).id.clone())
                .collect(),
            indices: route.path.clone(),
            cost: route.cost,
            timed_out,
        }
    }

    /// Best route between two node ids under a named profile.
    ///
    /// Unknown ids and profiles are typed errors; a disconnected pair is a
    /// summary with an empty path, not an error.
    pub fn route(
        &self,
        from_id: &str,
        to_id: &str,
        profile: &str,
        rain: bool,
    ) -> Result<RouteSummary, Error> {
        let params = self.params(profile, rain)?;
        let source = self.resolve(from_id)?;
        let target = self.resolve(to_id)?;

        let cache_key = self.cache.as_ref().map(|_| CacheKey {
            from: from_id.to_string(),
            to: to_id.to_string(),
            profile: profile.to_string(),
            rain,
        });
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(hit) = cache.get(key) {
                return Ok(hit);
            }
        }

        let (route, timed_out) =
            shortest_guarded(&self.graph, source, target, &params, self.query_deadline());
        let summary = self.summarise(&route, timed_out);

        // Timed-out results are not answers; never serve them twice.
        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            if !timed_out {
                cache.put(key, summary.clone());
            }
        }
        Ok(summary)
    }

    /// Up to `k` loopless alternatives, `k` clamped to `[1, k_max]`, each
    /// summarised with its nominal time, transfers and barrier notes.
    pub fn alternatives(
        &self,
        from_id: &str,
        to_id: &str,
        profile: &str,
        rain: bool,
        k: usize,
    ) -> Result<Vec<Alternative>, Error> {
        let params = self.params(profile, rain)?;
        let source = self.resolve(from_id)?;
        let target = self.resolve(to_id)?;
        let k = k.clamp(1, self.k_max);

        let (routes, _) = k_shortest_guarded(
            &self.graph,
            source,
            target,
            &params,
            k,
            self.query_deadline(),
        );

        let mut alternatives = Vec::with_capacity(routes.len());
        for (rank, route) in routes.iter().enumerate() {
            let itinerary = build_itinerary(&self.graph, route, &params)?;
            alternatives.push(Alternative {
                rank,
                path: itinerary.path,
                cost: route.cost,
                total_time_min: itinerary.total_time_min,
                transfers: itinerary.transfers,
                barrier_notes: itinerary.barrier_notes,
            });
        }
        Ok(alternatives)
    }

    /// Full step-by-step itinerary for the best route of a query.
    pub fn route_details(
        &self,
        from_id: &str,
        to_id: &str,
        profile: &str,
        rain: bool,
    ) -> Result<Itinerary, Error> {
        let params = self.params(profile, rain)?;
        let source = self.resolve(from_id)?;
        let target = self.resolve(to_id)?;

        let (route, _) =
            shortest_guarded(&self.graph, source, target, &params, self.query_deadline());
        build_itinerary(&self.graph, &route, &params)
    }

    /// Itinerary for a caller-supplied path (e.g. a previously returned
    /// alternative). Every id must resolve and every consecutive pair must
    /// be connected by an edge.
    pub fn details_for_path(
        &self,
        path_ids: &[String],
        profile: &str,
        rain: bool,
    ) -> Result<Itinerary, Error> {
        let params = self.params(profile, rain)?;
        let indices = path_ids
            .iter()
            .map(|id| self.resolve(id))
            .collect::<Result<Vec<usize>, Error>>()?;

        // The builder recomputes the weighted cost from the edges.
        let route = Route { path: indices, cost: 0.0 };
        build_itinerary(&self.graph, &route, &params)
    }

    /// Ranked fixable-edge report, `max_results` clamped to `[1, 20]`.
    pub fn edge_analysis(
        &self,
        profile: &str,
        rain: bool,
        max_results: usize,
    ) -> Result<Vec<EdgeImprovement>, Error> {
        let params = self.params(profile, rain)?;
        Ok(rank_fixable_edges(
            &self.graph,
            &params,
            max_results.clamp(1, ANALYSIS_LIMIT),
        ))
    }

    /// The profile table, for discovery endpoints.
    #[must_use]
    pub fn profiles(&self) -> Vec<ProfileInfo> {
        Profile::ALL
            .iter()
            .map(|&profile| ProfileInfo {
                name: profile.name(),
                weights: profile.weights(),
            })
            .collect()
    }

    /// Every node, in dense-index order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    /// Case-insensitive substring match over ids and names, capped at 20
    /// results, for autocomplete surfaces.
    #[must_use]
    pub fn search_nodes(&self, query: &str) -> Vec<&Node> {
        let needle = query.to_lowercase();
        self.graph
            .nodes()
            .iter()
            .filter(|node| {
                node.id.to_lowercase().contains(&needle)
                    || node.name.to_lowercase().contains(&needle)
            })
            .take(SEARCH_LIMIT)
            .collect()
    }

    /// The graph node closest to a raw coordinate, with its haversine
    /// distance in metres. `None` only on an empty graph.
    #[must_use]
    pub fn nearest_node(&self, lat: f64, lon: f64) -> Option<NearbyNode> {
        self.locator.nearest(lat, lon).map(|snap| NearbyNode {
            node: self.graph.node(snap.node_idx).clone(),
            distance_m: snap.distance_m,
        })
    }

    /// Weak-connectivity report over the whole graph.
    #[must_use]
    pub fn connectivity(&self) -> ConnectivityReport {
        connectivity_report(&self.graph)
    }

    /// Node/edge/barrier/degree statistics.
    #[must_use]
    pub fn structure(&self) -> StructureReport {
        structure_report(&self.graph)
    }
}
