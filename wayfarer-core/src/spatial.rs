/*!
Nearest-node lookup over an R-tree of node locations.

Callers arrive with raw coordinates (a tapped map position, a geocoded
address); the locator snaps them to the closest graph node so a routing
query can start somewhere real. Distances are haversine metres.
*/

use geo::prelude::*;
use geo::Point;
use rstar::{Point as RstarPoint, RTree};
use serde::Serialize;

use crate::graph::MobilityGraph;

/// A graph node's location inside the R-tree. The index is `None` only
/// for transient query points that are never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPoint {
    index: Option<usize>,
    coords: [f64; 2],
}

impl RstarPoint for IndexedPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            index: None,
            coords: [generator(0), generator(1)],
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        self.coords[index]
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        &mut self.coords[index]
    }
}

/// Result of a snap: the node's dense index plus how far away it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snap {
    pub node_idx: usize,
    pub distance_m: f64,
}

/// Spatial index over every node of one graph. Build once next to the
/// graph; lookups are read-only and safe to share across threads.
#[derive(Debug)]
pub struct NodeLocator {
    tree: RTree<IndexedPoint>,
}

impl NodeLocator {
    #[must_use]
    pub fn new(graph: &MobilityGraph) -> Self {
        let points: Vec<IndexedPoint> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| IndexedPoint {
                index: Some(index),
                coords: [node.lon, node.lat],
            })
            .collect();

        NodeLocator { tree: RTree::bulk_load(points) }
    }

    /// The graph node closest to `(lat, lon)`, or `None` on an empty graph.
    #[must_use]
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<Snap> {
        let query = IndexedPoint { index: None, coords: [lon, lat] };
        let nearest = self.tree.nearest_neighbor(&query)?;

        let here = Point::new(lon, lat);
        let there = Point::new(nearest.coords[0], nearest.coords[1]);
        Some(Snap {
            node_idx: nearest.index.expect("stored points carry their index"),
            distance_m: here.haversine_distance(&there),
        })
    }
}
