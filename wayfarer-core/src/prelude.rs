//! Convenient re-exports of the types and entry points most callers need.

pub use crate::algo::{k_shortest, k_shortest_guarded, shortest, shortest_guarded, Route};
pub use crate::analysis::{rank_fixable_edges, EdgeImprovement, Priority};
pub use crate::connectivity::{connectivity_report, structure_report, ConnectivityReport, StructureReport};
pub use crate::cost::{profile_params, CostParams, Profile, ProfileWeights, TRANSFER_PENALTY};
pub use crate::graph::{build_graph, Edge, EdgeRecord, MobilityGraph, Mode, Node, NodeKind};
pub use crate::itinerary::{build_itinerary, BarrierKind, BarrierNote, Itinerary, Place, Segment, Step};
pub use crate::loaders::load_graph;
pub use crate::spatial::{NodeLocator, Snap};
pub use crate::Error;
