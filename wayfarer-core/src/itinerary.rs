/*!
Route reconstruction: turns an index path into a user-facing itinerary.

Routing minimises profile-weighted *cost*; the traveller reads *time*.
The itinerary reports both, plus the transfer count, the barriers the
chosen path actually crosses (reported for transparency — barriers are
soft costs and may be traversed when no alternative exists), the modes
used, and a step-by-step breakdown grouped by mode.
*/

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::Serialize;

use crate::algo::Route;
use crate::cost::CostParams;
use crate::graph::{Edge, Mode, MobilityGraph, Node};
use crate::Error;

/// A node reference with everything a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    fn from_node(node: &Node) -> Self {
        Place {
            id: node.id.clone(),
            name: node.name.clone(),
            lat: node.lat,
            lon: node.lon,
        }
    }
}

/// One atomic traversal of the path, with the edge attributes it carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub from: Place,
    pub to: Place,
    pub time_min: f64,
    pub mode: Mode,
    pub transfer: bool,
    pub stairs: bool,
    pub bad_pavement: bool,
    pub flood_risk: bool,
}

/// Barrier category relevant to accessibility profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    Stairs,
    BadPavement,
    FloodRisk,
}

impl BarrierKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stairs => "stairs",
            Self::BadPavement => "bad_pavement",
            Self::FloodRisk => "flood_risk",
        }
    }
}

impl Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A barrier found on a traversed edge, relevant to the active profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarrierNote {
    pub kind: BarrierKind,
    pub from: String,
    pub to: String,
}

impl Display for BarrierNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}->{}", self.kind, self.from, self.to)
    }
}

/// A maximal run of consecutive segments sharing one mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub mode: Mode,
    pub from: Place,
    pub to: Place,
    pub time_min: f64,
    pub segments: Vec<Segment>,
    pub instruction: String,
}

/// A route enriched for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    /// External node ids along the path, in travel order.
    pub path: Vec<String>,
    /// Nominal travel time: the plain sum of segment times.
    pub total_time_min: f64,
    /// Profile-weighted cost, as minimised by the router.
    pub total_cost: f64,
    pub transfers: usize,
    pub barrier_notes: Vec<BarrierNote>,
    /// Modes used, in first-seen order.
    pub modes: Vec<Mode>,
    pub steps: Vec<Step>,
}

impl Itinerary {
    fn empty() -> Self {
        Itinerary {
            path: Vec::new(),
            total_time_min: 0.0,
            total_cost: 0.0,
            transfers: 0,
            barrier_notes: Vec::new(),
            modes: Vec::new(),
            steps: Vec::new(),
        }
    }
}

/// Builds the presentation-level itinerary for `route` under `params`.
///
/// The route may come from the engines or be caller-supplied; a
/// consecutive pair with no connecting edge is an [`Error::UnknownEdge`].
/// Among parallel edges the cheapest under `params` is chosen, matching
/// the edge the router relaxed. The empty route maps to the empty
/// itinerary; a single-node route to a zero-time, zero-step one.
pub fn build_itinerary(
    graph: &MobilityGraph,
    route: &Route,
    params: &CostParams,
) -> Result<Itinerary, Error> {
    if route.is_empty() {
        return Ok(Itinerary::empty());
    }

    let mut segments: Vec<Segment> = Vec::with_capacity(route.path.len().saturating_sub(1));
    let mut total_cost = 0.0;
    for (&from, &to) in route.path.iter().tuple_windows() {
        let edge = graph
            .cheapest_edge(from, to, params)
            .ok_or_else(|| Error::UnknownEdge {
                from: graph.node(from).id.clone(),
                to: graph.node(to).id.clone(),
            })?;
        total_cost += params.edge_cost(edge);
        segments.push(segment(graph, edge));
    }

    Ok(Itinerary {
        path: route.path.iter().map(|&idx| graph.node(idx).id.clone()).collect(),
        total_time_min: segments.iter().map(|s| s.time_min).sum(),
        total_cost,
        transfers: count_transfers(&segments),
        barrier_notes: collect_barriers(&segments, params),
        modes: segments.iter().map(|s| s.mode).unique().collect(),
        steps: group_steps(&segments),
    })
}

fn segment(graph: &MobilityGraph, edge: &Edge) -> Segment {
    Segment {
        from: Place::from_node(graph.node(edge.from)),
        to: Place::from_node(graph.node(edge.to)),
        time_min: edge.time_min,
        mode: edge.mode,
        transfer: edge.transfer,
        stairs: edge.stairs,
        bad_pavement: edge.bad_pavement,
        flood_risk: edge.flood_risk,
    }
}

/// A transfer is counted each time the traveller boards a vehicle coming
/// off a different mode: bus -> metro is one, bus -> walk -> bus is one
/// (counted at the re-boarding), and trailing or standalone walking is
/// free. A walk-only route therefore has zero transfers.
fn count_transfers(segments: &[Segment]) -> usize {
    segments
        .iter()
        .tuple_windows()
        .filter(|(prev, next)| next.mode.is_vehicle() && next.mode != prev.mode)
        .count()
}

/// Barriers present on the path, filtered to the active profile: stairs
/// and broken pavement concern PcD travellers; flooding concerns everyone
/// once rain is on. Duplicates (parallel legs over the same pair) collapse.
fn collect_barriers(segments: &[Segment], params: &CostParams) -> Vec<BarrierNote> {
    let mut notes: Vec<BarrierNote> = Vec::new();
    let mut push = |kind: BarrierKind, seg: &Segment| {
        let note = BarrierNote {
            kind,
            from: seg.from.id.clone(),
            to: seg.to.id.clone(),
        };
        if !notes.contains(&note) {
            notes.push(note);
        }
    };

    for seg in segments {
        if params.pcd_mode {
            if seg.stairs {
                push(BarrierKind::Stairs, seg);
            }
            if seg.bad_pavement {
                push(BarrierKind::BadPavement, seg);
            }
        }
        if params.rain_on && seg.flood_risk {
            push(BarrierKind::FloodRisk, seg);
        }
    }
    notes
}

/// Run-length encoding over the mode attribute.
fn group_steps(segments: &[Segment]) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    let mut run: Vec<Segment> = Vec::new();

    for seg in segments {
        if run.last().is_some_and(|last| last.mode != seg.mode) {
            steps.push(make_step(std::mem::take(&mut run)));
        }
        run.push(seg.clone());
    }
    if !run.is_empty() {
        steps.push(make_step(run));
    }
    steps
}

fn make_step(run: Vec<Segment>) -> Step {
    let mode = run[0].mode;
    let from = run[0].from.clone();
    let to = run[run.len() - 1].to.clone();
    let instruction = if mode.is_vehicle() {
        format!("Take the {} from {} to {}", mode, from.name, to.name)
    } else {
        format!("Walk from {} to {}", from.name, to.name)
    };

    Step {
        mode,
        time_min: run.iter().map(|s| s.time_min).sum(),
        from,
        to,
        segments: run,
        instruction,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::algo::shortest;
    use crate::cost::profile_params;
    use crate::graph::tests::node;
    use crate::graph::{build_graph, EdgeRecord, MobilityGraph, NodeKind};

    fn rec(from: &str, to: &str, time_min: f64, mode: Mode) -> EdgeRecord {
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

    /// Walk, then two bus hops, then walk again.
    fn line_graph() -> MobilityGraph {
        build_graph(
            vec![
                node("A", NodeKind::Poi),
                node("B", NodeKind::Bus),
                node("C", NodeKind::Bus),
                node("D", NodeKind::Bus),
                node("E", NodeKind::Poi),
            ],
            vec![
                rec("A", "B", 3.0, Mode::Walk),
                rec("B", "C", 5.0, Mode::Bus),
                rec("C", "D", 4.0, Mode::Bus),
                rec("D", "E", 2.0, Mode::Walk),
            ],
        )
        .unwrap()
    }

    #[test]
    fn groups_segments_by_mode() {
        let graph = line_graph();
        let params = profile_params("standard", false).unwrap();
        let route = shortest(&graph, 0, 4, &params);
        let itinerary = build_itinerary(&graph, &route, &params).unwrap();

        assert_eq!(itinerary.path, vec!["A", "B", "C", "D", "E"]);
        assert_abs_diff_eq!(itinerary.total_time_min, 14.0);
        assert_eq!(itinerary.modes, vec![Mode::Walk, Mode::Bus]);

        let modes: Vec<Mode> = itinerary.steps.iter().map(|s| s.mode).collect();
        assert_eq!(modes, vec![Mode::Walk, Mode::Bus, Mode::Walk]);
        assert_abs_diff_eq!(itinerary.steps[1].time_min, 9.0);
        assert_eq!(itinerary.steps[1].from.id, "B");
        assert_eq!(itinerary.steps[1].to.id, "D");
        assert!(itinerary.steps[1].instruction.starts_with("Take the bus"));
        assert!(itinerary.steps[2].instruction.starts_with("Walk from"));
    }

    #[test]
    fn transfer_counting_rules() {
        let cases: Vec<(Vec<Mode>, usize)> = vec![
            (vec![Mode::Walk, Mode::Walk], 0),
            (vec![Mode::Bus, Mode::Bus], 0),
            (vec![Mode::Bus, Mode::Walk], 0),
            (vec![Mode::Bus, Mode::Walk, Mode::Bus], 1),
            (vec![Mode::Bus, Mode::Metro], 1),
            (vec![Mode::Walk, Mode::Bus, Mode::Bus], 1),
            (vec![Mode::Bus, Mode::Walk, Mode::Walk, Mode::Metro, Mode::Bus], 2),
        ];

        for (modes, expected) in cases {
            let segments: Vec<Segment> = modes
                .iter()
                .map(|&mode| Segment {
                    from: Place { id: "x".into(), name: "x".into(), lat: 0.0, lon: 0.0 },
                    to: Place { id: "y".into(), name: "y".into(), lat: 0.0, lon: 0.0 },
                    time_min: 1.0,
                    mode,
                    transfer: false,
                    stairs: false,
                    bad_pavement: false,
                    flood_risk: false,
                })
                .collect();
            assert_eq!(count_transfers(&segments), expected, "modes: {modes:?}");
        }
    }

    #[test]
    fn barriers_follow_profile_and_weather() {
        let mut graph_edges = vec![
            rec("A", "B", 3.0, Mode::Walk),
            rec("B", "C", 5.0, Mode::Bus),
        ];
        graph_edges[0].stairs = true;
        graph_edges[1].flood_risk = true;
        let graph = build_graph(
            vec![
                node("A", NodeKind::Poi),
                node("B", NodeKind::Bus),
                node("C", NodeKind::Bus),
            ],
            graph_edges,
        )
        .unwrap();

        let route = Route { path: vec![0, 1, 2], cost: 0.0 };

        let standard_dry = profile_params("standard", false).unwrap();
        let itinerary = build_itinerary(&graph, &route, &standard_dry).unwrap();
        assert!(itinerary.barrier_notes.is_empty());

        let pcd_dry = profile_params("pcd", false).unwrap();
        let itinerary = build_itinerary(&graph, &route, &pcd_dry).unwrap();
        assert_eq!(itinerary.barrier_notes.len(), 1);
        assert_eq!(itinerary.barrier_notes[0].kind, BarrierKind::Stairs);
        assert_eq!(itinerary.barrier_notes[0].to_string(), "stairs@A->B");

        let pcd_wet = profile_params("pcd", true).unwrap();
        let itinerary = build_itinerary(&graph, &route, &pcd_wet).unwrap();
        let kinds: Vec<BarrierKind> =
            itinerary.barrier_notes.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![BarrierKind::Stairs, BarrierKind::FloodRisk]);
    }

    #[test]
    fn empty_and_trivial_routes() {
        let graph = line_graph();
        let params = profile_params("standard", false).unwrap();

        let empty = build_itinerary(&graph, &Route::not_found(), &params).unwrap();
        assert!(empty.path.is_empty());
        assert!(empty.steps.is_empty());
        assert_abs_diff_eq!(empty.total_time_min, 0.0);

        let trivial = Route { path: vec![2], cost: 0.0 };
        let itinerary = build_itinerary(&graph, &trivial, &params).unwrap();
        assert_eq!(itinerary.path, vec!["C"]);
        assert!(itinerary.steps.is_empty());
        assert_eq!(itinerary.transfers, 0);
    }

    #[test]
    fn unknown_edge_in_supplied_path_is_an_error() {
        let graph = line_graph();
        let params = profile_params("standard", false).unwrap();
        let bogus = Route { path: vec![0, 4], cost: 0.0 };

        let result = build_itinerary(&graph, &bogus, &params);
        assert!(matches!(
            result,
            Err(Error::UnknownEdge { ref from, ref to }) if from == "A" && to == "E"
        ));
    }

    #[test]
    fn cost_matches_router_cost() {
        let graph = line_graph();
        let params = profile_params("pcd", true).unwrap();
        let route = shortest(&graph, 0, 4, &params);
        let itinerary = build_itinerary(&graph, &route, &params).unwrap();
        assert_abs_diff_eq!(itinerary.total_cost, route.cost, epsilon = 1e-9);
    }
}
