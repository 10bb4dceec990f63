/*!
CSV ingestion adapter.

Parses the two tabular inputs into plain records and hands them to
[`build_graph`]; the core is format-agnostic and this module is the only
place that knows about files. Expected schemas:

- `nodes.csv`: `id, name, lat, lon, kind` with
  `kind ∈ {metro, bus, rail, tram, entrance, poi}`.
- `edges.csv`: `from, to, time_min, transfer, stairs, bad_pavement,
  flood_risk, mode` with the booleans encoded `0/1` and
  `mode ∈ {walk, bus, metro, rail, tram}`.

Parsing happens exactly once, at startup; queries only ever touch the
in-memory graph.
*/

use std::path::{Path, PathBuf};

use itertools::izip;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;

use crate::graph::{build_graph, EdgeRecord, Mode, MobilityGraph, Node, NodeKind};
use crate::Error;

fn read_csv(file_path: PathBuf) -> Result<DataFrame, Error> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        // Bounded inference protects against a wrong schema guess without
        // forcing a full pre-scan of large files.
        .with_infer_schema_length(Some(10000))
        .try_into_reader_with_file_path(Some(file_path))?
        .finish()?;

    Ok(df)
}

/// Loads both CSV files and builds the immutable graph.
pub fn load_graph<P: AsRef<Path>>(nodes_csv: P, edges_csv: P) -> Result<MobilityGraph, Error> {
    let nodes_df = read_csv(nodes_csv.as_ref().to_path_buf())?;
    let edges_df = read_csv(edges_csv.as_ref().to_path_buf())?;

    let nodes = parse_nodes(&nodes_df)?;
    let edges = parse_edges(&edges_df)?;
    let graph = build_graph(nodes, edges)?;

    log::info!(
        "graph loaded: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

pub(crate) fn parse_nodes(df: &DataFrame) -> Result<Vec<Node>, Error> {
    let ids = df.column("id")?.cast(&DataType::String)?;
    let names = df.column("name")?.cast(&DataType::String)?;
    let lats = df.column("lat")?.cast(&DataType::Float64)?;
    let lons = df.column("lon")?.cast(&DataType::Float64)?;
    let kinds = df.column("kind")?.cast(&DataType::String)?;

    let mut nodes = Vec::with_capacity(df.height());
    for (id, name, lat, lon, kind) in izip!(
        ids.str()?.iter(),
        names.str()?.iter(),
        lats.f64()?.iter(),
        lons.f64()?.iter(),
        kinds.str()?.iter()
    ) {
        let id = id.ok_or_else(|| Error::MissingValue("id".to_string()))?;
        let name = name.ok_or_else(|| Error::MissingValue("name".to_string()))?;
        let lat = lat.ok_or_else(|| Error::MissingValue("lat".to_string()))?;
        let lon = lon.ok_or_else(|| Error::MissingValue("lon".to_string()))?;
        let kind = kind.ok_or_else(|| Error::MissingValue("kind".to_string()))?;

        nodes.push(Node {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lon,
            kind: NodeKind::parse(kind)?,
        });
    }
    Ok(nodes)
}

pub(crate) fn parse_edges(df: &DataFrame) -> Result<Vec<EdgeRecord>, Error> {
    let froms = df.column("from")?.cast(&DataType::String)?;
    let tos = df.column("to")?.cast(&DataType::String)?;
    let times = df.column("time_min")?.cast(&DataType::Float64)?;
    let transfers = df.column("transfer")?.cast(&DataType::Int64)?;
    let stairs = df.column("stairs")?.cast(&DataType::Int64)?;
    let pavements = df.column("bad_pavement")?.cast(&DataType::Int64)?;
    let floods = df.column("flood_risk")?.cast(&DataType::Int64)?;
    let modes = df.column("mode")?.cast(&DataType::String)?;

    let mut edges = Vec::with_capacity(df.height());
    for (from, to, time_min, transfer, stair, pavement, flood, mode) in izip!(
        froms.str()?.iter(),
        tos.str()?.iter(),
        times.f64()?.iter(),
        transfers.i64()?.iter(),
        stairs.i64()?.iter(),
        pavements.i64()?.iter(),
        floods.i64()?.iter(),
        modes.str()?.iter()
    ) {
        let from = from.ok_or_else(|| Error::MissingValue("from".to_string()))?;
        let to = to.ok_or_else(|| Error::MissingValue("to".to_string()))?;
        let time_min = time_min.ok_or_else(|| Error::MissingValue("time_min".to_string()))?;
        let transfer = transfer.ok_or_else(|| Error::MissingValue("transfer".to_string()))?;
        let stair = stair.ok_or_else(|| Error::MissingValue("stairs".to_string()))?;
        let pavement =
            pavement.ok_or_else(|| Error::MissingValue("bad_pavement".to_string()))?;
        let flood = flood.ok_or_else(|| Error::MissingValue("flood_risk".to_string()))?;
        let mode = mode.ok_or_else(|| Error::MissingValue("mode".to_string()))?;

        edges.push(EdgeRecord {
            from: from.to_string(),
            to: to.to_string(),
            time_min,
            transfer: transfer != 0,
            stairs: stair != 0,
            bad_pavement: pavement != 0,
            flood_risk: flood != 0,
            mode: Mode::parse(mode)?,
        });
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_frame() {
        let df = df! {
            "id" => &["A", "B"],
            "name" => &["Central", "Market"],
            "lat" => &[-23.55, -23.56],
            "lon" => &[-46.63, -46.65],
            "kind" => &["metro", "bus"]
        }
        .unwrap();

        let nodes = parse_nodes(&df).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "A");
        assert_eq!(nodes[0].kind, NodeKind::Metro);
        assert_eq!(nodes[1].name, "Market");
    }

    #[test]
    fn parses_edge_frame_with_numeric_booleans() {
        let df = df! {
            "from" => &["A", "B"],
            "to" => &["B", "A"],
            "time_min" => &[3.0, 4.5],
            "transfer" => &[1i64, 0],
            "stairs" => &[0i64, 1],
            "bad_pavement" => &[0i64, 0],
            "flood_risk" => &[1i64, 0],
            "mode" => &["walk", "bus"]
        }
        .unwrap();

        let edges = parse_edges(&df).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].transfer);
        assert!(edges[0].flood_risk);
        assert!(!edges[0].stairs);
        assert!(edges[1].stairs);
        assert_eq!(edges[1].mode, Mode::Bus);
    }

    #[test]
    fn integer_node_ids_are_normalised_to_strings() {
        let df = df! {
            "id" => &[10i64, 20],
            "name" => &["Ten", "Twenty"],
            "lat" => &[0.0, 1.0],
            "lon" => &[0.0, 1.0],
            "kind" => &["poi", "poi"]
        }
        .unwrap();

        let nodes = parse_nodes(&df).unwrap();
        assert_eq!(nodes[0].id, "10");
        assert_eq!(nodes[1].id, "20");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let df = df! {
            "from" => &["A"],
            "to" => &["B"],
            "time_min" => &[3.0],
            "transfer" => &[0i64],
            "stairs" => &[0i64],
            "bad_pavement" => &[0i64],
            "flood_risk" => &[0i64],
            "mode" => &["zeppelin"]
        }
        .unwrap();

        assert!(matches!(parse_edges(&df), Err(Error::InvalidMode(m)) if m == "zeppelin"));
    }
}
