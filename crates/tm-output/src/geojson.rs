//! GeoJSON serialization of transit graphs.
//!
//! # Writer contract
//!
//! One `Point` feature per node (properties: `id`, optional `station_id` /
//! `station_label`, optional `excluded_line_conns`) and one `LineString`
//! feature per edge (properties: `from`, `to`, `lines` with id/label/color
//! and optional direction).  Lines are emitted in optimized drawing order
//! when an [`OrderCfg`] is supplied.
//!
//! # Reader
//!
//! The reader implements the same contract in reverse and is the boundary
//! where geometry degeneracies (NaN coordinates, zero-length courses) are
//! rejected — the layout core assumes well-formed input.

use std::io::{Read, Write};

use geojson::{Feature, FeatureCollection, Geometry, Value};
use rustc_hash::FxHashMap;
use serde_json::{json, Map};

use tm_core::{LineId, Point, PolyLine, TransitEdgeId, TransitNodeId};
use tm_order::OrderCfg;
use tm_transit::{Line, LineOcc, Station, TransitGraph};

use crate::error::{OutputError, OutputResult};

// ── Writing ───────────────────────────────────────────────────────────────────

/// Render the graph as a GeoJSON feature collection.
pub fn to_feature_collection(g: &TransitGraph, order: Option<&OrderCfg>) -> FeatureCollection {
    let mut features = Vec::new();

    // First pass: nodes.
    for n in g.node_ids() {
        let node = g.node(n);
        let mut props = Map::new();
        props.insert("id".into(), json!(n.0.to_string()));
        if let Some(station) = node.stations.first() {
            props.insert("station_id".into(), json!(station.id));
            props.insert("station_label".into(), json!(station.name));
        }
        let excluded = excluded_line_conns(g, n);
        if !excluded.is_empty() {
            props.insert("excluded_line_conns".into(), json!(excluded));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![node.pos.x, node.pos.y]))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    // Second pass: edges.
    for e in g.edge_ids() {
        let edge = g.edge(e);
        let coords: Vec<Vec<f64>> = edge
            .polyline
            .points()
            .iter()
            .map(|p| vec![p.x, p.y])
            .collect();

        let mut props = Map::new();
        props.insert("from".into(), json!(edge.from.0.to_string()));
        props.insert("to".into(), json!(edge.to.0.to_string()));

        let line_ids: Vec<LineId> = match order.and_then(|o| o.get(&e)) {
            Some(ordering) => ordering.clone(),
            None => edge.distinct_lines(),
        };
        let lines: Vec<serde_json::Value> = line_ids
            .iter()
            .map(|&l| {
                let line = g.line(l);
                let mut obj = Map::new();
                obj.insert("id".into(), json!(line.id));
                obj.insert("label".into(), json!(line.label));
                obj.insert("color".into(), json!(line.color));
                if let Some(dir) = edge
                    .lines
                    .iter()
                    .find(|occ| occ.line == l)
                    .and_then(|occ| occ.direction)
                {
                    obj.insert("direction".into(), json!(dir.0.to_string()));
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        props.insert("lines".into(), json!(lines));

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coords))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// Line connections that cannot occur through `n`: a line whose direction
/// fields point *at* `n` from both sides terminates there and must not be
/// drawn as continuing.
fn excluded_line_conns(g: &TransitGraph, n: TransitNodeId) -> Vec<serde_json::Value> {
    let adj = &g.node(n).adj;
    let mut out = Vec::new();
    for (i, &e) in adj.iter().enumerate() {
        for &f in &adj[i + 1..] {
            for occ_e in &g.edge(e).lines {
                let Some(occ_f) = g.edge(f).lines.iter().find(|o| o.line == occ_e.line) else {
                    continue;
                };
                if occ_e.direction == Some(n) && occ_f.direction == Some(n) {
                    out.push(json!({
                        "route": g.line(occ_e.line).id,
                        "edge1_node": g.other_node(e, n).0.to_string(),
                        "edge2_node": g.other_node(f, n).0.to_string(),
                    }));
                }
            }
        }
    }
    out
}

/// Serialize the graph to a writer, optionally pretty-printed.
pub fn write_geojson<W: Write>(
    w: W,
    g: &TransitGraph,
    order: Option<&OrderCfg>,
    pretty: bool,
) -> OutputResult<()> {
    let fc = to_feature_collection(g, order);
    if pretty {
        serde_json::to_writer_pretty(w, &fc)?;
    } else {
        serde_json::to_writer(w, &fc)?;
    }
    Ok(())
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Parse a feature collection back into a transit graph.
pub fn from_feature_collection(fc: &FeatureCollection) -> OutputResult<TransitGraph> {
    let mut g = TransitGraph::new();
    let mut nodes_by_key: FxHashMap<String, TransitNodeId> = FxHashMap::default();
    let mut lines_by_key: FxHashMap<String, LineId> = FxHashMap::default();

    // First pass: nodes.
    for feature in &fc.features {
        let Some(Geometry { value: Value::Point(coords), .. }) = &feature.geometry else {
            continue;
        };
        let pos = point_from_coords(coords)?;
        let key = string_prop(feature, "id")?;
        let n = g.add_node(pos);
        if let Some(station_id) = feature.property("station_id").and_then(|v| v.as_str()) {
            let name = feature
                .property("station_label")
                .and_then(|v| v.as_str())
                .unwrap_or(station_id);
            g.add_station(
                n,
                Station { id: station_id.to_string(), name: name.to_string(), pos },
            );
        }
        nodes_by_key.insert(key, n);
    }

    // Second pass: edges (directions resolved afterwards, once every node
    // key is known).
    let mut pending_dirs: Vec<(TransitEdgeId, usize, String)> = Vec::new();
    for feature in &fc.features {
        let Some(Geometry { value: Value::LineString(coords), .. }) = &feature.geometry else {
            continue;
        };
        let polyline = polyline_from_coords(coords)?;
        let from_key = string_prop(feature, "from")?;
        let to_key = string_prop(feature, "to")?;
        let from = *nodes_by_key
            .get(&from_key)
            .ok_or(OutputError::UnknownNode(from_key))?;
        let to = *nodes_by_key
            .get(&to_key)
            .ok_or(OutputError::UnknownNode(to_key))?;

        let mut occs = Vec::new();
        let mut dirs = Vec::new();
        if let Some(lines) = feature.property("lines").and_then(|v| v.as_array()) {
            for entry in lines {
                let id = entry
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| OutputError::MissingProperty("lines[].id".into()))?;
                let label = entry.get("label").and_then(|v| v.as_str()).unwrap_or(id);
                let color = entry.get("color").and_then(|v| v.as_str()).unwrap_or("000000");
                let line = *lines_by_key.entry(id.to_string()).or_insert_with(|| {
                    g.add_line(Line {
                        id: id.to_string(),
                        label: label.to_string(),
                        color: color.to_string(),
                    })
                });
                dirs.push(entry.get("direction").and_then(|v| v.as_str()).map(String::from));
                occs.push(LineOcc::undirected(line));
            }
        }

        let e = g.add_edge(from, to, polyline, occs);
        for (i, dir) in dirs.into_iter().enumerate() {
            if let Some(key) = dir {
                pending_dirs.push((e, i, key));
            }
        }
    }

    for (e, i, key) in pending_dirs {
        let node = *nodes_by_key.get(&key).ok_or(OutputError::UnknownNode(key))?;
        g.edge_mut(e).lines[i].direction = Some(node);
    }

    log::debug!(
        "read transit graph: {} nodes, {} edges, {} lines",
        g.node_count(),
        g.edge_count(),
        g.lines().len()
    );
    Ok(g)
}

/// Parse GeoJSON from a reader.
pub fn read_geojson<R: Read>(r: R) -> OutputResult<TransitGraph> {
    let fc: FeatureCollection = serde_json::from_reader(r)?;
    from_feature_collection(&fc)
}

// ── Geometry validation ───────────────────────────────────────────────────────

fn point_from_coords(coords: &[f64]) -> OutputResult<Point> {
    if coords.len() < 2 {
        return Err(OutputError::Degenerate("point with fewer than 2 coordinates".into()));
    }
    let p = Point::new(coords[0], coords[1]);
    if !p.is_finite() {
        return Err(OutputError::Degenerate(format!("non-finite coordinate {p}")));
    }
    Ok(p)
}

fn polyline_from_coords(coords: &[Vec<f64>]) -> OutputResult<PolyLine> {
    if coords.len() < 2 {
        return Err(OutputError::Degenerate("line string with fewer than 2 points".into()));
    }
    let mut pl = PolyLine::new();
    for c in coords {
        pl.push(point_from_coords(c)?);
    }
    if pl.len() == 0.0 {
        return Err(OutputError::Degenerate("zero-length line string".into()));
    }
    Ok(pl)
}

fn string_prop(feature: &Feature, key: &str) -> OutputResult<String> {
    feature
        .property(key)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| OutputError::MissingProperty(key.into()))
}
