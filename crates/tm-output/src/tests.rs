//! Unit tests for tm-output.

#[cfg(test)]
mod helpers {
    use tm_core::{LineId, Point, PolyLine, TransitNodeId};
    use tm_transit::{Line, LineOcc, Station, TransitGraph};

    /// A — n — B with two lines, one of them directional towards B.
    pub fn sample_graph() -> TransitGraph {
        let mut g = TransitGraph::new();
        let l1 = g.add_line(Line {
            id: "u1".into(),
            label: "U1".into(),
            color: "dd0000".into(),
        });
        let l2 = g.add_line(Line {
            id: "u2".into(),
            label: "U2".into(),
            color: "0000dd".into(),
        });
        let a = station(&mut g, "alex", "Alexanderplatz", Point::new(0.0, 0.0));
        let n = g.add_node(Point::new(500.0, 0.0));
        let b = station(&mut g, "zoo", "Zoologischer Garten", Point::new(1000.0, 0.0));
        edge(&mut g, a, n, vec![LineOcc::undirected(l1), LineOcc::towards(l2, b)]);
        edge(&mut g, n, b, vec![LineOcc::undirected(l1), LineOcc::towards(l2, b)]);
        g
    }

    pub fn station(g: &mut TransitGraph, id: &str, name: &str, pos: Point) -> TransitNodeId {
        let n = g.add_node(pos);
        g.add_station(
            n,
            Station { id: id.to_string(), name: name.to_string(), pos },
        );
        n
    }

    pub fn edge(
        g: &mut TransitGraph,
        from: TransitNodeId,
        to: TransitNodeId,
        lines: Vec<LineOcc>,
    ) -> tm_core::TransitEdgeId {
        let pl = PolyLine::straight(g.node(from).pos, g.node(to).pos);
        g.add_edge(from, to, pl, lines)
    }

    pub fn line_id(g: &TransitGraph, key: &str) -> LineId {
        (0..g.lines().len() as u32)
            .map(LineId)
            .find(|&l| g.line(l).id == key)
            .unwrap()
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod writer {
    use geojson::Value;
    use rustc_hash::FxHashMap;

    use super::helpers::{line_id, sample_graph};
    use crate::geojson::to_feature_collection;

    #[test]
    fn emits_points_then_linestrings() {
        let g = sample_graph();
        let fc = to_feature_collection(&g, None);
        assert_eq!(fc.features.len(), 5); // 3 nodes + 2 edges

        let points = fc
            .features
            .iter()
            .filter(|f| matches!(f.geometry.as_ref().map(|g| &g.value), Some(Value::Point(_))))
            .count();
        assert_eq!(points, 3);
    }

    #[test]
    fn station_properties_present() {
        let g = sample_graph();
        let fc = to_feature_collection(&g, None);
        let labels: Vec<&str> = fc
            .features
            .iter()
            .filter_map(|f| f.property("station_label").and_then(|v| v.as_str()))
            .collect();
        assert!(labels.contains(&"Alexanderplatz"));
        assert!(labels.contains(&"Zoologischer Garten"));
        // The joint has no station properties.
        let joint_count = fc
            .features
            .iter()
            .filter(|f| {
                matches!(f.geometry.as_ref().map(|g| &g.value), Some(Value::Point(_)))
                    && f.property("station_id").is_none()
            })
            .count();
        assert_eq!(joint_count, 1);
    }

    #[test]
    fn line_descriptors_carry_color_and_direction() {
        let g = sample_graph();
        let fc = to_feature_collection(&g, None);
        let edge_feature = fc
            .features
            .iter()
            .find(|f| f.property("lines").is_some())
            .unwrap();
        let lines = edge_feature.property("lines").unwrap().as_array().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], "u1");
        assert_eq!(lines[0]["color"], "dd0000");
        assert!(lines[0].get("direction").is_none());
        assert!(lines[1].get("direction").is_some());
    }

    #[test]
    fn order_cfg_reorders_lines() {
        let g = sample_graph();
        let mut order = FxHashMap::default();
        let (u1, u2) = (line_id(&g, "u1"), line_id(&g, "u2"));
        for e in g.edge_ids() {
            order.insert(e, vec![u2, u1]);
        }
        let fc = to_feature_collection(&g, Some(&order));
        let edge_feature = fc
            .features
            .iter()
            .find(|f| f.property("lines").is_some())
            .unwrap();
        let lines = edge_feature.property("lines").unwrap().as_array().unwrap();
        assert_eq!(lines[0]["id"], "u2");
        assert_eq!(lines[1]["id"], "u1");
    }

    #[test]
    fn terminating_directions_are_excluded_connections() {
        use tm_core::Point;
        use tm_transit::{Line, LineOcc, TransitGraph};

        let mut g = TransitGraph::new();
        let l = g.add_line(Line { id: "s1".into(), label: "S1".into(), color: "00aa00".into() });
        let a = g.add_node(Point::new(0.0, 0.0));
        let n = g.add_node(Point::new(500.0, 0.0));
        let b = g.add_node(Point::new(1000.0, 0.0));
        // The line runs towards n from both sides: it terminates there.
        super::helpers::edge(&mut g, a, n, vec![LineOcc::towards(l, n)]);
        super::helpers::edge(&mut g, n, b, vec![LineOcc::towards(l, n)]);

        let fc = crate::geojson::to_feature_collection(&g, None);
        let excluded: Vec<_> = fc
            .features
            .iter()
            .filter_map(|f| f.property("excluded_line_conns"))
            .collect();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].as_array().unwrap().len(), 1);
    }
}

// ── Round trip & validation ───────────────────────────────────────────────────

#[cfg(test)]
mod reader {
    use super::helpers::sample_graph;
    use crate::error::OutputError;
    use crate::geojson::{from_feature_collection, read_geojson, to_feature_collection};

    #[test]
    fn round_trip_preserves_structure() {
        let g = sample_graph();
        let fc = to_feature_collection(&g, None);
        let back = from_feature_collection(&fc).unwrap();

        assert_eq!(back.node_count(), g.node_count());
        assert_eq!(back.edge_count(), g.edge_count());
        assert_eq!(back.lines().len(), g.lines().len());

        // Stations survive.
        let stations: usize = back.node_ids().map(|n| back.node(n).stations.len()).sum();
        assert_eq!(stations, 2);

        // Directional occurrences are re-anchored into the new arena.
        let directional = back
            .edge_ids()
            .flat_map(|e| back.edge(e).lines.clone())
            .filter(|occ| occ.direction.is_some())
            .count();
        assert_eq!(directional, 2);
    }

    #[test]
    fn round_trip_through_bytes() {
        let g = sample_graph();
        let mut buf = Vec::new();
        crate::geojson::write_geojson(&mut buf, &g, None, false).unwrap();
        let back = read_geojson(buf.as_slice()).unwrap();
        assert_eq!(back.node_count(), 3);
        assert_eq!(back.edge_count(), 2);
    }

    #[test]
    fn rejects_truncated_coordinates() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.0]},
             "properties":{"id":"0"}}]}"#;
        let err = read_geojson(json.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::Degenerate(_)));
    }

    #[test]
    fn rejects_zero_length_linestring() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},
             "properties":{"id":"0"}},
            {"type":"Feature","geometry":{"type":"LineString",
             "coordinates":[[0.0,0.0],[0.0,0.0]]},
             "properties":{"from":"0","to":"0","lines":[]}}]}"#;
        let err = read_geojson(json.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::Degenerate(_)));
    }

    #[test]
    fn rejects_unknown_node_reference() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},
             "properties":{"id":"0"}},
            {"type":"Feature","geometry":{"type":"LineString",
             "coordinates":[[0.0,0.0],[1.0,1.0]]},
             "properties":{"from":"0","to":"missing","lines":[]}}]}"#;
        let err = read_geojson(json.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::UnknownNode(_)));
    }

    #[test]
    fn missing_edge_endpoints_error() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"LineString",
             "coordinates":[[0.0,0.0],[1.0,1.0]]},
             "properties":{"lines":[]}}]}"#;
        let err = read_geojson(json.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::MissingProperty(_)));
    }
}
