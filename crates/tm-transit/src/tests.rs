//! Unit tests for tm-transit.

#[cfg(test)]
mod helpers {
    use tm_core::{LineId, Point, PolyLine, TransitNodeId};

    use crate::graph::TransitGraph;
    use crate::line::{Line, LineOcc, Station};

    pub fn line(g: &mut TransitGraph, label: &str) -> LineId {
        g.add_line(Line {
            id: format!("l-{label}"),
            label: label.to_string(),
            color: "ff0000".to_string(),
        })
    }

    pub fn station_node(g: &mut TransitGraph, name: &str, pos: Point) -> TransitNodeId {
        let n = g.add_node(pos);
        g.add_station(
            n,
            Station {
                id: format!("s-{name}"),
                name: name.to_string(),
                pos,
            },
        );
        n
    }

    pub fn straight_edge(
        g: &mut TransitGraph,
        from: TransitNodeId,
        to: TransitNodeId,
        lines: Vec<LineOcc>,
    ) -> tm_core::TransitEdgeId {
        let pl = PolyLine::straight(g.node(from).pos, g.node(to).pos);
        g.add_edge(from, to, pl, lines)
    }
}

// ── Transit graph ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use tm_core::{Point, PolyLine};

    use super::helpers::{line, station_node, straight_edge};
    use crate::graph::TransitGraph;
    use crate::line::LineOcc;

    #[test]
    fn adjacency_bookkeeping() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(100.0, 0.0));
        let e = straight_edge(&mut g, a, b, vec![LineOcc::undirected(l)]);

        assert_eq!(g.degree(a), 1);
        assert_eq!(g.other_node(e, a), b);
        assert_eq!(g.edge_count(), 1);

        g.remove_edge(e);
        assert_eq!(g.degree(a), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn merge_reroutes_and_drops_connector() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = g.add_node(Point::new(0.0, 0.0));
        let b = g.add_node(Point::new(10.0, 0.0));
        let c = g.add_node(Point::new(20.0, 0.0));
        straight_edge(&mut g, a, b, vec![LineOcc::undirected(l)]);
        let bc = straight_edge(&mut g, b, c, vec![LineOcc::towards(l, b)]);

        g.merge_nodes(a, b);

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1); // a–b dropped, b–c kept
        assert_eq!(g.degree(b), 1);
        // Directional occurrence re-anchored if it pointed at the dead node.
        assert_eq!(g.edge(bc).lines[0].direction, Some(b));
    }

    #[test]
    fn bbox_covers_courses() {
        let mut g = TransitGraph::new();
        let a = g.add_node(Point::new(0.0, 0.0));
        let b = g.add_node(Point::new(10.0, 0.0));
        g.add_edge(
            a,
            b,
            PolyLine::from_points(vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 8.0),
                Point::new(10.0, 0.0),
            ]),
            vec![],
        );
        let bb = g.bbox();
        assert_eq!(bb.max.y, 8.0);
    }

    #[test]
    fn rotation_moves_nodes_and_courses() {
        let mut g = TransitGraph::new();
        let a = station_node(&mut g, "A", Point::new(100.0, 0.0));
        g.rotate(Point::new(0.0, 0.0), 90.0);
        let p = g.node(a).pos;
        assert!(p.dist(Point::new(0.0, 100.0)) < 1e-9);
        assert!(g.node(a).stations[0].pos.dist(Point::new(0.0, 100.0)) < 1e-9);
    }
}

// ── Short-edge collapse ───────────────────────────────────────────────────────

#[cfg(test)]
mod collapse {
    use tm_core::Point;

    use super::helpers::{line, station_node, straight_edge};
    use crate::graph::TransitGraph;
    use crate::line::LineOcc;

    /// A —1000— J1 —40— J2 —1000— B, joints in the middle.
    fn joint_chain() -> TransitGraph {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let j1 = g.add_node(Point::new(1000.0, 0.0));
        let j2 = g.add_node(Point::new(1040.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(2040.0, 0.0));
        straight_edge(&mut g, a, j1, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, j1, j2, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, j2, b, vec![LineOcc::undirected(l)]);
        g
    }

    #[test]
    fn short_joint_edge_merges_at_midpoint() {
        let mut g = joint_chain();
        let merges = g.collapse_short_edges(50.0);
        assert_eq!(merges, 1);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        // The surviving joint sits at the midpoint of J1 and J2.
        let joint = g
            .node_ids()
            .find(|&n| g.node(n).stations.is_empty())
            .unwrap();
        assert!(g.node(joint).pos.dist(Point::new(1020.0, 0.0)) < 1e-9);
    }

    #[test]
    fn degree_one_endpoints_are_kept() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = g.add_node(Point::new(0.0, 0.0));
        let b = g.add_node(Point::new(40.0, 0.0));
        straight_edge(&mut g, a, b, vec![LineOcc::undirected(l)]);
        assert_eq!(g.collapse_short_edges(50.0), 0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn station_pairs_are_kept() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(40.0, 0.0));
        let c = station_node(&mut g, "C", Point::new(100.0, 0.0));
        let d = station_node(&mut g, "D", Point::new(-100.0, 0.0));
        straight_edge(&mut g, d, a, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, a, b, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, b, c, vec![LineOcc::undirected(l)]);
        // a–b is short and both endpoints have degree 2, but both are stops.
        assert_eq!(g.collapse_short_edges(50.0), 0);
    }

    #[test]
    fn survivor_is_the_station_side() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let j = g.add_node(Point::new(960.0, 0.0));
        let s = station_node(&mut g, "S", Point::new(1000.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(2000.0, 0.0));
        straight_edge(&mut g, a, j, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, j, s, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, s, b, vec![LineOcc::undirected(l)]);

        assert_eq!(g.collapse_short_edges(50.0), 1);
        // S survived, J did not.
        assert!(g.node_ids().all(|n| n != j));
        assert!(!g.node(s).stations.is_empty());
        assert!(g.node(s).pos.dist(Point::new(980.0, 0.0)) < 1e-9);
    }
}

// ── Combination graph ─────────────────────────────────────────────────────────

#[cfg(test)]
mod comb {
    use tm_core::Point;

    use super::helpers::{line, station_node, straight_edge};
    use crate::comb::CombGraph;
    use crate::graph::TransitGraph;
    use crate::line::LineOcc;

    /// A — J — B with a non-station joint on the straight line.
    fn deg2_chain() -> TransitGraph {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let j = g.add_node(Point::new(500.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(1000.0, 0.0));
        straight_edge(&mut g, a, j, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, j, b, vec![LineOcc::undirected(l)]);
        g
    }

    #[test]
    fn deg2_joint_contracts_to_single_edge() {
        let tg = deg2_chain();
        let cg = CombGraph::build(&tg);

        assert_eq!(cg.node_count(), 2);
        assert_eq!(cg.edge_count(), 1);
        let e = cg.edge_ids().next().unwrap();
        assert_eq!(cg.edge(e).children.len(), 2);
        // The contracted edge spans A and B.
        let endpoints = [
            cg.pos(&tg, cg.edge(e).from),
            cg.pos(&tg, cg.edge(e).to),
        ];
        assert!(endpoints.contains(&Point::new(0.0, 0.0)));
        assert!(endpoints.contains(&Point::new(1000.0, 0.0)));
    }

    #[test]
    fn children_are_sequenced_from_from_to_to() {
        let tg = deg2_chain();
        let cg = CombGraph::build(&tg);
        let e = cg.edge_ids().next().unwrap();
        let edge = cg.edge(e);

        // The first child must touch `from`'s transit node.
        let from_tn = cg.node(edge.from).transit;
        let first = tg.edge(edge.children[0]);
        assert!(first.from == from_tn || first.to == from_tn);
        // The last child must touch `to`'s transit node.
        let to_tn = cg.node(edge.to).transit;
        let last = tg.edge(*edge.children.last().unwrap());
        assert!(last.from == to_tn || last.to == to_tn);
    }

    #[test]
    fn stations_block_contraction() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let a = station_node(&mut g, "A", Point::new(0.0, 0.0));
        let s = station_node(&mut g, "S", Point::new(500.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(1000.0, 0.0));
        straight_edge(&mut g, a, s, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, s, b, vec![LineOcc::undirected(l)]);

        let cg = CombGraph::build(&g);
        assert_eq!(cg.node_count(), 3);
        assert_eq!(cg.edge_count(), 2);
    }

    #[test]
    fn route_numbers_sum_distinct_lines() {
        let mut g = TransitGraph::new();
        let l1 = line(&mut g, "1");
        let l2 = line(&mut g, "2");
        let hub = station_node(&mut g, "H", Point::new(0.0, 0.0));
        let a = station_node(&mut g, "A", Point::new(1000.0, 0.0));
        let b = station_node(&mut g, "B", Point::new(0.0, 1000.0));
        straight_edge(
            &mut g,
            hub,
            a,
            vec![LineOcc::undirected(l1), LineOcc::undirected(l2)],
        );
        straight_edge(&mut g, hub, b, vec![LineOcc::undirected(l1)]);

        let cg = CombGraph::build(&g);
        let h = cg
            .node_ids()
            .find(|&n| cg.pos(&g, n) == Point::new(0.0, 0.0))
            .unwrap();
        assert_eq!(cg.node(h).route_number, 3);
    }

    #[test]
    fn edge_ordering_is_angular() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let c = station_node(&mut g, "C", Point::new(0.0, 0.0));
        let east = station_node(&mut g, "E", Point::new(1000.0, 0.0));
        let north = station_node(&mut g, "N", Point::new(0.0, 1000.0));
        let west = station_node(&mut g, "W", Point::new(-1000.0, 0.0));
        let e_e = straight_edge(&mut g, c, east, vec![LineOcc::undirected(l)]);
        let e_n = straight_edge(&mut g, c, north, vec![LineOcc::undirected(l)]);
        let e_w = straight_edge(&mut g, c, west, vec![LineOcc::undirected(l)]);

        let cg = CombGraph::build(&g);
        let center = cg
            .node_ids()
            .find(|&n| cg.pos(&g, n) == Point::new(0.0, 0.0))
            .unwrap();
        let ordered: Vec<_> = cg.node(center).ordered_edges.iter()
            .map(|&ce| cg.edge(ce).children[0])
            .collect();
        // Angles: east 0, north π/2, west π → ascending.
        assert_eq!(ordered, vec![e_e, e_n, e_w]);
    }

    #[test]
    fn refresh_after_rotation_reorders() {
        let mut g = TransitGraph::new();
        let l = line(&mut g, "1");
        let c = station_node(&mut g, "C", Point::new(0.0, 0.0));
        let east = station_node(&mut g, "E", Point::new(1000.0, 0.0));
        let north = station_node(&mut g, "N", Point::new(0.0, 1000.0));
        straight_edge(&mut g, c, east, vec![LineOcc::undirected(l)]);
        straight_edge(&mut g, c, north, vec![LineOcc::undirected(l)]);

        let mut cg = CombGraph::build(&g);
        let before = cg
            .node_ids()
            .map(|n| cg.node(n).ordered_edges.clone())
            .collect::<Vec<_>>();

        // Rotating by 180° maps east→west (angle π) and north→south (angle
        // -π/2): the sorted angular order of the two edges at C swaps.
        g.rotate(Point::new(0.0, 0.0), 180.0);
        cg.refresh_geometry(&g);
        let center = cg.node_ids().find(|&n| cg.degree(n) == 2).unwrap();
        let after = cg.node(center).ordered_edges.clone();
        assert_eq!(before[center.index()].len(), 2);
        assert_ne!(before[center.index()], after);
    }
}
