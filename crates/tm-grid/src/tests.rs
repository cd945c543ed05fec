//! Unit tests for tm-grid.

#[cfg(test)]
mod helpers {
    use tm_core::{BBox, Point};

    use crate::cost::Penalties;
    use crate::grid::{GridGraph, GridKind};

    /// 6×6-cell octilinear grid, cell size 100, default penalties.
    pub fn grid() -> GridGraph {
        let mut b = BBox::empty();
        b.extend(Point::new(0.0, 0.0));
        b.extend(Point::new(500.0, 500.0));
        GridGraph::new(b, 100.0, Penalties::default(), GridKind::Octilinear)
    }
}

// ── Structure ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod structure {
    use tm_core::{Dir, Point};

    use super::helpers::grid;
    use crate::grid::{GridEdgeKind, GridKind, INF};

    #[test]
    fn node_arithmetic() {
        let g = grid();
        assert_eq!(g.node_count(), 36 * 9);

        let hub = g.hub_at(2, 3).unwrap();
        assert!(g.is_hub(hub));
        assert_eq!(g.cell_of(hub), (2, 3));
        assert_eq!(g.role_of(hub), None);

        let port = g.port_at(2, 3, Dir::NE).unwrap();
        assert_eq!(g.role_of(port), Some(Dir::NE));
        assert_eq!(g.hub_of(port), hub);
        assert_eq!(g.node_pos(hub), Point::new(200.0, 300.0));
    }

    #[test]
    fn every_edge_has_a_reverse() {
        let g = grid();
        // Sample a hub's full neighborhood rather than the whole arena.
        let hub = g.hub_at(1, 1).unwrap();
        for e in g.out_edges(hub) {
            let rev = g.reverse_edge(e);
            assert_eq!(g.edge_from(rev), g.edge_to(e));
            assert_eq!(g.edge_to(rev), g.edge_from(e));
        }
    }

    #[test]
    fn edge_kinds() {
        let g = grid();
        let hub = g.hub_at(1, 1).unwrap();
        let port_e = g.port_at(1, 1, Dir::E).unwrap();
        let port_n = g.port_at(1, 1, Dir::N).unwrap();
        let nb_port = g.port_at(2, 1, Dir::W).unwrap();

        let sink = g.edge_between(hub, port_e).unwrap();
        assert_eq!(g.edge_kind(sink), GridEdgeKind::Sink);
        assert!(g.is_secondary(sink));

        let bend = g.edge_between(port_e, port_n).unwrap();
        assert_eq!(g.edge_kind(bend), GridEdgeKind::Bend);

        let real = g.edge_between(port_e, nb_port).unwrap();
        assert_eq!(g.edge_kind(real), GridEdgeKind::Real);
        assert!(!g.is_secondary(real));
    }

    #[test]
    fn initial_costs() {
        let g = grid();
        let hub = g.hub_at(1, 1).unwrap();
        let port_e = g.port_at(1, 1, Dir::E).unwrap();
        let port_w = g.port_at(1, 1, Dir::W).unwrap();
        let port_n = g.port_at(1, 1, Dir::N).unwrap();

        // Sinks start closed.
        assert_eq!(g.edge_cost(g.edge_between(hub, port_e).unwrap()), INF);

        // Straight-through (west port → east port) is the cheapest bend.
        let straight = g.edge_cost(g.edge_between(port_w, port_e).unwrap());
        let right_angle = g.edge_cost(g.edge_between(port_w, port_n).unwrap());
        assert_eq!(straight, 0.0);
        assert!(right_angle > straight);

        // Real edges: axis cost 1, diagonal √2.
        let east = g.edge_between(port_e, g.port_at(2, 1, Dir::W).unwrap()).unwrap();
        assert_eq!(g.edge_cost(east), 1.0);
        let ne = g
            .edge_between(
                g.port_at(1, 1, Dir::NE).unwrap(),
                g.port_at(2, 2, Dir::SW).unwrap(),
            )
            .unwrap();
        assert!((g.edge_cost(ne) - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_variant_masks_diagonals() {
        let mut b = tm_core::BBox::empty();
        b.extend(Point::new(0.0, 0.0));
        b.extend(Point::new(300.0, 300.0));
        let g = crate::grid::GridGraph::new(
            b,
            100.0,
            crate::cost::Penalties::default(),
            GridKind::Orthogonal,
        );
        let ne = g
            .edge_between(
                g.port_at(0, 0, Dir::NE).unwrap(),
                g.port_at(1, 1, Dir::SW).unwrap(),
            )
            .unwrap();
        assert_eq!(g.edge_cost(ne), INF);
        let e = g
            .edge_between(
                g.port_at(0, 0, Dir::E).unwrap(),
                g.port_at(1, 0, Dir::W).unwrap(),
            )
            .unwrap();
        assert!(g.edge_cost(e).is_finite());
    }
}

// ── Open/close and cost vectors ───────────────────────────────────────────────

#[cfg(test)]
mod costs {
    use tm_core::Dir;

    use super::helpers::grid;
    use crate::cost::NodeCost;
    use crate::grid::INF;

    #[test]
    fn sink_open_close_round_trip() {
        let mut g = grid();
        let before = g.cost_snapshot();
        let hub = g.hub_at(2, 2).unwrap();

        g.open_sink_fr(hub, 0.0);
        g.open_sink_to(hub, 7.5);
        assert_ne!(g.cost_snapshot(), before);

        g.close_sink_fr(hub);
        g.close_sink_to(hub);
        assert_eq!(g.cost_snapshot(), before);
    }

    #[test]
    fn cost_vector_is_exactly_reversible() {
        let mut g = grid();
        let hub = g.hub_at(2, 2).unwrap();
        g.open_sink_fr(hub, 0.0);
        g.open_sink_to(hub, 3.0);
        let before = g.cost_snapshot();

        let vec = NodeCost([1.0, 0.5, 0.0, 2.0, 0.0, 4.0, 0.25, 8.0]);
        let applied = g.add_cost_vec(hub, vec);
        assert_eq!(applied, vec);
        assert_ne!(g.cost_snapshot(), before);

        g.remove_cost_vec(hub, applied);
        assert_eq!(g.cost_snapshot(), before, "grid must return to byte-identical state");
    }

    #[test]
    fn cost_vector_skips_closed_sinks() {
        let mut g = grid();
        let hub = g.hub_at(2, 2).unwrap();
        let before = g.cost_snapshot();

        // All sinks closed: nothing is applied, removal is a no-op.
        let applied = g.add_cost_vec(hub, NodeCost([5.0; 8]));
        assert!(applied.is_zero());
        g.remove_cost_vec(hub, applied);
        assert_eq!(g.cost_snapshot(), before);
    }

    #[test]
    fn turns_close_and_reopen() {
        let mut g = grid();
        let hub = g.hub_at(1, 1).unwrap();
        let before = g.cost_snapshot();
        let port_w = g.port_at(1, 1, Dir::W).unwrap();
        let port_e = g.port_at(1, 1, Dir::E).unwrap();
        let straight = g.edge_between(port_w, port_e).unwrap();

        g.close_turns(hub);
        assert_eq!(g.edge_cost(straight), INF);
        g.open_turns(hub);
        assert_eq!(g.cost_snapshot(), before);
    }
}

// ── Settling ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod settle {
    use tm_core::{CombEdgeId, CombNodeId};

    use super::helpers::grid;
    use crate::grid::INF;

    #[test]
    fn settle_nd_binds_and_closes() {
        let mut g = grid();
        let hub = g.hub_at(3, 3).unwrap();
        let cn = CombNodeId(7);

        g.settle_nd(hub, cn);
        assert!(g.is_settled(cn));
        assert_eq!(g.settled_hub(cn), Some(hub));
        assert_eq!(g.settled_comb(hub), Some(cn));
        // Settled hubs are filtered from candidate search.
        let cands = g.gr_nd_cands(g.node_pos(hub), 10.0);
        assert!(cands.is_empty());

        // Releasing the node re-opens the hub for through traffic.
        g.unsettle_nd(cn);
        assert!(!g.is_settled(cn));
        assert!(!g.gr_nd_cands(g.node_pos(hub), 10.0).is_empty());
    }

    #[test]
    fn settle_edg_is_symmetric_and_reversible() {
        let mut g = grid();
        let before = g.cost_snapshot();
        let a = g.hub_at(1, 1).unwrap();
        let b = g.hub_at(2, 1).unwrap();
        let ce = CombEdgeId(3);

        g.settle_edg(a, b, ce);
        let (fwd, bwd) = g.real_edges_between_hubs(a, b).unwrap();
        assert_eq!(g.edge_cost(fwd), INF);
        assert_eq!(g.edge_cost(bwd), INF);
        assert_eq!(g.residents(fwd), &[ce]);
        assert_eq!(g.residents(bwd), &[ce]);
        assert!(g.check_resident_symmetry());

        g.unsettle_edg(a, b);
        assert_eq!(g.cost_snapshot(), before);
        assert!(g.residents(fwd).is_empty());
    }

    #[test]
    fn diagonal_settle_closes_crossing_diagonal() {
        let mut g = grid();
        let a = g.hub_at(1, 1).unwrap();
        let b = g.hub_at(2, 2).unwrap();
        g.settle_edg(a, b, CombEdgeId(0));

        // The crossing diagonal (2,1)–(1,2) is closed in both directions.
        let c1 = g.hub_at(2, 1).unwrap();
        let c2 = g.hub_at(1, 2).unwrap();
        let (x_fwd, x_bwd) = g.real_edges_between_hubs(c1, c2).unwrap();
        assert_eq!(g.edge_cost(x_fwd), INF);
        assert_eq!(g.edge_cost(x_bwd), INF);
    }

    #[test]
    fn balance_surcharges_parallel_corridors() {
        let mut g = grid();
        let a = g.hub_at(2, 2).unwrap();
        let b = g.hub_at(3, 2).unwrap();
        // Parallel edges one row up and one row down.
        let up = g.real_edge(2, 3, tm_core::Dir::E).unwrap();
        let down = g.real_edge(2, 1, tm_core::Dir::E).unwrap();
        let up_before = g.edge_cost(up);
        let down_before = g.edge_cost(down);

        g.balance_edge(a, b);
        assert!(g.edge_cost(up) > up_before);
        assert!(g.edge_cost(down) > down_before);
        // Symmetric on the reverse direction.
        assert_eq!(g.edge_cost(up), g.edge_cost(g.reverse_edge(up)));
    }
}

// ── Candidates ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod candidates {
    use tm_core::Point;

    use super::helpers::grid;

    #[test]
    fn nearest_first() {
        let g = grid();
        let mut cands = g.grid_nd_cands(Point::new(210.0, 190.0), 150.0);
        let first = cands.pop().unwrap();
        assert_eq!(g.cell_of(first.node), (2, 2));
        let second = cands.pop().unwrap();
        assert!(second.dist >= first.dist);
    }

    #[test]
    fn radius_is_respected() {
        let g = grid();
        let cands = g.grid_nd_cands(Point::new(200.0, 200.0), 50.0);
        assert_eq!(cands.len(), 1); // only the exact hub
        let none = g.grid_nd_cands(Point::new(-500.0, -500.0), 100.0);
        assert!(none.is_empty());
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use rustc_hash::FxHashSet;
    use tm_core::GridNodeId;

    use super::helpers::grid;
    use crate::grid::GridGraph;
    use crate::router::{AStarRouter, DijkstraRouter, GridRouter};

    fn route_setup(g: &mut GridGraph, from: (i64, i64), to: (i64, i64)) -> (GridNodeId, FxHashSet<GridNodeId>) {
        let src = g.hub_at(from.0, from.1).unwrap();
        let dst = g.hub_at(to.0, to.1).unwrap();
        g.open_sink_fr(src, 0.0);
        g.open_sink_to(dst, 0.0);
        let mut targets = FxHashSet::default();
        targets.insert(dst);
        (src, targets)
    }

    #[test]
    fn straight_east_path() {
        let mut g = grid();
        let (src, targets) = route_setup(&mut g, (1, 2), (4, 2));

        let path = DijkstraRouter.shortest_path(&g, src, &targets).unwrap();
        assert_eq!(path.cost, 3.0); // three axis hops, no bends, free sinks
        let reals: Vec<_> = path.edges.iter().filter(|&&e| !g.is_secondary(e)).collect();
        assert_eq!(reals.len(), 3);
    }

    #[test]
    fn dijkstra_and_a_star_agree_on_cost() {
        let mut g = grid();
        for (from, to) in [((0, 0), (5, 5)), ((1, 4), (4, 0)), ((2, 2), (3, 4))] {
            let (src, targets) = route_setup(&mut g, from, to);
            let d = DijkstraRouter.shortest_path(&g, src, &targets).unwrap();
            let a = AStarRouter.shortest_path(&g, src, &targets).unwrap();
            assert!(
                (d.cost - a.cost).abs() < 1e-9,
                "Dijkstra {} vs A* {} for {:?}→{:?}",
                d.cost,
                a.cost,
                from,
                to
            );
            g.close_sink_fr(src);
            g.close_sink_to(*targets.iter().next().unwrap());
        }
    }

    #[test]
    fn diagonal_is_preferred_over_staircase() {
        let mut g = grid();
        let (src, targets) = route_setup(&mut g, (1, 1), (4, 4));
        let path = AStarRouter.shortest_path(&g, src, &targets).unwrap();
        // Three diagonal hops beat any staircase (which pays bends).
        assert!((path.cost - 3.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn closed_corridor_forces_detour() {
        let mut g = grid();
        let (src, targets) = route_setup(&mut g, (1, 2), (3, 2));
        let free = DijkstraRouter.shortest_path(&g, src, &targets).unwrap();

        // Close the direct corridor (2,2)→(3,2) both ways.
        let a = g.hub_at(2, 2).unwrap();
        let b = g.hub_at(3, 2).unwrap();
        g.settle_edg(a, b, tm_core::CombEdgeId(0));

        let detour = DijkstraRouter.shortest_path(&g, src, &targets).unwrap();
        assert!(detour.cost > free.cost);
    }

    #[test]
    fn unreachable_target_returns_none() {
        let mut g = grid();
        let src = g.hub_at(0, 0).unwrap();
        g.open_sink_fr(src, 0.0);
        // Target sinks never opened: the hub is unreachable.
        let mut targets = FxHashSet::default();
        targets.insert(g.hub_at(5, 5).unwrap());
        assert!(DijkstraRouter.shortest_path(&g, src, &targets).is_none());
    }

    #[test]
    fn search_is_deterministic() {
        let mut g = grid();
        let (src, targets) = route_setup(&mut g, (0, 3), (5, 1));
        let a = AStarRouter.shortest_path(&g, src, &targets).unwrap();
        let b = AStarRouter.shortest_path(&g, src, &targets).unwrap();
        assert_eq!(a.edges, b.edges);
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn heuristic_never_overestimates() {
        let mut g = grid();
        let (src, targets) = route_setup(&mut g, (0, 0), (4, 2));
        let path = DijkstraRouter.shortest_path(&g, src, &targets).unwrap();
        let (sx, sy) = g.cell_of(src);
        let (tx, ty) = g.cell_of(g.hub_at(4, 2).unwrap());
        assert!(g.heur_cost(sx, sy, tx, ty) <= path.cost + 1e-9);
    }
}
