//! Grid routing: Dijkstra and A* from one source hub to a target hub set.
//!
//! # Pluggability
//!
//! The octilinearizer calls routing via the [`GridRouter`] trait so the
//! search strategy can be swapped without touching the driver.  Both provided
//! implementations return cost-optimal paths; the A* heuristic is admissible
//! by construction, so the two must agree on total cost (asserted in tests).
//!
//! # Determinism
//!
//! Heap entries tie-break on node ID, and edge relaxation follows the CSR
//! order, so equal-cost paths resolve identically across runs.

use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use tm_core::{GridEdgeId, GridNodeId};

use crate::grid::GridGraph;

// ── GridPath ──────────────────────────────────────────────────────────────────

/// The result of a routing query: the grid edges in traversal order, the
/// total cost (sinks and bends included), and the target hub that was hit.
#[derive(Clone, Debug)]
pub struct GridPath {
    pub edges: Vec<GridEdgeId>,
    pub cost: f64,
    pub target: GridNodeId,
}

// ── GridRouter trait ──────────────────────────────────────────────────────────

/// Pluggable shortest-path engine over the grid.
pub trait GridRouter {
    /// Cheapest path from `from` (a hub) to any node of `to`.
    ///
    /// Returns `None` when no target is reachable.
    fn shortest_path(
        &self,
        grid: &GridGraph,
        from: GridNodeId,
        to: &FxHashSet<GridNodeId>,
    ) -> Option<GridPath>;
}

/// Plain Dijkstra.  The reference implementation.
pub struct DijkstraRouter;

impl GridRouter for DijkstraRouter {
    fn shortest_path(
        &self,
        grid: &GridGraph,
        from: GridNodeId,
        to: &FxHashSet<GridNodeId>,
    ) -> Option<GridPath> {
        search(grid, from, to, None)
    }
}

/// A* with the grid-distance heuristic.  Exact, and typically visits a
/// fraction of the nodes Dijkstra touches.
pub struct AStarRouter;

impl GridRouter for AStarRouter {
    fn shortest_path(
        &self,
        grid: &GridGraph,
        from: GridNodeId,
        to: &FxHashSet<GridNodeId>,
    ) -> Option<GridPath> {
        let heur = GridHeur::new(grid, to);
        search(grid, from, to, Some(&heur))
    }
}

// ── Heuristic ─────────────────────────────────────────────────────────────────

/// Admissible A* heuristic over the target set.
///
/// Built from (a) the hull of the target set — target cells bordering a
/// non-target cell — and (b) the cheapest sink cost among all targets.  The
/// grid-heuristic distance lower-bounds any hub-to-hub path cost and the
/// cheapest sink lower-bounds entering the target set, so the sum never
/// overestimates.
struct GridHeur {
    hull: Vec<(i64, i64)>,
    cheapest_sink: f64,
}

impl GridHeur {
    fn new(grid: &GridGraph, to: &FxHashSet<GridNodeId>) -> Self {
        let mut hull = Vec::new();
        let mut cheapest_sink = f64::INFINITY;

        for &t in to {
            let (x, y) = grid.cell_of(t);
            let mut on_hull = false;
            for d in tm_core::Dir::ALL {
                let (dx, dy) = d.offset();
                match grid.hub_at(x + dx, y + dy) {
                    Some(n) if to.contains(&n) => {}
                    _ => on_hull = true,
                }
            }
            if on_hull {
                hull.push((x, y));
            }
            for e in grid.out_edges(t) {
                // Arrival sinks: port → hub.
                let rev = grid.reverse_edge(e);
                let c = grid.edge_cost(rev);
                if c < cheapest_sink {
                    cheapest_sink = c;
                }
            }
        }
        if cheapest_sink.is_infinite() {
            cheapest_sink = 0.0;
        }
        Self { hull, cheapest_sink }
    }

    fn estimate(&self, grid: &GridGraph, n: GridNodeId, to: &FxHashSet<GridNodeId>) -> f64 {
        if to.contains(&grid.hub_of(n)) {
            return 0.0;
        }
        let (x, y) = grid.cell_of(n);
        let mut best = f64::INFINITY;
        for &(hx, hy) in &self.hull {
            let c = grid.heur_cost(x, y, hx, hy);
            if c < best {
                best = c;
            }
        }
        if best.is_infinite() {
            return 0.0;
        }
        best + self.cheapest_sink
    }
}

// ── Search internals ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct HeapEntry {
    est: f64,
    cost: f64,
    node: GridNodeId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed for a min-heap; node ID as deterministic tie-break.
        other
            .est
            .total_cmp(&self.est)
            .then_with(|| other.node.cmp(&self.node))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn search(
    grid: &GridGraph,
    from: GridNodeId,
    to: &FxHashSet<GridNodeId>,
    heur: Option<&GridHeur>,
) -> Option<GridPath> {
    if to.is_empty() {
        return None;
    }
    if to.contains(&from) {
        return Some(GridPath { edges: vec![], cost: 0.0, target: from });
    }

    let n = grid.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev_edge = vec![GridEdgeId::INVALID; n];

    dist[from.index()] = 0.0;
    let h0 = heur.map_or(0.0, |h| h.estimate(grid, from, to));

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    heap.push(HeapEntry { est: h0, cost: 0.0, node: from });

    while let Some(HeapEntry { cost, node, .. }) = heap.pop() {
        if to.contains(&node) {
            return Some(reconstruct(grid, &prev_edge, from, node, cost));
        }
        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for e in grid.out_edges(node) {
            let w = grid.edge_cost(e);
            if !w.is_finite() {
                continue;
            }
            let neighbor = grid.edge_to(e);
            let new_cost = cost + w;
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = e;
                let est = new_cost + heur.map_or(0.0, |h| h.estimate(grid, neighbor, to));
                heap.push(HeapEntry { est, cost: new_cost, node: neighbor });
            }
        }
    }
    None
}

fn reconstruct(
    grid: &GridGraph,
    prev_edge: &[GridEdgeId],
    from: GridNodeId,
    target: GridNodeId,
    cost: f64,
) -> GridPath {
    let mut edges = Vec::new();
    let mut cur = target;
    while cur != from {
        let e = prev_edge[cur.index()];
        debug_assert!(e != GridEdgeId::INVALID);
        edges.push(e);
        cur = grid.edge_from(e);
    }
    edges.reverse();
    GridPath { edges, cost, target }
}
