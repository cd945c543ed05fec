//! The octilinear grid graph.
//!
//! # Data layout
//!
//! The grid covers a bounding box with cells of a fixed size.  Cell `(x, y)`
//! owns nine nodes: one *hub* at the lattice point and eight *ports*, one per
//! octilinear direction.  Node IDs are computed, not stored:
//!
//! ```text
//! cell  = y * w + x
//! hub   = cell * 9
//! port  = cell * 9 + 1 + dir
//! ```
//!
//! Edges are directed and live in **Compressed Sparse Row (CSR)** arrays
//! built once at construction; only their costs mutate afterwards.  Given a
//! node `n`, its outgoing edges occupy
//! `edge_to[node_out_start[n] .. node_out_start[n+1]]`.  Three edge kinds:
//!
//! - **sink**: hub ↔ port, gated (∞ when closed) — source/target connector.
//! - **bend**: port → port of the same cell, carries the turning penalty.
//! - **real**: port → opposite port of the neighboring cell, carries the
//!   geometric traversal cost (diagonals ×√2).
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over hub lattice points answers the
//! nearest-candidate queries of the octilinearizer.

use std::collections::BinaryHeap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use tm_core::{BBox, CombEdgeId, CombNodeId, Dir, GridEdgeId, GridNodeId, Point, Polygon};

use crate::cost::Penalties;

pub const INF: f64 = f64::INFINITY;

/// Nodes per grid cell: one hub plus eight ports.
const CELL_NODES: usize = 1 + Dir::COUNT;

// ── Grid variants ─────────────────────────────────────────────────────────────

/// Base-graph variant: which of the eight directions are usable.
///
/// Variants share the full nine-node cell layout; a masked direction simply
/// keeps all its edges at ∞.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GridKind {
    /// All eight directions (the octilinear default).
    Octilinear,
    /// Horizontal and vertical directions only.
    Orthogonal,
}

impl GridKind {
    #[inline]
    pub fn allows(self, d: Dir) -> bool {
        match self {
            GridKind::Octilinear => true,
            GridKind::Orthogonal => !d.is_diagonal(),
        }
    }
}

// ── Edge kinds ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GridEdgeKind {
    Sink,
    Bend,
    Real,
}

// ── Candidates ────────────────────────────────────────────────────────────────

/// A candidate hub for placing a combination node, ordered by ascending
/// distance (ties broken by node ID for determinism).
#[derive(Copy, Clone, Debug)]
pub struct Candidate {
    pub dist: f64,
    pub node: GridNodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}
impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the nearest on top.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct HubEntry {
    point: [f64; 2],
    hub: GridNodeId,
}

impl RTreeObject for HubEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for HubEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── GridGraph ─────────────────────────────────────────────────────────────────

/// Octilinear grid graph with mutable edge costs.
///
/// Built once per layout attempt; fully mutable during routing; dropped after
/// the polylines are copied back.
pub struct GridGraph {
    cell_size: f64,
    pens: Penalties,
    kind: GridKind,
    /// Lattice origin (hub of cell (0, 0)).
    origin: Point,
    w: i64,
    h: i64,

    // CSR edge adjacency.
    node_out_start: Vec<u32>,
    edge_from: Vec<GridNodeId>,
    edge_to: Vec<GridNodeId>,
    /// Current cost per directed edge.  ∞ = unusable.
    edge_cost: Vec<f64>,
    /// Cost at construction time; settle/unsettle restore from this.
    edge_base: Vec<f64>,

    settled_of: FxHashMap<CombNodeId, GridNodeId>,
    settled_at: FxHashMap<GridNodeId, CombNodeId>,
    residents: FxHashMap<GridEdgeId, Vec<CombEdgeId>>,

    rtree: RTree<HubEntry>,
    /// Cheapest possible real-edge hop; the admissible per-hop heuristic.
    heur_hop_cost: f64,
}

impl GridGraph {
    /// Build the grid covering `bbox` with the given cell size.
    ///
    /// The lattice anchors at `bbox.min`, so input points lying on grid
    /// multiples land exactly on hubs.
    pub fn new(bbox: BBox, cell_size: f64, pens: Penalties, kind: GridKind) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        let w = (bbox.width() / cell_size).floor() as i64 + 1;
        let h = (bbox.height() / cell_size).floor() as i64 + 1;

        let mut g = GridGraph {
            cell_size,
            pens,
            kind,
            origin: bbox.min,
            w,
            h,
            node_out_start: Vec::new(),
            edge_from: Vec::new(),
            edge_to: Vec::new(),
            edge_cost: Vec::new(),
            edge_base: Vec::new(),
            settled_of: FxHashMap::default(),
            settled_at: FxHashMap::default(),
            residents: FxHashMap::default(),
            rtree: RTree::new(),
            heur_hop_cost: 0.0,
        };
        g.build_edges();
        g.build_rtree();
        g.heur_hop_cost = Dir::ALL
            .iter()
            .filter(|d| kind.allows(**d))
            .map(|&d| g.pens.real_cost(d))
            .fold(INF, f64::min);
        g
    }

    fn build_edges(&mut self) {
        let node_count = (self.w * self.h) as usize * CELL_NODES;
        self.node_out_start = Vec::with_capacity(node_count + 1);
        self.node_out_start.push(0);

        for n in 0..node_count {
            let n = GridNodeId(n as u32);
            let (x, y) = self.cell_of(n);
            match self.role_of(n) {
                // Hub: sinks out to each port.
                None => {
                    for d in Dir::ALL {
                        self.push_edge(n, self.port_unchecked(x, y, d), INF);
                    }
                }
                // Port: sink back to the hub, bends to sibling ports, and the
                // real edge to the opposite neighbor port if it exists.
                Some(d) => {
                    self.push_edge(n, self.hub_unchecked(x, y), INF);
                    for j in Dir::ALL {
                        if j == d {
                            continue;
                        }
                        let cost = if self.kind.allows(d) && self.kind.allows(j) {
                            self.pens.bend_cost(4 - d.turn_to(j))
                        } else {
                            INF
                        };
                        self.push_edge(n, self.port_unchecked(x, y, j), cost);
                    }
                    let (dx, dy) = d.offset();
                    let (nx, ny) = (x + dx, y + dy);
                    if self.in_bounds(nx, ny) {
                        let cost = if self.kind.allows(d) {
                            self.pens.real_cost(d)
                        } else {
                            INF
                        };
                        self.push_edge(n, self.port_unchecked(nx, ny, d.opposite()), cost);
                    }
                }
            }
            self.node_out_start.push(self.edge_to.len() as u32);
        }
        self.edge_base = self.edge_cost.clone();
    }

    fn push_edge(&mut self, from: GridNodeId, to: GridNodeId, cost: f64) {
        self.edge_from.push(from);
        self.edge_to.push(to);
        self.edge_cost.push(cost);
    }

    fn build_rtree(&mut self) {
        let mut entries = Vec::with_capacity((self.w * self.h) as usize);
        for y in 0..self.h {
            for x in 0..self.w {
                let hub = self.hub_unchecked(x, y);
                let p = self.node_pos(hub);
                entries.push(HubEntry { point: [p.x, p.y], hub });
            }
        }
        self.rtree = RTree::bulk_load(entries);
    }

    // ── Dimensions & node arithmetic ──────────────────────────────────────

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn pens(&self) -> &Penalties {
        &self.pens
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        (self.w * self.h) as usize * CELL_NODES
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    #[inline]
    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.w && y >= 0 && y < self.h
    }

    #[inline]
    fn hub_unchecked(&self, x: i64, y: i64) -> GridNodeId {
        GridNodeId(((y * self.w + x) as usize * CELL_NODES) as u32)
    }

    #[inline]
    fn port_unchecked(&self, x: i64, y: i64, d: Dir) -> GridNodeId {
        GridNodeId(((y * self.w + x) as usize * CELL_NODES + 1 + d.index()) as u32)
    }

    pub fn hub_at(&self, x: i64, y: i64) -> Option<GridNodeId> {
        self.in_bounds(x, y).then(|| self.hub_unchecked(x, y))
    }

    pub fn port_at(&self, x: i64, y: i64, d: Dir) -> Option<GridNodeId> {
        self.in_bounds(x, y).then(|| self.port_unchecked(x, y, d))
    }

    /// Cell coordinates of the node's cell.
    #[inline]
    pub fn cell_of(&self, n: GridNodeId) -> (i64, i64) {
        let cell = (n.index() / CELL_NODES) as i64;
        (cell % self.w, cell / self.w)
    }

    /// `None` for a hub, `Some(dir)` for a port.
    #[inline]
    pub fn role_of(&self, n: GridNodeId) -> Option<Dir> {
        match n.index() % CELL_NODES {
            0 => None,
            i => Some(Dir::from_index(i - 1)),
        }
    }

    #[inline]
    pub fn is_hub(&self, n: GridNodeId) -> bool {
        n.index() % CELL_NODES == 0
    }

    /// The hub of the node's cell (identity for hubs).
    #[inline]
    pub fn hub_of(&self, n: GridNodeId) -> GridNodeId {
        GridNodeId((n.index() - n.index() % CELL_NODES) as u32)
    }

    /// Geographic position of the node's cell (hub lattice point).
    pub fn node_pos(&self, n: GridNodeId) -> Point {
        let (x, y) = self.cell_of(n);
        Point::new(
            self.origin.x + x as f64 * self.cell_size,
            self.origin.y + y as f64 * self.cell_size,
        )
    }

    // ── Edge access ───────────────────────────────────────────────────────

    #[inline]
    pub fn out_edges(&self, n: GridNodeId) -> impl Iterator<Item = GridEdgeId> {
        let start = self.node_out_start[n.index()] as usize;
        let end = self.node_out_start[n.index() + 1] as usize;
        (start..end).map(|i| GridEdgeId(i as u32))
    }

    #[inline]
    pub fn edge_from(&self, e: GridEdgeId) -> GridNodeId {
        self.edge_from[e.index()]
    }

    #[inline]
    pub fn edge_to(&self, e: GridEdgeId) -> GridNodeId {
        self.edge_to[e.index()]
    }

    #[inline]
    pub fn edge_cost(&self, e: GridEdgeId) -> f64 {
        self.edge_cost[e.index()]
    }

    /// The directed edge `a → b`, if the two nodes are connected.
    pub fn edge_between(&self, a: GridNodeId, b: GridNodeId) -> Option<GridEdgeId> {
        self.out_edges(a).find(|&e| self.edge_to[e.index()] == b)
    }

    /// The reverse of `e`.  Every grid edge has one.
    pub fn reverse_edge(&self, e: GridEdgeId) -> GridEdgeId {
        self.edge_between(self.edge_to[e.index()], self.edge_from[e.index()])
            .expect("grid edge without a reverse")
    }

    pub fn edge_kind(&self, e: GridEdgeId) -> GridEdgeKind {
        let from = self.edge_from[e.index()];
        let to = self.edge_to[e.index()];
        if self.is_hub(from) || self.is_hub(to) {
            GridEdgeKind::Sink
        } else if self.hub_of(from) == self.hub_of(to) {
            GridEdgeKind::Bend
        } else {
            GridEdgeKind::Real
        }
    }

    /// Secondary edges (sinks and bends) are filtered from polyline
    /// rendering but still count towards path cost.
    #[inline]
    pub fn is_secondary(&self, e: GridEdgeId) -> bool {
        self.edge_kind(e) != GridEdgeKind::Real
    }

    /// The directed real edge leaving cell `(x, y)` towards `d`.
    pub fn real_edge(&self, x: i64, y: i64, d: Dir) -> Option<GridEdgeId> {
        let (dx, dy) = d.offset();
        if !self.in_bounds(x, y) || !self.in_bounds(x + dx, y + dy) {
            return None;
        }
        let from = self.port_unchecked(x, y, d);
        let to = self.port_unchecked(x + dx, y + dy, d.opposite());
        self.edge_between(from, to)
    }

    /// Both directed real edges between two adjacent hubs.
    pub fn real_edges_between_hubs(
        &self,
        a: GridNodeId,
        b: GridNodeId,
    ) -> Option<(GridEdgeId, GridEdgeId)> {
        let (ax, ay) = self.cell_of(a);
        let (bx, by) = self.cell_of(b);
        let (dx, dy) = (bx - ax, by - ay);
        if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            return None;
        }
        let d = Dir::ALL.into_iter().find(|d| d.offset() == (dx, dy))?;
        let fwd = self.real_edge(ax, ay, d)?;
        let bwd = self.real_edge(bx, by, d.opposite())?;
        Some((fwd, bwd))
    }

    // ── Open / close protocol ─────────────────────────────────────────────

    /// Open the departure sinks (hub → port) of `hub` at `cost`.
    pub fn open_sink_fr(&mut self, hub: GridNodeId, cost: f64) {
        debug_assert!(self.is_hub(hub));
        let edges: Vec<GridEdgeId> = self.out_edges(hub).collect();
        for e in edges {
            let d = self.role_of(self.edge_to[e.index()]).expect("sink to port");
            if self.kind.allows(d) {
                self.edge_cost[e.index()] = cost;
            }
        }
    }

    pub fn close_sink_fr(&mut self, hub: GridNodeId) {
        debug_assert!(self.is_hub(hub));
        let edges: Vec<GridEdgeId> = self.out_edges(hub).collect();
        for e in edges {
            self.edge_cost[e.index()] = INF;
        }
    }

    /// Open the arrival sinks (port → hub) of `hub` at `cost`.
    pub fn open_sink_to(&mut self, hub: GridNodeId, cost: f64) {
        debug_assert!(self.is_hub(hub));
        let (x, y) = self.cell_of(hub);
        for d in Dir::ALL {
            if !self.kind.allows(d) {
                continue;
            }
            let port = self.port_unchecked(x, y, d);
            if let Some(e) = self.edge_between(port, hub) {
                self.edge_cost[e.index()] = cost;
            }
        }
    }

    pub fn close_sink_to(&mut self, hub: GridNodeId) {
        debug_assert!(self.is_hub(hub));
        let (x, y) = self.cell_of(hub);
        for d in Dir::ALL {
            let port = self.port_unchecked(x, y, d);
            if let Some(e) = self.edge_between(port, hub) {
                self.edge_cost[e.index()] = INF;
            }
        }
    }

    /// Re-enable turning through `hub`: bend edges back to their base cost.
    pub fn open_turns(&mut self, hub: GridNodeId) {
        self.for_each_bend(hub, |g, e| g.edge_cost[e.index()] = g.edge_base[e.index()]);
    }

    /// Forbid turning through `hub`: all its bend edges go to ∞.
    pub fn close_turns(&mut self, hub: GridNodeId) {
        self.for_each_bend(hub, |g, e| g.edge_cost[e.index()] = INF);
    }

    fn for_each_bend(&mut self, hub: GridNodeId, f: impl Fn(&mut Self, GridEdgeId)) {
        debug_assert!(self.is_hub(hub));
        let (x, y) = self.cell_of(hub);
        for d in Dir::ALL {
            let port = self.port_unchecked(x, y, d);
            let edges: Vec<GridEdgeId> = self
                .out_edges(port)
                .filter(|&e| self.edge_kind(e) == GridEdgeKind::Bend)
                .collect();
            for e in edges {
                f(self, e);
            }
        }
    }

    // ── Residency ─────────────────────────────────────────────────────────

    /// Record `ce` as resident on `e` and its reverse (symmetric invariant).
    pub fn add_resident(&mut self, e: GridEdgeId, ce: CombEdgeId) {
        let rev = self.reverse_edge(e);
        self.residents.entry(e).or_default().push(ce);
        self.residents.entry(rev).or_default().push(ce);
    }

    pub fn residents(&self, e: GridEdgeId) -> &[CombEdgeId] {
        self.residents.get(&e).map_or(&[], |v| v.as_slice())
    }

    // ── Settling ──────────────────────────────────────────────────────────

    pub fn is_settled(&self, cn: CombNodeId) -> bool {
        self.settled_of.contains_key(&cn)
    }

    pub fn settled_hub(&self, cn: CombNodeId) -> Option<GridNodeId> {
        self.settled_of.get(&cn).copied()
    }

    pub fn settled_comb(&self, hub: GridNodeId) -> Option<CombNodeId> {
        self.settled_at.get(&hub).copied()
    }

    /// Bind `hub` to `cn` and close it to further routing: sinks and turns
    /// all go to ∞.
    pub fn settle_nd(&mut self, hub: GridNodeId, cn: CombNodeId) {
        debug_assert!(self.is_hub(hub));
        debug_assert!(
            !self.settled_at.contains_key(&hub) || self.settled_at[&hub] == cn,
            "hub settled twice with different combination nodes"
        );
        self.settled_of.insert(cn, hub);
        self.settled_at.insert(hub, cn);
        self.close_sink_fr(hub);
        self.close_sink_to(hub);
        self.close_turns(hub);
    }

    /// Release a settled node; its hub re-opens for through traffic (sinks
    /// stay closed, as for any unused hub).
    pub fn unsettle_nd(&mut self, cn: CombNodeId) {
        if let Some(hub) = self.settled_of.remove(&cn) {
            self.settled_at.remove(&hub);
            self.open_turns(hub);
        }
    }

    /// Mark the real edge pair between two adjacent hubs as used by `ce`:
    /// costs go to ∞ in both directions, `ce` joins both resident lists, and
    /// for a diagonal edge the crossing diagonal of the same cell quad is
    /// closed as well.
    pub fn settle_edg(&mut self, a: GridNodeId, b: GridNodeId, ce: CombEdgeId) {
        let Some((fwd, bwd)) = self.real_edges_between_hubs(a, b) else {
            debug_assert!(false, "settle_edg on non-adjacent hubs");
            return;
        };
        self.edge_cost[fwd.index()] = INF;
        self.edge_cost[bwd.index()] = INF;
        self.residents.entry(fwd).or_default().push(ce);
        self.residents.entry(bwd).or_default().push(ce);

        if let Some((c_fwd, c_bwd)) = self.crossing_diagonal(a, b) {
            self.edge_cost[c_fwd.index()] = INF;
            self.edge_cost[c_bwd.index()] = INF;
        }
    }

    /// Undo [`settle_edg`]: restore base costs and pop the resident.  The
    /// crossing diagonal is restored only if it has no residents itself.
    pub fn unsettle_edg(&mut self, a: GridNodeId, b: GridNodeId) {
        let Some((fwd, bwd)) = self.real_edges_between_hubs(a, b) else {
            return;
        };
        self.edge_cost[fwd.index()] = self.edge_base[fwd.index()];
        self.edge_cost[bwd.index()] = self.edge_base[bwd.index()];
        for e in [fwd, bwd] {
            if let Some(v) = self.residents.get_mut(&e) {
                v.pop();
            }
        }
        if let Some((c_fwd, c_bwd)) = self.crossing_diagonal(a, b) {
            if self.residents(c_fwd).is_empty() && self.residents(c_bwd).is_empty() {
                self.edge_cost[c_fwd.index()] = self.edge_base[c_fwd.index()];
                self.edge_cost[c_bwd.index()] = self.edge_base[c_bwd.index()];
            }
        }
    }

    /// For a diagonal hub pair, the two directed real edges of the crossing
    /// diagonal of the same cell quad.
    fn crossing_diagonal(
        &self,
        a: GridNodeId,
        b: GridNodeId,
    ) -> Option<(GridEdgeId, GridEdgeId)> {
        let (ax, ay) = self.cell_of(a);
        let (bx, by) = self.cell_of(b);
        let (dx, dy) = (bx - ax, by - ay);
        if dx.abs() != 1 || dy.abs() != 1 {
            return None;
        }
        let c1 = self.hub_at(ax + dx, ay)?;
        let c2 = self.hub_at(ax, ay + dy)?;
        self.real_edges_between_hubs(c1, c2)
    }

    /// After routing an edge over `a → b`, surcharge the real edges parallel
    /// to it in the two perpendicular neighbor rows so that future routings
    /// spread out instead of hugging the occupied corridor.
    pub fn balance_edge(&mut self, a: GridNodeId, b: GridNodeId) {
        let (ax, ay) = self.cell_of(a);
        let (bx, by) = self.cell_of(b);
        let (dx, dy) = (bx - ax, by - ay);
        let Some(d) = Dir::ALL.into_iter().find(|d| d.offset() == (dx, dy)) else {
            return;
        };
        let density = self.pens.density_pen;
        for side in [2i64, -2i64] {
            let perp = Dir::from_index((d.index() as i64 + side).rem_euclid(8) as usize);
            let (px, py) = perp.offset();
            let (sx, sy) = (ax + px, ay + py);
            if let Some(e) = self.real_edge(sx, sy, d) {
                let rev = self.reverse_edge(e);
                for edge in [e, rev] {
                    if self.edge_cost[edge.index()].is_finite() {
                        self.edge_cost[edge.index()] += density;
                    }
                }
            }
        }
    }

    // ── Obstacles ─────────────────────────────────────────────────────────

    /// Permanently close every real edge crossing the obstacle polygon.
    /// Applied before routing; not reversible.
    pub fn add_obstacle(&mut self, poly: &Polygon) {
        let mut closed = 0usize;
        for e in 0..self.edge_count() {
            let e = GridEdgeId(e as u32);
            if self.edge_kind(e) != GridEdgeKind::Real {
                continue;
            }
            let a = self.node_pos(self.edge_from[e.index()]);
            let b = self.node_pos(self.edge_to[e.index()]);
            if poly.intersects_segment(a, b) {
                self.edge_cost[e.index()] = INF;
                self.edge_base[e.index()] = INF;
                closed += 1;
            }
        }
        log::debug!("obstacle closed {closed} grid edges");
    }

    // ── Candidate search ──────────────────────────────────────────────────

    /// Grid hubs within Euclidean distance `max_d` of `p`, nearest first.
    pub fn grid_nd_cands(&self, p: Point, max_d: f64) -> BinaryHeap<Candidate> {
        let mut heap = BinaryHeap::new();
        for entry in self.rtree.locate_within_distance([p.x, p.y], max_d * max_d) {
            heap.push(Candidate {
                dist: p.dist(Point::new(entry.point[0], entry.point[1])),
                node: entry.hub,
            });
        }
        heap
    }

    /// Like [`grid_nd_cands`](Self::grid_nd_cands) but with already-settled
    /// hubs filtered out.
    pub fn gr_nd_cands(&self, p: Point, max_d: f64) -> BinaryHeap<Candidate> {
        let mut heap = self.grid_nd_cands(p, max_d);
        heap.retain(|c| !self.settled_at.contains_key(&c.node));
        heap
    }

    // ── Heuristic ─────────────────────────────────────────────────────────

    /// Lower bound on the cost of any grid path between two cells: the
    /// minimum hop count times the cheapest real-edge cost.
    pub fn heur_cost(&self, xa: i64, ya: i64, xb: i64, yb: i64) -> f64 {
        let hops = (xa - xb).abs().max((ya - yb).abs());
        hops as f64 * self.heur_hop_cost
    }

    // ── Debug / invariants ────────────────────────────────────────────────

    /// Snapshot of all current edge costs (tests use this to verify that
    /// cost-vector writes are exactly reversible).
    pub fn cost_snapshot(&self) -> Vec<f64> {
        self.edge_cost.clone()
    }

    /// Verify the resident-symmetry invariant over all real edges.
    pub fn check_resident_symmetry(&self) -> bool {
        self.residents.iter().all(|(&e, list)| {
            let rev = self.reverse_edge(e);
            self.residents.get(&rev).map_or(false, |r| {
                let mut a = list.clone();
                let mut b = r.clone();
                a.sort_unstable();
                b.sort_unstable();
                a == b
            })
        })
    }

    pub(crate) fn edge_cost_mut(&mut self, e: GridEdgeId) -> &mut f64 {
        &mut self.edge_cost[e.index()]
    }
}
