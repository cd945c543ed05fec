//! The routing cost model.
//!
//! Three per-direction penalty vectors are written onto the source (and a
//! lone target) hub before every shortest-path call and removed exactly
//! afterwards:
//!
//! 1. **bend** — cost of departing/arriving at an angle away from the
//!    direction that continues the edge's course;
//! 2. **topology block** — surcharge on directions that would violate the
//!    combination node's precomputed angular edge ordering;
//! 3. **spacing** — surcharge on directions too close to ports that adjacent
//!    edges still need.
//!
//! [`GridGraph::add_cost_vec`] returns the vector it actually applied; the
//! caller hands that inverse back to [`GridGraph::remove_cost_vec`].
//! Reversibility is a hard invariant: an unmatched pair corrupts the grid
//! permanently.

use tm_core::{angle_diff, CombEdgeId, CombNodeId, Dir, GridEdgeId, GridNodeId, Point};
use tm_transit::{CombGraph, TransitGraph};

use crate::grid::GridGraph;

// ── Penalties ─────────────────────────────────────────────────────────────────

/// All layout penalty weights.
///
/// Costs are unitless; real-edge costs are normalized per grid hop (diagonal
/// hops carry the extra √2 length factor).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Penalties {
    /// Turning by 45° / 90° / 135° inside a cell.
    pub p_45: f64,
    pub p_90: f64,
    pub p_135: f64,
    /// Per-hop base cost of horizontal / vertical / diagonal real edges.
    pub horizontal_pen: f64,
    pub vertical_pen: f64,
    pub diagonal_pen: f64,
    /// Cost per cell of displacing a node from its geographic position.
    pub move_pen_per_grid: f64,
    /// Surcharge on directions that violate the angular edge ordering.
    pub topo_block_pen: f64,
    /// Per-missing-slot surcharge for directions crowding adjacent edges.
    pub spacing_pen: f64,
    /// Added to corridors parallel to a freshly routed edge.
    pub density_pen: f64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            p_45: 1.0,
            p_90: 1.5,
            p_135: 2.0,
            horizontal_pen: 1.0,
            vertical_pen: 1.0,
            diagonal_pen: 1.0,
            move_pen_per_grid: 10.0,
            topo_block_pen: 500.0,
            spacing_pen: 10.0,
            density_pen: 2.0,
        }
    }
}

impl Penalties {
    /// Cost of turning by `sharpness` 45°-steps (0 = straight on).
    pub fn bend_cost(&self, sharpness: usize) -> f64 {
        match sharpness {
            0 => 0.0,
            1 => self.p_45,
            2 => self.p_90,
            3 => self.p_135,
            // Full U-turn: three times the sharpest allowed turn, effectively
            // never chosen but still finite so cost vectors stay reversible.
            _ => self.p_135 * 3.0,
        }
    }

    /// Per-hop cost of a real edge in direction `d` (diagonals ×√2).
    pub fn real_cost(&self, d: Dir) -> f64 {
        match d {
            Dir::E | Dir::W => self.horizontal_pen,
            Dir::N | Dir::S => self.vertical_pen,
            _ => self.diagonal_pen * std::f64::consts::SQRT_2,
        }
    }
}

// ── NodeCost ──────────────────────────────────────────────────────────────────

/// An 8-entry cost vector indexed by port direction.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct NodeCost(pub [f64; 8]);

impl NodeCost {
    pub const ZERO: NodeCost = NodeCost([0.0; 8]);

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    /// Component-wise sum.
    pub fn plus(&self, other: &NodeCost) -> NodeCost {
        let mut out = [0.0; 8];
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.0[i] + other.0[i];
        }
        NodeCost(out)
    }
}

impl std::ops::Index<usize> for NodeCost {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

// ── Cost vector application ───────────────────────────────────────────────────

impl GridGraph {
    /// Add `vec[d]` to both sink edges of port `d` for every direction whose
    /// sinks are currently open.  Returns the vector actually applied — the
    /// exact inverse to hand to [`remove_cost_vec`](Self::remove_cost_vec).
    pub fn add_cost_vec(&mut self, hub: GridNodeId, vec: NodeCost) -> NodeCost {
        debug_assert!(self.is_hub(hub));
        let mut applied = NodeCost::ZERO;
        for d in Dir::ALL {
            let amount = vec[d.index()];
            if amount == 0.0 {
                continue;
            }
            let mut touched = false;
            for e in self.sink_edges(hub, d) {
                if self.edge_cost(e).is_finite() {
                    *self.edge_cost_mut(e) += amount;
                    touched = true;
                }
            }
            if touched {
                applied.0[d.index()] = amount;
            }
        }
        applied
    }

    /// Subtract a vector previously returned by
    /// [`add_cost_vec`](Self::add_cost_vec), restoring the exact prior state.
    pub fn remove_cost_vec(&mut self, hub: GridNodeId, applied: NodeCost) {
        debug_assert!(self.is_hub(hub));
        for d in Dir::ALL {
            let amount = applied[d.index()];
            if amount == 0.0 {
                continue;
            }
            for e in self.sink_edges(hub, d) {
                if self.edge_cost(e).is_finite() {
                    let c = self.edge_cost_mut(e);
                    *c -= amount;
                    debug_assert!(*c >= 0.0, "cost vector removal drove a cost negative");
                }
            }
        }
    }

    /// The two directed sink edges at port `d` of `hub`.
    fn sink_edges(&self, hub: GridNodeId, d: Dir) -> Vec<GridEdgeId> {
        let (x, y) = self.cell_of(hub);
        let mut out = Vec::with_capacity(2);
        if let Some(port) = self.port_at(x, y, d) {
            if let Some(e) = self.edge_between(hub, port) {
                out.push(e);
            }
            if let Some(e) = self.edge_between(port, hub) {
                out.push(e);
            }
        }
        out
    }

    // ── Penalty vector computation ────────────────────────────────────────

    /// Bend penalty vector for routing `e` through `hub`.
    ///
    /// The reference direction continues the already-settled course of the
    /// lines on `e` when one of them leaves this hub through a settled
    /// incident edge; otherwise it is the ideal angle towards `toward`.
    /// `arrival` selects whether port `d` means travel direction `d`
    /// (departure at the source) or `opposite(d)` (arrival at the target).
    pub fn node_bend_pen(
        &self,
        tg: &TransitGraph,
        cg: &CombGraph,
        hub: GridNodeId,
        cn: CombNodeId,
        e: CombEdgeId,
        toward: Point,
        arrival: bool,
    ) -> NodeCost {
        let lines = cg.line_set(tg, e);
        let occupied = self.settled_adj_edges(cg, hub, cn);

        // Continuation: a settled incident edge sharing a line with `e`.
        let continuation = Dir::ALL.into_iter().find_map(|d| {
            let f = occupied[d.index()]?;
            if f == e {
                return None;
            }
            let shared = cg.line_set(tg, f).intersection(&lines).next().is_some();
            // The shared line arrives here along `d`'s opposite; continuing
            // it straight means leaving through the opposite port.
            shared.then(|| d.opposite().angle())
        });
        let ref_angle = continuation.unwrap_or_else(|| self.node_pos(hub).angle_to(toward));

        let mut vec = NodeCost::ZERO;
        for d in Dir::ALL {
            let travel = if arrival { d.opposite() } else { d };
            let diff = angle_diff(travel.angle(), ref_angle);
            let sharpness = (diff.to_degrees() / 45.0).round() as usize;
            vec.0[d.index()] = self.pens().bend_cost(sharpness.min(4));
        }
        vec
    }

    /// Topology-block penalty: for every candidate direction, check whether
    /// placing `e` there keeps the settled incident edges and `e` in the
    /// node's precomputed cyclic angular order.  Violating directions get
    /// the block surcharge.
    pub fn topo_block_pen(
        &self,
        cg: &CombGraph,
        hub: GridNodeId,
        cn: CombNodeId,
        e: CombEdgeId,
    ) -> NodeCost {
        let order = &cg.node(cn).ordered_edges;
        let occupied = self.settled_adj_edges(cg, hub, cn);
        let mut vec = NodeCost::ZERO;

        for d in Dir::ALL {
            if occupied[d.index()].is_some() {
                continue; // the port is taken anyway; its real edge is closed
            }
            let mut present: Vec<(usize, CombEdgeId)> = occupied
                .iter()
                .enumerate()
                .filter_map(|(dir, &f)| f.map(|f| (dir, f)))
                .collect();
            present.push((d.index(), e));
            // Port indices ascend clockwise while the angular ordering
            // ascends counterclockwise; reverse so both run the same way.
            present.sort_unstable_by_key(|&(dir, _)| dir);
            present.reverse();

            let positions: Vec<usize> = present
                .iter()
                .filter_map(|&(_, f)| order.iter().position(|&o| o == f))
                .collect();
            if positions.len() == present.len() && !cyclically_ordered(&positions) {
                vec.0[d.index()] = self.pens().topo_block_pen;
            }
        }
        vec
    }

    /// Spacing penalty: directions too close (angularly) to settled edges
    /// pay for every port slot the edges between them in the cyclic order
    /// still need.
    pub fn spacing_pen(
        &self,
        cg: &CombGraph,
        hub: GridNodeId,
        cn: CombNodeId,
        e: CombEdgeId,
    ) -> NodeCost {
        let order = &cg.node(cn).ordered_edges;
        let occupied = self.settled_adj_edges(cg, hub, cn);
        let Some(e_pos) = order.iter().position(|&o| o == e) else {
            return NodeCost::ZERO;
        };
        let k = order.len();
        let mut vec = NodeCost::ZERO;

        for d in Dir::ALL {
            if occupied[d.index()].is_some() {
                continue;
            }
            let mut pen = 0.0;
            for (df, f) in occupied.iter().enumerate() {
                let Some(f) = f else { continue };
                let Some(f_pos) = order.iter().position(|&o| o == *f) else {
                    continue;
                };
                // Ordering positions ascend counterclockwise; port indices
                // ascend clockwise.  On each arc from f to e, every edge
                // strictly between them needs one port slot of its own.
                let ccw_between = (e_pos + k - f_pos - 1) % k;
                let ccw_ports = (df + 8 - d.index()) % 8;
                if ccw_ports < ccw_between + 1 {
                    pen += self.pens().spacing_pen * (ccw_between + 1 - ccw_ports) as f64;
                }
                let cw_between = (f_pos + k - e_pos - 1) % k;
                let cw_ports = (d.index() + 8 - df) % 8;
                if cw_ports < cw_between + 1 {
                    pen += self.pens().spacing_pen * (cw_between + 1 - cw_ports) as f64;
                }
            }
            vec.0[d.index()] = pen;
        }
        vec
    }

    /// Which settled combination edge (incident to `cn`) occupies each port
    /// of `hub`, read off the residents of the adjacent real edges.
    pub fn settled_adj_edges(
        &self,
        cg: &CombGraph,
        hub: GridNodeId,
        cn: CombNodeId,
    ) -> [Option<CombEdgeId>; 8] {
        let (x, y) = self.cell_of(hub);
        let mut out = [None; 8];
        for d in Dir::ALL {
            let Some(e) = self.real_edge(x, y, d) else { continue };
            out[d.index()] = self
                .residents(e)
                .iter()
                .copied()
                .find(|&ce| cg.edge(ce).from == cn || cg.edge(ce).to == cn);
        }
        out
    }

    /// Extra sink cost for settling `to` on a displaced hub: the topology
    /// surcharge applies when the displacement flips the canonical direction
    /// towards an already-settled neighbor, which would force that neighbor
    /// into a forbidden relative position.
    pub fn nd_move_pen(
        &self,
        tg: &TransitGraph,
        cg: &CombGraph,
        to: CombNodeId,
        cand_hub: GridNodeId,
    ) -> f64 {
        let ideal = cg.pos(tg, to);
        let cand = self.node_pos(cand_hub);
        let mut pen = 0.0;
        for &f in &cg.node(to).adj {
            let nb = cg.other_node(f, to);
            let Some(nb_hub) = self.settled_hub(nb) else { continue };
            let nb_pos = self.node_pos(nb_hub);
            if cand == nb_pos {
                pen += self.pens().topo_block_pen;
                continue;
            }
            let ideal_dir = Dir::between(ideal, nb_pos);
            let cand_dir = Dir::between(cand, nb_pos);
            if ideal_dir != cand_dir {
                pen += self.pens().topo_block_pen;
            }
        }
        pen
    }
}

/// `true` if the (distinct) positions appear in cyclic ascending order —
/// at most one wrap-around descent over the closed cycle.
fn cyclically_ordered(positions: &[usize]) -> bool {
    if positions.len() < 3 {
        return true;
    }
    let descents = (0..positions.len())
        .filter(|&i| positions[(i + 1) % positions.len()] < positions[i])
        .count();
    descents <= 1
}
