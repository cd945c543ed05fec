//! The octilinearizer driver.
//!
//! # Routing order
//!
//! Two nested priority queues (global and dangling) walk the combination
//! nodes BFS-like: higher degree first, then higher route number, then
//! stable ID order.  Every popped node routes its incident edges in the
//! node's angular order; the far endpoint of each routed edge joins the
//! dangling queue so the frontier grows outward from already-laid edges,
//! preserving local topology decisions.
//!
//! # Per-edge protocol
//!
//! For one combination edge: orient towards the more constrained endpoint,
//! pick a source hub, collect target candidates with widening radius, open
//! sinks and turns, write the three cost vectors, route, remove the vectors
//! (exact inverse), close and settle, reconstruct the polyline, stamp the
//! generation, and balance the corridors the path used.  A failed edge is
//! logged, recorded as unrouted, and skipped — no partial polyline is kept.

use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use tm_core::{CombEdgeId, CombNodeId, CubicBezier, GridNodeId, Point, PolyLine, TransitNodeId};
use tm_grid::{AStarRouter, GridGraph, GridPath, GridRouter};
use tm_transit::{CombGraph, TransitGraph};

use crate::config::LayoutConfig;
use crate::error::{OctiError, OctiResult};

/// Sample count for the take-off/touch-down Bezier.
const BEZIER_SAMPLES: usize = 10;

/// Bound on the candidate-radius doublings when the target set comes up
/// empty.
const MAX_RADIUS_DOUBLINGS: usize = 4;

// ── Results ───────────────────────────────────────────────────────────────────

/// Outcome summary of one layout run.
#[derive(Clone, Debug, Default)]
pub struct LayoutReport {
    /// Rotation (degrees) the winning layout was computed at.
    pub rotation_deg: f64,
    /// Sum of routing costs over all routed edges.
    pub total_cost: f64,
    pub routed: usize,
    pub unrouted: usize,
    /// `true` if the abort-after generation cap stopped the run early.
    pub aborted: bool,
    /// Short edges collapsed during preparation.
    pub collapsed_edges: usize,
}

/// A finished layout: the schematic transit graph plus its report.
#[derive(Clone, Debug)]
pub struct Drawing {
    pub graph: TransitGraph,
    pub report: LayoutReport,
}

// ── Queue ordering ────────────────────────────────────────────────────────────

/// Routing-queue key: higher degree first, then higher route number, then
/// smaller node ID (determinism).
#[derive(Copy, Clone, PartialEq, Eq)]
struct NodeOrd {
    degree: usize,
    routes: usize,
    node: CombNodeId,
}

impl NodeOrd {
    fn of(cg: &CombGraph, node: CombNodeId) -> Self {
        Self {
            degree: cg.degree(node),
            routes: cg.node(node).route_number,
            node,
        }
    }
}

impl Ord for NodeOrd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.degree
            .cmp(&other.degree)
            .then_with(|| self.routes.cmp(&other.routes))
            .then_with(|| other.node.cmp(&self.node))
    }
}
impl PartialOrd for NodeOrd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── Skip reasons ──────────────────────────────────────────────────────────────

enum Skip {
    NoSourceCand,
    NoTargetCand,
    NoPath,
    SelfLoop,
}

impl Skip {
    fn describe(&self) -> &'static str {
        match self {
            Skip::NoSourceCand => "no free grid hub near the source node",
            Skip::NoTargetCand => "no free grid hub near the target node",
            Skip::NoPath => "router found no path",
            Skip::SelfLoop => "self loop",
        }
    }
}

// ── Octilinearizer ────────────────────────────────────────────────────────────

/// Routing-based layout engine: embeds the combination graph into the
/// octilinear grid.
pub struct Octilinearizer {
    cfg: LayoutConfig,
}

impl Octilinearizer {
    pub fn new(cfg: LayoutConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Lay out `input` and return the schematic graph.
    ///
    /// Tries every configured rotation, keeps the layout with the fewest
    /// unrouted edges (cost as tie-break), and rotates the winner back into
    /// the input frame.
    pub fn draw(&self, input: &TransitGraph) -> OctiResult<Drawing> {
        if self.cfg.hanan_iters > 0 {
            log::warn!(
                "hanan_iters = {} requested, but the regular grid does not densify; ignoring",
                self.cfg.hanan_iters
            );
        }

        let mut base = input.clone();
        let collapsed = base.collapse_short_edges(self.cfg.short_edge_threshold());
        let bbox = base.bbox();
        if bbox.is_empty() {
            return Err(OctiError::EmptyInput);
        }
        let center = bbox.centroid();

        let rotations = if self.cfg.rotations.is_empty() {
            vec![0.0]
        } else {
            self.cfg.rotations.clone()
        };

        let mut best: Option<Drawing> = None;
        for &deg in &rotations {
            let mut tg = base.clone();
            if deg != 0.0 {
                tg.rotate(center, deg);
            }
            let mut cg = CombGraph::build(&tg);
            let mut report = self.layout_once(&tg, &mut cg);
            report.rotation_deg = deg;
            report.collapsed_edges = collapsed;
            log::info!(
                "layout at {deg}°: cost {:.1}, {} routed, {} unrouted",
                report.total_cost,
                report.routed,
                report.unrouted
            );

            let mut graph = build_output_graph(&tg, &cg);
            if deg != 0.0 {
                graph.rotate(center, -deg);
            }
            let drawing = Drawing { graph, report };
            let better = match &best {
                None => true,
                Some(b) => {
                    (drawing.report.unrouted, drawing.report.total_cost)
                        < (b.report.unrouted, b.report.total_cost)
                }
            };
            if better {
                best = Some(drawing);
            }
        }
        Ok(best.expect("at least one rotation attempted"))
    }

    // ── One layout pass ───────────────────────────────────────────────────

    fn layout_once(&self, tg: &TransitGraph, cg: &mut CombGraph) -> LayoutReport {
        let bbox = tg.bbox().padded(self.cfg.border_rad);
        let mut grid = GridGraph::new(
            bbox,
            self.cfg.cell_size,
            self.cfg.pens,
            self.cfg.base_graph,
        );
        for poly in &self.cfg.obstacles {
            grid.add_obstacle(poly);
        }
        let router = AStarRouter;

        let mut global: BinaryHeap<NodeOrd> = cg.node_ids().map(|n| NodeOrd::of(cg, n)).collect();
        let mut dangling: BinaryHeap<NodeOrd> = BinaryHeap::new();
        let mut processed: FxHashSet<CombNodeId> = FxHashSet::default();
        let mut done: FxHashSet<CombEdgeId> = FxHashSet::default();

        let mut report = LayoutReport::default();
        let mut gen: u32 = 0;

        'outer: while let Some(top) = global.pop() {
            dangling.push(top);

            while let Some(NodeOrd { node: n, .. }) = dangling.pop() {
                if processed.contains(&n) {
                    continue;
                }

                for e in cg.node(n).ordered_edges.clone() {
                    if done.contains(&e) {
                        continue;
                    }
                    if let Some(cap) = self.cfg.abort_after {
                        if gen as usize >= cap {
                            report.aborted = true;
                            break 'outer;
                        }
                    }
                    done.insert(e);
                    dangling.push(NodeOrd::of(cg, cg.other_node(e, n)));

                    match self.route_edge(tg, cg, &mut grid, &router, e) {
                        Ok((cost, polyline)) => {
                            let edge = cg.edge_mut(e);
                            edge.polyline = polyline;
                            edge.generation = Some(gen);
                            gen += 1;
                            report.total_cost += cost;
                            report.routed += 1;
                        }
                        Err(skip) => {
                            log::warn!("skipping combination edge {e}: {}", skip.describe());
                            report.unrouted += 1;
                        }
                    }
                    debug_assert!(grid.check_resident_symmetry());
                }
                processed.insert(n);
            }
        }

        // Edges never reached (abort) count as unrouted too.
        report.unrouted = cg
            .edge_ids()
            .filter(|&e| cg.edge(e).generation.is_none())
            .count();
        report
    }

    // ── Single-edge routing ───────────────────────────────────────────────

    fn route_edge(
        &self,
        tg: &TransitGraph,
        cg: &CombGraph,
        grid: &mut GridGraph,
        router: &AStarRouter,
        e: CombEdgeId,
    ) -> Result<(f64, PolyLine), Skip> {
        let cell = self.cfg.cell_size;
        let (mut from, mut to) = (cg.edge(e).from, cg.edge(e).to);
        if from == to {
            return Err(Skip::SelfLoop);
        }
        let mut reversed = false;

        // Orient towards the more constrained endpoint: higher degree first,
        // settled side preferred.
        if cg.degree(from) < cg.degree(to) {
            std::mem::swap(&mut from, &mut to);
            reversed = !reversed;
        }
        if !grid.is_settled(from) && grid.is_settled(to) {
            std::mem::swap(&mut from, &mut to);
            reversed = !reversed;
        }

        let from_was_settled = grid.is_settled(from);
        let to_was_settled = grid.is_settled(to);

        // Source hub: the settled one, or the nearest free candidate.
        let src = match grid.settled_hub(from) {
            Some(h) => h,
            None => {
                let mut cands = grid.gr_nd_cands(cg.pos(tg, from), 1.7 * cell);
                match cands.pop() {
                    Some(c) => c.node,
                    None => return Err(Skip::NoSourceCand),
                }
            }
        };

        // Target candidates with their movement cost.
        let target_costs: Vec<(GridNodeId, f64)> = match grid.settled_hub(to) {
            Some(h) => vec![(h, 0.0)],
            None => {
                let to_pos = cg.pos(tg, to);
                let mut radius = self.get_max_dis(cg, to, e);
                let cap = radius.max(self.cfg.max_grid_dist * cell);
                let mut cands = grid.gr_nd_cands(to_pos, radius);
                let mut tries = 0;
                while cands.iter().all(|c| c.node == src)
                    && radius < cap
                    && tries < MAX_RADIUS_DOUBLINGS
                {
                    radius = (radius * 2.0).min(cap);
                    cands = grid.gr_nd_cands(to_pos, radius);
                    tries += 1;
                }
                let list: Vec<(GridNodeId, f64)> = cands
                    .into_sorted_vec()
                    .into_iter()
                    .rev() // sorted_vec of the reversed order is farthest-first
                    .filter(|c| c.node != src)
                    .map(|c| {
                        let grid_dist = grid.node_pos(c.node).dist(to_pos) / cell;
                        let mut cost = grid_dist * self.cfg.pens.move_pen_per_grid;
                        if grid_dist > 1.0 {
                            cost += grid.nd_move_pen(tg, cg, to, c.node);
                        }
                        (c.node, cost)
                    })
                    .collect();
                if list.is_empty() {
                    return Err(Skip::NoTargetCand);
                }
                list
            }
        };

        // Open the endpoints.
        for &(t, cost) in &target_costs {
            grid.open_sink_to(t, cost);
            grid.open_turns(t);
        }
        grid.open_sink_fr(src, 0.0);
        grid.open_turns(src);

        // Cost vectors on the source (and a lone target).
        let src_vec = grid
            .node_bend_pen(tg, cg, src, from, e, cg.pos(tg, to), false)
            .plus(&grid.topo_block_pen(cg, src, from, e))
            .plus(&grid.spacing_pen(cg, src, from, e));
        let applied_src = grid.add_cost_vec(src, src_vec);

        let applied_to = if target_costs.len() == 1 {
            let t = target_costs[0].0;
            let vec = grid
                .node_bend_pen(tg, cg, t, to, e, cg.pos(tg, from), true)
                .plus(&grid.topo_block_pen(cg, t, to, e))
                .plus(&grid.spacing_pen(cg, t, to, e));
            Some((t, grid.add_cost_vec(t, vec)))
        } else {
            None
        };

        let targets: FxHashSet<GridNodeId> = target_costs.iter().map(|&(t, _)| t).collect();
        let result = router.shortest_path(grid, src, &targets);

        // Exact inverse restore, unconditionally.
        grid.remove_cost_vec(src, applied_src);
        if let Some((t, applied)) = applied_to {
            grid.remove_cost_vec(t, applied);
        }

        let Some(path) = result else {
            // Close what we opened; turns re-close only on hubs that were
            // settled before (open is the default for all others).
            for &(t, _) in &target_costs {
                grid.close_sink_to(t);
                if to_was_settled {
                    grid.close_turns(t);
                }
            }
            grid.close_sink_fr(src);
            if from_was_settled {
                grid.close_turns(src);
            }
            return Err(Skip::NoPath);
        };

        // Close sinks everywhere; settle the chosen endpoints (closing their
        // turns again).
        for &(t, _) in &target_costs {
            grid.close_sink_to(t);
        }
        grid.close_sink_fr(src);
        grid.settle_nd(src, from);
        grid.settle_nd(path.target, to);

        // Residency and edge settling.
        for &ge in &path.edges {
            if grid.is_secondary(ge) {
                grid.add_resident(ge, e);
            } else {
                let a = grid.hub_of(grid.edge_from(ge));
                let b = grid.hub_of(grid.edge_to(ge));
                grid.settle_edg(a, b, e);
            }
        }

        let polyline = build_polyline(
            grid,
            &path,
            cg.pos(tg, from),
            cg.pos(tg, to),
            reversed,
        );

        // Balance: surcharge corridors parallel to the fresh path.
        for &ge in &path.edges {
            if !grid.is_secondary(ge) {
                let a = grid.hub_of(grid.edge_from(ge));
                let b = grid.hub_of(grid.edge_to(ge));
                grid.balance_edge(a, b);
            }
        }

        Ok((path.cost, polyline))
    }

    /// Search radius for target candidates of `e` ending at `to`.
    fn get_max_dis(&self, cg: &CombGraph, to: CombNodeId, e: CombEdgeId) -> f64 {
        let cell = self.cfg.cell_size;
        let len = cg.edge(e).polyline.len();
        if cg.degree(to) == 1 {
            return len / 1.5;
        }
        let childs = cg.edge(e).children.len();
        if childs > 5 {
            let avg = len / childs as f64;
            if avg > 4.0 * cell {
                return (avg - 4.0 * cell) * childs as f64;
            }
        }
        1.7 * cell
    }
}

// ── Polyline reconstruction ───────────────────────────────────────────────────

/// Rebuild the routed course from a grid path: the geographic position of
/// `from`, the hub centroids along the path, and the geographic position of
/// `to`.  Gaps (possible on grid variants whose ports carry their own
/// geometry) are bridged by a cubic Bezier anchored at the start position.
fn build_polyline(
    grid: &GridGraph,
    path: &GridPath,
    from_pos: Point,
    to_pos: Point,
    reversed: bool,
) -> PolyLine {
    let mut pl = PolyLine::new();
    for &ge in &path.edges {
        if grid.is_secondary(ge) {
            continue;
        }
        let u_pos = grid.node_pos(grid.edge_from(ge));
        let v_pos = grid.node_pos(grid.edge_to(ge));
        match pl.last() {
            None => pl.push(from_pos),
            Some(last) if last != u_pos => {
                let bc = CubicBezier::new(last, from_pos, from_pos, u_pos);
                pl.extend_from(&bc.render(BEZIER_SAMPLES));
            }
            _ => {}
        }
        pl.push(u_pos);
        pl.push(v_pos);
    }
    pl.push(to_pos);
    if pl.points().len() < 2 {
        pl = PolyLine::straight(from_pos, to_pos);
    }
    if reversed {
        pl.reverse();
    }
    pl
}

// ── Output graph construction ─────────────────────────────────────────────────

/// Expand the routed combination graph back into a transit graph: every
/// combination edge's polyline is split into equal-fraction segments, one
/// per child, re-creating the interior joints.  Unrouted edges are omitted
/// entirely.
pub fn build_output_graph(tg: &TransitGraph, cg: &CombGraph) -> TransitGraph {
    let mut out = TransitGraph::new();
    for line in tg.lines() {
        out.add_line(line.clone());
    }

    let mut node_map: FxHashMap<TransitNodeId, TransitNodeId> = FxHashMap::default();

    for ce in cg.edge_ids() {
        let edge = cg.edge(ce);
        let Some(generation) = edge.generation else {
            continue;
        };
        let total = edge.children.len();
        let mut pre = cg.node(edge.from).transit;

        for (i, &child) in edge.children.iter().enumerate() {
            let mut seg = edge
                .polyline
                .segment(i as f64 / total as f64, (i + 1) as f64 / total as f64);
            let child_edge = tg.edge(child);
            // Orient the slice along the child edge.
            if child_edge.from == pre {
                pre = child_edge.to;
            } else {
                seg.reverse();
                pre = child_edge.from;
            }

            let seg_start = seg.first().expect("segment with points");
            let seg_end = seg.last().expect("segment with points");
            let a = *node_map.entry(child_edge.from).or_insert_with(|| {
                copy_node(tg, &mut out, child_edge.from, seg_start)
            });
            let b = *node_map
                .entry(child_edge.to)
                .or_insert_with(|| copy_node(tg, &mut out, child_edge.to, seg_end));

            let oe = out.add_edge(a, b, seg, child_edge.lines.clone());
            out.edge_mut(oe).generation = Some(generation);
        }
    }

    // Re-anchor directional line occurrences into the new arena; directions
    // pointing at nodes that did not survive are dropped.
    let edge_ids: Vec<_> = out.edge_ids().collect();
    for oe in edge_ids {
        for occ in &mut out.edge_mut(oe).lines {
            occ.direction = occ.direction.and_then(|old| node_map.get(&old).copied());
        }
    }
    out
}

fn copy_node(
    tg: &TransitGraph,
    out: &mut TransitGraph,
    node: TransitNodeId,
    pos: Point,
) -> TransitNodeId {
    let id = out.add_node(pos);
    for s in &tg.node(node).stations {
        out.add_station(id, s.clone());
    }
    id
}
