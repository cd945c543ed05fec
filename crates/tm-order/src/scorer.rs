//! Crossing and separation counting.
//!
//! # Definitions
//!
//! For a node `n` and an edge `ea` carrying the line pair `(a, b)`:
//!
//! - **same-segment crossing** — both lines continue into the same edge `eb`
//!   but their relative positions differ between `ea` and `eb`;
//! - **different-segment crossing** — the lines continue into *different*
//!   edges whose angular directions interleave with the pair's order on `ea`;
//! - **separation** — the pair is adjacent on `ea` (positions differ by one)
//!   but not on a continuing `eb`.
//!
//! Candidates are enumerated independently of any ordering, so the same
//! lists feed both the scorer (counting under a configuration) and the ILP
//! builder (emitting constraints).  Line pairs are ordered by `LineId` and
//! each unordered incident-edge pair is visited once.
//!
//! # Orientation
//!
//! An edge's ordering lists its lines left-to-right walking `from → to`;
//! viewed from a node the sense flips when the walk direction does.  The
//! flips are captured per candidate so consumers only compare positions.

use rustc_hash::FxHashMap;

use tm_core::{LineId, TransitEdgeId, TransitNodeId};
use tm_transit::TransitGraph;

/// Per-edge line permutation: `cfg[edge]` lists the edge's lines in drawing
/// order (left to right walking from `from` to `to`).
pub type OrderCfg = FxHashMap<TransitEdgeId, Vec<LineId>>;

/// Crossing and splitting penalty weights.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrderPenalties {
    pub same_seg: f64,
    pub diff_seg: f64,
    pub split: f64,
}

impl Default for OrderPenalties {
    fn default() -> Self {
        Self { same_seg: 4.0, diff_seg: 1.0, split: 3.0 }
    }
}

/// The identity ordering: every line-carrying edge keeps its input order.
pub fn initial_cfg(g: &TransitGraph) -> OrderCfg {
    let mut cfg = OrderCfg::default();
    for e in g.edge_ids() {
        let lines = g.edge(e).distinct_lines();
        if !lines.is_empty() {
            cfg.insert(e, lines);
        }
    }
    cfg
}

// ── Candidates ────────────────────────────────────────────────────────────────

/// A line pair that may cross between two shared-continuation edges.
#[derive(Clone, Debug)]
pub struct SameSegCand {
    pub node: TransitNodeId,
    pub ea: TransitEdgeId,
    pub eb: TransitEdgeId,
    pub a: LineId,
    pub b: LineId,
    /// Sense flip of the pair as seen from `node` (walk direction).
    pub flip_a: bool,
    pub flip_b: bool,
}

/// A line pair branching into two different edges.
#[derive(Clone, Debug)]
pub struct DiffSegCand {
    pub node: TransitNodeId,
    pub ea: TransitEdgeId,
    /// `a` continues into `eb`, `b` into `ec`.
    pub eb: TransitEdgeId,
    pub ec: TransitEdgeId,
    pub a: LineId,
    pub b: LineId,
    pub flip_a: bool,
    /// `true` when `eb` lies left of `ec` in the fan seen arriving on `ea`.
    pub eb_left: bool,
}

/// A line pair that may lose adjacency across a continuation.
#[derive(Clone, Debug)]
pub struct SepCand {
    pub node: TransitNodeId,
    pub ea: TransitEdgeId,
    pub eb: TransitEdgeId,
    pub a: LineId,
    pub b: LineId,
}

/// All candidates at one node, grouped by kind.
#[derive(Clone, Debug, Default)]
pub struct NodeCands {
    pub same_seg: Vec<SameSegCand>,
    pub diff_seg: Vec<DiffSegCand>,
    pub sep: Vec<SepCand>,
}

/// Incident line-carrying edges of `n`, ascending by ID.
pub fn line_edges_at(g: &TransitGraph, n: TransitNodeId) -> Vec<TransitEdgeId> {
    let mut edges: Vec<TransitEdgeId> = g
        .node(n)
        .adj
        .iter()
        .copied()
        .filter(|&e| !g.edge(e).lines.is_empty())
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// Ordered line pairs `(a, b)` with `a < b` by `LineId`.
fn line_pairs(g: &TransitGraph, e: TransitEdgeId) -> Vec<(LineId, LineId)> {
    let mut lines = g.edge(e).distinct_lines();
    lines.sort_unstable();
    let mut pairs = Vec::new();
    for i in 0..lines.len() {
        for j in i + 1..lines.len() {
            pairs.push((lines[i], lines[j]));
        }
    }
    pairs
}

fn carries(g: &TransitGraph, e: TransitEdgeId, l: LineId) -> bool {
    g.edge(e).lines.iter().any(|occ| occ.line == l)
}

/// Angle of `e` at `n`: direction of its first course segment leaving `n`.
fn edge_angle_at(g: &TransitGraph, e: TransitEdgeId, n: TransitNodeId) -> f64 {
    let edge = g.edge(e);
    let pts = edge.polyline.points();
    debug_assert!(pts.len() >= 2);
    if edge.from == n {
        pts[0].angle_to(pts[1])
    } else {
        pts[pts.len() - 1].angle_to(pts[pts.len() - 2])
    }
}

/// Enumerate every crossing/separation candidate at `n`.
pub fn node_cands(g: &TransitGraph, n: TransitNodeId) -> NodeCands {
    use std::f64::consts::TAU;

    let edges = line_edges_at(g, n);
    let mut out = NodeCands::default();
    // Each unordered {ea, eb} pair of a line pair is counted once: a
    // processed set mirrors enumerating ea < eb.
    let mut proced: FxHashMap<(LineId, LineId), Vec<TransitEdgeId>> = FxHashMap::default();

    for &ea in &edges {
        let flip_a = g.edge(ea).from == n;
        for (a, b) in line_pairs(g, ea) {
            proced.entry((a, b)).or_default().push(ea);

            // Same-segment partners: edges carrying both lines.
            for &eb in &edges {
                if eb == ea || !carries(g, eb, a) || !carries(g, eb, b) {
                    continue;
                }
                if proced.get(&(a, b)).is_some_and(|v| v.contains(&eb)) {
                    continue;
                }
                out.same_seg.push(SameSegCand {
                    node: n,
                    ea,
                    eb,
                    a,
                    b,
                    flip_a,
                    flip_b: g.edge(eb).to == n,
                });
                out.sep.push(SepCand { node: n, ea, eb, a, b });
            }

            // Different-segment partner pairs: `a` into `eb`, `b` into `ec`.
            for &eb in &edges {
                if eb == ea || !carries(g, eb, a) || carries(g, eb, b) {
                    continue;
                }
                for &ec in &edges {
                    if ec == ea || ec == eb || !carries(g, ec, b) || carries(g, ec, a) {
                        continue;
                    }
                    let ang_ea = edge_angle_at(g, ea, n);
                    let delta_b = (edge_angle_at(g, eb, n) - ang_ea).rem_euclid(TAU);
                    let delta_c = (edge_angle_at(g, ec, n) - ang_ea).rem_euclid(TAU);
                    out.diff_seg.push(DiffSegCand {
                        node: n,
                        ea,
                        eb,
                        ec,
                        a,
                        b,
                        flip_a,
                        eb_left: delta_b > delta_c,
                    });
                }
            }
        }
    }
    out
}

// ── Evaluation under a configuration ──────────────────────────────────────────

fn pos(cfg: &OrderCfg, e: TransitEdgeId, l: LineId) -> usize {
    cfg[&e].iter().position(|&x| x == l).expect("line missing from ordering")
}

pub fn same_seg_crossed(cfg: &OrderCfg, c: &SameSegCand) -> bool {
    let a_first_ea = (pos(cfg, c.ea, c.a) < pos(cfg, c.ea, c.b)) ^ c.flip_a;
    let a_first_eb = (pos(cfg, c.eb, c.a) < pos(cfg, c.eb, c.b)) ^ c.flip_b;
    a_first_ea != a_first_eb
}

pub fn diff_seg_crossed(cfg: &OrderCfg, c: &DiffSegCand) -> bool {
    // `a` left of `b` arriving at the node, vs `a`'s destination left of
    // `b`'s: interleaved iff they disagree.
    let a_left = (pos(cfg, c.ea, c.a) < pos(cfg, c.ea, c.b)) ^ c.flip_a;
    a_left != c.eb_left
}

pub fn separated(cfg: &OrderCfg, c: &SepCand) -> bool {
    // Adjacent on exactly one of the two edges: the pair splits apart on
    // the side where it was together.
    let on_ea = pos(cfg, c.ea, c.a).abs_diff(pos(cfg, c.ea, c.b)) == 1;
    let on_eb = pos(cfg, c.eb, c.a).abs_diff(pos(cfg, c.eb, c.b)) == 1;
    on_ea != on_eb
}

/// `(same_seg, diff_seg)` crossing counts at `n` under `cfg`.
pub fn num_crossings_at(g: &TransitGraph, cfg: &OrderCfg, n: TransitNodeId) -> (usize, usize) {
    let cands = node_cands(g, n);
    let same = cands.same_seg.iter().filter(|c| same_seg_crossed(cfg, c)).count();
    let diff = cands.diff_seg.iter().filter(|c| diff_seg_crossed(cfg, c)).count();
    (same, diff)
}

/// Separation count at `n` under `cfg`.
pub fn num_separations_at(g: &TransitGraph, cfg: &OrderCfg, n: TransitNodeId) -> usize {
    node_cands(g, n).sep.iter().filter(|c| separated(cfg, c)).count()
}

/// Weighted score of `n` under `cfg`.
pub fn node_score(
    g: &TransitGraph,
    cfg: &OrderCfg,
    pens: &OrderPenalties,
    n: TransitNodeId,
) -> f64 {
    let (same, diff) = num_crossings_at(g, cfg, n);
    let seps = num_separations_at(g, cfg, n);
    same as f64 * pens.same_seg + diff as f64 * pens.diff_seg + seps as f64 * pens.split
}

/// Weighted score over the whole graph.
pub fn graph_score(g: &TransitGraph, cfg: &OrderCfg, pens: &OrderPenalties) -> f64 {
    g.node_ids().map(|n| node_score(g, cfg, pens, n)).sum()
}
