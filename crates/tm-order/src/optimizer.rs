//! Strategy dispatch and the concrete optimizers.
//!
//! Connected components of the line graph are optimized independently.  In
//! the combined mode a component with unit cardinality keeps its input order
//! (nothing can cross), a tiny solution space is enumerated exhaustively,
//! and everything else becomes a 0/1 program handed to the first available
//! solver.  When every solver is absent or fails, the component keeps the
//! input ordering and the fallback is reported.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};

use tm_core::{LineId, TransitEdgeId, TransitNodeId};
use tm_transit::TransitGraph;

use crate::ilp::{solve_cached, IlpProgram, SolverRegistry, VarKind};
use crate::scorer::{
    graph_score, initial_cfg, line_edges_at, node_cands, node_score, OrderCfg, OrderPenalties,
};

/// Exhaustive enumeration refuses solution spaces beyond this.
const EXHAUST_CAP: f64 = 1e6;

// ── Mode & report ─────────────────────────────────────────────────────────────

/// Optimization strategy selection.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum OptMode {
    /// Keep the input ordering everywhere.
    Null,
    /// Enumerate every permutation combination.
    Exhaust,
    /// Always build the 0/1 program.
    Ilp,
    /// Dispatch per component by cardinality and solution-space size.
    #[default]
    Comb,
}

impl FromStr for OptMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(OptMode::Null),
            "exhaust" => Ok(OptMode::Exhaust),
            "ilp" => Ok(OptMode::Ilp),
            "comb" => Ok(OptMode::Comb),
            other => Err(format!("unknown optimization mode '{other}'")),
        }
    }
}

/// Outcome summary of one optimization run.
#[derive(Clone, Debug, Default)]
pub struct OptReport {
    pub components: usize,
    /// Components that went through the ILP path.
    pub ilp_components: usize,
    /// Components that kept the input ordering because no solver delivered.
    pub ilp_fallbacks: usize,
    pub score_before: f64,
    pub score_after: f64,
}

// ── Components ────────────────────────────────────────────────────────────────

/// One connected component of the line graph: the unit of optimization.
pub struct Component {
    pub nodes: Vec<TransitNodeId>,
    pub edges: Vec<TransitEdgeId>,
}

/// Connected components over line-carrying edges, deterministic order.
pub fn components(g: &TransitGraph) -> Vec<Component> {
    let mut seen: FxHashSet<TransitNodeId> = FxHashSet::default();
    let mut out = Vec::new();

    for start in g.node_ids() {
        if seen.contains(&start) || line_edges_at(g, start).is_empty() {
            continue;
        }
        let mut nodes = Vec::new();
        let mut edges = FxHashSet::default();
        let mut stack = vec![start];
        seen.insert(start);
        while let Some(n) = stack.pop() {
            nodes.push(n);
            for e in line_edges_at(g, n) {
                edges.insert(e);
                let other = g.other_node(e, n);
                if seen.insert(other) {
                    stack.push(other);
                }
            }
        }
        nodes.sort_unstable();
        let mut edges: Vec<TransitEdgeId> = edges.into_iter().collect();
        edges.sort_unstable();
        out.push(Component { nodes, edges });
    }
    out
}

fn max_cardinality(g: &TransitGraph, comp: &Component) -> usize {
    comp.edges
        .iter()
        .map(|&e| g.edge(e).distinct_lines().len())
        .max()
        .unwrap_or(0)
}

fn solution_space(g: &TransitGraph, comp: &Component) -> f64 {
    comp.edges
        .iter()
        .map(|&e| factorial(g.edge(e).distinct_lines().len()))
        .product()
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

// ── LineOrderOptimizer ────────────────────────────────────────────────────────

/// Assigns a line permutation to every edge, minimizing weighted crossings
/// and splittings.
pub struct LineOrderOptimizer {
    pub mode: OptMode,
    pub pens: OrderPenalties,
    /// Preferred solver name; consulted before the preference chain.
    pub solver_wish: Option<String>,
    pub time_limit: Option<Duration>,
    pub cache_dir: Option<PathBuf>,
    pub solvers: SolverRegistry,
}

impl LineOrderOptimizer {
    pub fn new(mode: OptMode) -> Self {
        Self {
            mode,
            pens: OrderPenalties::default(),
            solver_wish: None,
            time_limit: None,
            cache_dir: None,
            solvers: SolverRegistry::new(),
        }
    }

    /// Optimize the whole graph and return the per-edge orderings.
    pub fn optimize(&self, g: &TransitGraph) -> (OrderCfg, OptReport) {
        let mut cfg = initial_cfg(g);
        let comps = components(g);
        let mut report = OptReport {
            components: comps.len(),
            score_before: graph_score(g, &cfg, &self.pens),
            ..OptReport::default()
        };

        for comp in &comps {
            match self.mode {
                OptMode::Null => {}
                OptMode::Exhaust => self.exhaustive(g, &mut cfg, comp, &mut report),
                OptMode::Ilp => self.ilp(g, &mut cfg, comp, &mut report),
                OptMode::Comb => {
                    let cards = max_cardinality(g, comp);
                    if cards <= 1 {
                        // Null: single lines cannot cross.
                    } else if solution_space(g, comp) < 10.0 {
                        self.exhaustive(g, &mut cfg, comp, &mut report);
                    } else {
                        self.ilp(g, &mut cfg, comp, &mut report);
                    }
                }
            }
        }

        report.score_after = graph_score(g, &cfg, &self.pens);
        log::info!(
            "line ordering: {} components, score {:.1} → {:.1}, {} ILP fallbacks",
            report.components,
            report.score_before,
            report.score_after,
            report.ilp_fallbacks
        );
        (cfg, report)
    }

    // ── Exhaustive strategy ───────────────────────────────────────────────

    fn exhaustive(
        &self,
        g: &TransitGraph,
        cfg: &mut OrderCfg,
        comp: &Component,
        report: &mut OptReport,
    ) {
        let space = solution_space(g, comp);
        if space > EXHAUST_CAP {
            log::warn!(
                "solution space {space:.0} too large for exhaustive enumeration, keeping input order"
            );
            report.ilp_fallbacks += 1;
            return;
        }

        let edge_perms: Vec<(TransitEdgeId, Vec<Vec<LineId>>)> = comp
            .edges
            .iter()
            .map(|&e| (e, permutations(g.edge(e).distinct_lines())))
            .collect();

        let comp_score = |g: &TransitGraph, cfg: &OrderCfg| -> f64 {
            comp.nodes.iter().map(|&n| node_score(g, cfg, &self.pens, n)).sum()
        };

        let mut idx = vec![0usize; edge_perms.len()];
        let mut best_idx = idx.clone();
        let mut best_score = f64::INFINITY;
        loop {
            for (slot, &(e, ref perms)) in edge_perms.iter().enumerate() {
                cfg.insert(e, perms[idx[slot]].clone());
            }
            let score = comp_score(g, cfg);
            if score < best_score {
                best_score = score;
                best_idx = idx.clone();
            }
            // Odometer increment.
            let mut slot = 0;
            loop {
                if slot == idx.len() {
                    // Wrapped all the way: restore the winner and stop.
                    for (s, &(e, ref perms)) in edge_perms.iter().enumerate() {
                        cfg.insert(e, perms[best_idx[s]].clone());
                    }
                    return;
                }
                idx[slot] += 1;
                if idx[slot] < edge_perms[slot].1.len() {
                    break;
                }
                idx[slot] = 0;
                slot += 1;
            }
        }
    }

    // ── ILP strategy ──────────────────────────────────────────────────────

    fn ilp(&self, g: &TransitGraph, cfg: &mut OrderCfg, comp: &Component, report: &mut OptReport) {
        report.ilp_components += 1;
        let Some(solver) = self.solvers.acquire(self.solver_wish.as_deref()) else {
            log::warn!("no ILP solver available, keeping input ordering for component");
            report.ilp_fallbacks += 1;
            return;
        };

        let (prog, maps) = build_program(g, cfg, comp, &self.pens);
        log::debug!(
            "solving {} with {}: {} vars, {} constraints",
            prog.name,
            solver.name(),
            prog.vars.len(),
            prog.cons.len()
        );

        match solve_cached(&*solver, &prog, self.time_limit, self.cache_dir.as_deref()) {
            Ok(sol) => match decode_solution(comp, &maps, &sol.values) {
                Some(orderings) => {
                    for (e, order) in orderings {
                        cfg.insert(e, order);
                    }
                }
                None => {
                    log::warn!("ILP solution did not decode to valid orderings, keeping input");
                    report.ilp_fallbacks += 1;
                }
            },
            Err(e) => {
                log::warn!("ILP solve failed ({e}), keeping input ordering");
                report.ilp_fallbacks += 1;
            }
        }
    }
}

fn permutations(mut items: Vec<LineId>) -> Vec<Vec<LineId>> {
    items.sort_unstable();
    let mut out = Vec::new();
    permute(&mut items, 0, &mut out);
    out
}

fn permute(items: &mut Vec<LineId>, k: usize, out: &mut Vec<Vec<LineId>>) {
    if k == items.len() {
        out.push(items.clone());
        return;
    }
    // Deterministic order starting from the identity: rotate each remaining
    // candidate into slot k.
    let tail: Vec<LineId> = items[k..].to_vec();
    for (i, _) in tail.iter().enumerate() {
        items[k..].rotate_left(i);
        permute(items, k + 1, out);
        items[k..].rotate_right(i);
    }
}

// ── ILP program construction ──────────────────────────────────────────────────

/// Variable lookup tables for one component's program.
pub struct VarMaps {
    /// `(edge, line index within the edge's list, position) → column`.
    pub x: FxHashMap<(TransitEdgeId, usize, usize), usize>,
    /// `(edge, a, b)` with `a < b` → "a before b" column.
    pub before: FxHashMap<(TransitEdgeId, LineId, LineId), usize>,
    /// `(edge, a, b)` → adjacency column; `None` = constantly adjacent (two
    /// lines).
    pub adj: FxHashMap<(TransitEdgeId, LineId, LineId), Option<usize>>,
    /// Line lists per edge, fixing the index space of `x`.
    pub lines: FxHashMap<TransitEdgeId, Vec<LineId>>,
}

/// Build the 0/1 program of one component: assignment variables and
/// constraints, pair variables, and penalized crossing/separation variables.
pub fn build_program(
    g: &TransitGraph,
    cfg: &OrderCfg,
    comp: &Component,
    pens: &OrderPenalties,
) -> (IlpProgram, VarMaps) {
    let mut prog = IlpProgram::new(format!("lineorder_c{}", comp.nodes[0].0));
    let mut maps = VarMaps {
        x: FxHashMap::default(),
        before: FxHashMap::default(),
        adj: FxHashMap::default(),
        lines: FxHashMap::default(),
    };

    // Assignment variables and constraints.
    for &e in &comp.edges {
        let lines = cfg[&e].clone();
        let k = lines.len();
        for (li, l) in lines.iter().enumerate() {
            for p in 0..k {
                let v = prog.add_var(format!("x_e{}_l{}_p{p}", e.0, l.0), 0.0, VarKind::Binary);
                maps.x.insert((e, li, p), v);
            }
        }
        // Every line gets exactly one position.
        for li in 0..k {
            let terms = (0..k).map(|p| (maps.x[&(e, li, p)], 1.0)).collect();
            prog.add_constraint(terms, 1.0, 1.0);
        }
        // Every position holds exactly one line.
        for p in 0..k {
            let terms = (0..k).map(|li| (maps.x[&(e, li, p)], 1.0)).collect();
            prog.add_constraint(terms, 1.0, 1.0);
        }
        maps.lines.insert(e, lines);
    }

    // Crossing and separation candidates.
    let mut cross_id = 0usize;
    for &n in &comp.nodes {
        let cands = node_cands(g, n);

        for c in &cands.same_seg {
            let va = before_var(&mut prog, &mut maps, c.ea, c.a, c.b);
            let vb = before_var(&mut prog, &mut maps, c.eb, c.a, c.b);
            let cross = prog.add_var(format!("xs{cross_id}"), pens.same_seg, VarKind::Binary);
            cross_id += 1;
            // left(e) = flip ? 1 - before : before; cross ≥ |left_a − left_b|.
            let (ca, sa) = affine(c.flip_a);
            let (cb, sb) = affine(c.flip_b);
            prog.add_constraint(
                vec![(cross, 1.0), (va, -sa), (vb, sb)],
                ca - cb,
                f64::INFINITY,
            );
            prog.add_constraint(
                vec![(cross, 1.0), (vb, -sb), (va, sa)],
                cb - ca,
                f64::INFINITY,
            );
        }

        for c in &cands.diff_seg {
            let va = before_var(&mut prog, &mut maps, c.ea, c.a, c.b);
            let cross = prog.add_var(format!("xd{cross_id}"), pens.diff_seg, VarKind::Binary);
            cross_id += 1;
            // Crossing iff (before ^ flip_a) != eb_left.
            if c.flip_a ^ c.eb_left {
                // Crossing when before = 0: cross ≥ 1 − before.
                prog.add_constraint(vec![(cross, 1.0), (va, 1.0)], 1.0, f64::INFINITY);
            } else {
                // Crossing when before = 1: cross ≥ before.
                prog.add_constraint(vec![(cross, 1.0), (va, -1.0)], 0.0, f64::INFINITY);
            }
        }

        for c in &cands.sep {
            let adj_a = adjacency_var(&mut prog, &mut maps, c.ea, c.a, c.b);
            let adj_b = adjacency_var(&mut prog, &mut maps, c.eb, c.a, c.b);
            // sep ≥ |adj_a − adj_b|; constant adjacency folds into the bound.
            match (adj_a, adj_b) {
                // Both constantly adjacent: never separated.
                (None, None) => {}
                (None, Some(v)) | (Some(v), None) => {
                    let sep = prog.add_var(format!("sp{cross_id}"), pens.split, VarKind::Binary);
                    cross_id += 1;
                    prog.add_constraint(vec![(sep, 1.0), (v, 1.0)], 1.0, f64::INFINITY);
                }
                (Some(va), Some(vb)) => {
                    let sep = prog.add_var(format!("sp{cross_id}"), pens.split, VarKind::Binary);
                    cross_id += 1;
                    prog.add_constraint(
                        vec![(sep, 1.0), (va, -1.0), (vb, 1.0)],
                        0.0,
                        f64::INFINITY,
                    );
                    prog.add_constraint(
                        vec![(sep, 1.0), (vb, -1.0), (va, 1.0)],
                        0.0,
                        f64::INFINITY,
                    );
                }
            }
        }
    }

    (prog, maps)
}

/// `left = flip ? 1 − before : before` as `(constant, sign)`.
fn affine(flip: bool) -> (f64, f64) {
    if flip {
        (1.0, -1.0)
    } else {
        (0.0, 1.0)
    }
}

fn line_index(maps: &VarMaps, e: TransitEdgeId, l: LineId) -> usize {
    maps.lines[&e].iter().position(|&x| x == l).expect("line not on edge")
}

/// Get-or-create the "a before b" variable of an edge, with its big-M links
/// to the position sums.
fn before_var(
    prog: &mut IlpProgram,
    maps: &mut VarMaps,
    e: TransitEdgeId,
    a: LineId,
    b: LineId,
) -> usize {
    debug_assert!(a < b);
    if let Some(&v) = maps.before.get(&(e, a, b)) {
        return v;
    }
    let k = maps.lines[&e].len();
    let m = k as f64;
    let v = prog.add_var(format!("b_e{}_{}_{}", e.0, a.0, b.0), 0.0, VarKind::Binary);
    let (ia, ib) = (line_index(maps, e, a), line_index(maps, e, b));

    // v = 1 ⇒ pos(b) − pos(a) ≥ 1;  v = 0 ⇒ pos(a) − pos(b) ≥ 1.
    let mut c1 = vec![(v, -m)];
    let mut c2 = vec![(v, m)];
    for p in 0..k {
        let (xa, xb) = (maps.x[&(e, ia, p)], maps.x[&(e, ib, p)]);
        c1.push((xb, p as f64));
        c1.push((xa, -(p as f64)));
        c2.push((xa, p as f64));
        c2.push((xb, -(p as f64)));
    }
    prog.add_constraint(c1, 1.0 - m, f64::INFINITY);
    prog.add_constraint(c2, 1.0, f64::INFINITY);

    maps.before.insert((e, a, b), v);
    v
}

/// Get-or-create the adjacency indicator of a pair on an edge.  Returns
/// `None` when the edge has only two lines (always adjacent).
fn adjacency_var(
    prog: &mut IlpProgram,
    maps: &mut VarMaps,
    e: TransitEdgeId,
    a: LineId,
    b: LineId,
) -> Option<usize> {
    if let Some(&v) = maps.adj.get(&(e, a, b)) {
        return v;
    }
    let k = maps.lines[&e].len();
    if k <= 2 {
        maps.adj.insert((e, a, b), None);
        return None;
    }
    let before = before_var(prog, maps, e, a, b);
    let (ia, ib) = (line_index(maps, e, a), line_index(maps, e, b));
    let span = 2.0 * (k as f64 - 1.0);

    let dist = prog.add_var(
        format!("d_e{}_{}_{}", e.0, a.0, b.0),
        0.0,
        VarKind::Continuous { lo: 1.0, hi: k as f64 - 1.0 },
    );
    // dist ≥ |pos(a) − pos(b)| …
    let mut lo1 = vec![(dist, 1.0)];
    let mut lo2 = vec![(dist, 1.0)];
    // … and dist ≤ |pos(a) − pos(b)|, the tight side selected by `before`:
    // before = 1 ⇒ dist ≤ pos(b) − pos(a); before = 0 ⇒ dist ≤ pos(a) − pos(b).
    let mut hi1 = vec![(dist, -1.0), (before, -span)];
    let mut hi2 = vec![(dist, -1.0), (before, span)];
    for p in 0..k {
        let (xa, xb) = (maps.x[&(e, ia, p)], maps.x[&(e, ib, p)]);
        lo1.push((xa, -(p as f64)));
        lo1.push((xb, p as f64));
        lo2.push((xb, -(p as f64)));
        lo2.push((xa, p as f64));
        hi1.push((xb, p as f64));
        hi1.push((xa, -(p as f64)));
        hi2.push((xa, p as f64));
        hi2.push((xb, -(p as f64)));
    }
    prog.add_constraint(lo1, 0.0, f64::INFINITY);
    prog.add_constraint(lo2, 0.0, f64::INFINITY);
    prog.add_constraint(hi1, -span, f64::INFINITY);
    prog.add_constraint(hi2, 0.0, f64::INFINITY);

    let adj = prog.add_var(format!("a_e{}_{}_{}", e.0, a.0, b.0), 0.0, VarKind::Binary);
    // adj + dist ≥ 2 forces adj = 1 at dist 1.
    prog.add_constraint(vec![(adj, 1.0), (dist, 1.0)], 2.0, f64::INFINITY);
    // (k−1)·adj + dist ≤ k forces adj = 0 at dist ≥ 2.
    prog.add_constraint(
        vec![(adj, k as f64 - 1.0), (dist, 1.0)],
        f64::NEG_INFINITY,
        k as f64,
    );

    maps.adj.insert((e, a, b), Some(adj));
    Some(adj)
}

/// Read the orderings back out of a solved column vector.
fn decode_solution(
    comp: &Component,
    maps: &VarMaps,
    values: &[f64],
) -> Option<Vec<(TransitEdgeId, Vec<LineId>)>> {
    let mut out = Vec::new();
    for &e in &comp.edges {
        let lines = &maps.lines[&e];
        let k = lines.len();
        let mut order: Vec<Option<LineId>> = vec![None; k];
        for (li, &l) in lines.iter().enumerate() {
            let p = (0..k).find(|&p| values[maps.x[&(e, li, p)]] > 0.5)?;
            if order[p].is_some() {
                return None; // two lines on one position
            }
            order[p] = Some(l);
        }
        out.push((e, order.into_iter().collect::<Option<Vec<_>>>()?));
    }
    Some(out)
}
