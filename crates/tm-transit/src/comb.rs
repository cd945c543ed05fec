//! Combination graph: the transit graph with degree-2 chains collapsed.
//!
//! The combination graph is the unit of routing.  Every combination edge
//! wraps an ordered list of underlying transit edges (its *children*); every
//! combination node wraps exactly one transit node and carries the angular
//! ordering of its incident combination edges, which fixes the cyclic edge
//! order used throughout layout.
//!
//! The graph borrows nothing: it references the transit graph through typed
//! indices and takes `&TransitGraph` wherever it needs geometry.

use rustc_hash::FxHashSet;

use tm_core::{CombEdgeId, CombNodeId, LineId, Point, PolyLine, TransitEdgeId, TransitNodeId};

use crate::graph::TransitGraph;

// ── Payloads ──────────────────────────────────────────────────────────────────

/// A combination node wrapping one transit node.
#[derive(Clone, Debug)]
pub struct CombNode {
    pub transit: TransitNodeId,
    /// Sum of distinct-line counts over incident edges; deterministic
    /// tie-break for the routing order.
    pub route_number: usize,
    pub adj: Vec<CombEdgeId>,
    /// Incident edges sorted by the angle of their nearest child at this
    /// node.  Canonical iteration order for routing.
    pub ordered_edges: Vec<CombEdgeId>,
    pub(crate) alive: bool,
}

/// A combination edge wrapping a chain of transit edges.
#[derive(Clone, Debug)]
pub struct CombEdge {
    pub from: CombNodeId,
    pub to: CombNodeId,
    /// Child transit edges in order from `from` to `to`.  The children keep
    /// their own orientation; traversal order is given by the sequence.
    pub children: Vec<TransitEdgeId>,
    /// Current course.  Before routing: the child course (single child) or
    /// the straight `from`→`to` segment (contracted chain).  After routing:
    /// the octilinear course.
    pub polyline: PolyLine,
    /// Set when the octilinearizer routes this edge; `None` = unrouted.
    pub generation: Option<u32>,
    pub(crate) alive: bool,
}

// ── CombGraph ─────────────────────────────────────────────────────────────────

/// Arena-allocated combination graph.
#[derive(Clone, Debug, Default)]
pub struct CombGraph {
    nodes: Vec<CombNode>,
    edges: Vec<CombEdge>,
}

impl CombGraph {
    /// Build the combination graph of `tg`: copy nodes and edges, contract
    /// degree-2 non-station joints, and compute route numbers and angular
    /// edge orderings.
    pub fn build(tg: &TransitGraph) -> Self {
        let mut g = CombGraph::default();

        // Transit node index → comb node id.  Dense map: transit arenas are
        // tombstoned, never compacted.
        let mut of_transit: Vec<CombNodeId> = Vec::new();
        for tn in tg.node_ids() {
            if of_transit.len() <= tn.index() {
                of_transit.resize(tn.index() + 1, CombNodeId::INVALID);
            }
            let id = CombNodeId(g.nodes.len() as u32);
            g.nodes.push(CombNode {
                transit: tn,
                route_number: 0,
                adj: Vec::new(),
                ordered_edges: Vec::new(),
                alive: true,
            });
            of_transit[tn.index()] = id;
        }

        for te in tg.edge_ids() {
            let edge = tg.edge(te);
            let from = of_transit[edge.from.index()];
            let to = of_transit[edge.to.index()];
            g.add_edge(from, to, vec![te], edge.polyline.clone());
        }

        g.compute_route_numbers(tg);
        g.contract_deg2(tg);
        g.write_edge_ordering(tg);
        g
    }

    fn add_edge(
        &mut self,
        from: CombNodeId,
        to: CombNodeId,
        children: Vec<TransitEdgeId>,
        polyline: PolyLine,
    ) -> CombEdgeId {
        let id = CombEdgeId(self.edges.len() as u32);
        self.edges.push(CombEdge {
            from,
            to,
            children,
            polyline,
            generation: None,
            alive: true,
        });
        self.nodes[from.index()].adj.push(id);
        self.nodes[to.index()].adj.push(id);
        id
    }

    fn remove_edge(&mut self, e: CombEdgeId) {
        let (from, to) = {
            let edge = &self.edges[e.index()];
            (edge.from, edge.to)
        };
        self.nodes[from.index()].adj.retain(|&x| x != e);
        self.nodes[to.index()].adj.retain(|&x| x != e);
        self.edges[e.index()].alive = false;
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn node(&self, id: CombNodeId) -> &CombNode {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, id: CombEdgeId) -> &CombEdge {
        &self.edges[id.index()]
    }

    pub fn edge_mut(&mut self, id: CombEdgeId) -> &mut CombEdge {
        &mut self.edges[id.index()]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = CombNodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| CombNodeId(i as u32))
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = CombEdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive)
            .map(|(i, _)| CombEdgeId(i as u32))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.alive).count()
    }

    pub fn degree(&self, n: CombNodeId) -> usize {
        self.nodes[n.index()].adj.len()
    }

    pub fn other_node(&self, e: CombEdgeId, n: CombNodeId) -> CombNodeId {
        let edge = &self.edges[e.index()];
        debug_assert!(edge.from == n || edge.to == n);
        if edge.from == n {
            edge.to
        } else {
            edge.from
        }
    }

    /// Geographic position of a combination node (its transit node's).
    pub fn pos(&self, tg: &TransitGraph, n: CombNodeId) -> Point {
        tg.node(self.nodes[n.index()].transit).pos
    }

    // ── Construction passes ───────────────────────────────────────────────

    /// Route number of a node: sum over incident edges of the distinct-line
    /// count of the edge's first child.
    fn compute_route_numbers(&mut self, tg: &TransitGraph) {
        let ids: Vec<CombNodeId> = self.node_ids().collect();
        for n in ids {
            let routes: usize = self.nodes[n.index()]
                .adj
                .iter()
                .map(|&e| {
                    let child = self.edges[e.index()].children[0];
                    tg.edge(child).distinct_lines().len()
                })
                .sum();
            self.nodes[n.index()].route_number = routes;
        }
    }

    /// Contract every degree-2 combination node that is not a station: its
    /// two incident edges are concatenated into one whose child list is the
    /// sequenced union, flipping the second list when the shared endpoint
    /// sits on its `to` side.
    fn contract_deg2(&mut self, tg: &TransitGraph) {
        let mut changed = true;
        while changed {
            changed = false;
            let ids: Vec<CombNodeId> = self.node_ids().collect();
            for n in ids {
                if !self.nodes[n.index()].alive || self.degree(n) != 2 {
                    continue;
                }
                if !tg.node(self.nodes[n.index()].transit).stations.is_empty() {
                    continue;
                }
                let a = self.nodes[n.index()].adj[0];
                let b = self.nodes[n.index()].adj[1];
                if a == b {
                    continue; // self loop
                }

                // `a` is the reference edge; keep its orientation.
                let (a_from, a_to) = (self.edges[a.index()].from, self.edges[a.index()].to);
                let (b_from, b_to) = (self.edges[b.index()].from, self.edges[b.index()].to);
                let b_other = if b_from == n { b_to } else { b_from };

                let (new_from, new_to, children) = if a_to == n {
                    let mut children = self.edges[a.index()].children.clone();
                    if b_from == n {
                        children.extend(self.edges[b.index()].children.iter().copied());
                    } else {
                        children.extend(self.edges[b.index()].children.iter().rev().copied());
                    }
                    (a_from, b_other, children)
                } else {
                    let mut children: Vec<TransitEdgeId> = if b_to == n {
                        self.edges[b.index()].children.clone()
                    } else {
                        self.edges[b.index()].children.iter().rev().copied().collect()
                    };
                    children.extend(self.edges[a.index()].children.iter().copied());
                    (b_other, a_to, children)
                };

                if new_from == new_to {
                    continue; // contracting would create a self loop
                }

                let polyline = PolyLine::straight(
                    self.pos(tg, new_from),
                    self.pos(tg, new_to),
                );
                self.remove_edge(a);
                self.remove_edge(b);
                self.nodes[n.index()].alive = false;
                self.add_edge(new_from, new_to, children, polyline);
                changed = true;
            }
        }
    }

    /// Recompute the angular edge ordering of every node: incident edges
    /// sorted by the angle from the node's transit position to the far
    /// endpoint of the nearest child edge.
    pub fn write_edge_ordering(&mut self, tg: &TransitGraph) {
        let ids: Vec<CombNodeId> = self.node_ids().collect();
        for n in ids {
            let tn = self.nodes[n.index()].transit;
            let pos = tg.node(tn).pos;
            let mut angled: Vec<(f64, CombEdgeId)> = self.nodes[n.index()]
                .adj
                .iter()
                .map(|&e| {
                    let edge = &self.edges[e.index()];
                    let ref_child = if edge.from == n {
                        *edge.children.first().expect("edge without children")
                    } else {
                        *edge.children.last().expect("edge without children")
                    };
                    let far = tg.other_node(ref_child, tn);
                    (pos.angle_to(tg.node(far).pos), e)
                })
                .collect();
            angled.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            self.nodes[n.index()].ordered_edges = angled.into_iter().map(|(_, e)| e).collect();
        }
    }

    /// Re-derive pre-routing geometry from the transit graph (used after the
    /// transit graph was rotated) and refresh the edge orderings.
    pub fn refresh_geometry(&mut self, tg: &TransitGraph) {
        let ids: Vec<CombEdgeId> = self.edge_ids().collect();
        for e in ids {
            if self.edges[e.index()].generation.is_some() {
                continue;
            }
            let (from, to) = (self.edges[e.index()].from, self.edges[e.index()].to);
            let pl = if self.edges[e.index()].children.len() == 1 {
                let child = self.edges[e.index()].children[0];
                let child_edge = tg.edge(child);
                if child_edge.from == self.nodes[from.index()].transit {
                    child_edge.polyline.clone()
                } else {
                    child_edge.polyline.reversed()
                }
            } else {
                PolyLine::straight(self.pos(tg, from), self.pos(tg, to))
            };
            self.edges[e.index()].polyline = pl;
        }
        self.write_edge_ordering(tg);
    }

    /// All distinct lines across an edge's children (used for continuation
    /// matching in the cost model).
    pub fn line_set(&self, tg: &TransitGraph, e: CombEdgeId) -> FxHashSet<LineId> {
        let mut set = FxHashSet::default();
        for &child in &self.edges[e.index()].children {
            for occ in &tg.edge(child).lines {
                set.insert(occ.line);
            }
        }
        set
    }
}
