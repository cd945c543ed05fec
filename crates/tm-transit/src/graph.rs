//! Geographic transit graph.
//!
//! # Data layout
//!
//! The graph is an arena: nodes and edges live in `Vec`s and reference each
//! other through typed indices ([`TransitNodeId`], [`TransitEdgeId`]).
//! Removal tombstones the slot (`alive = false`) instead of shifting indices,
//! so IDs handed out earlier stay valid for the lifetime of the graph.
//!
//! The graph is a multigraph: parallel edges between the same node pair are
//! legal (distinct line bundles along distinct courses).

use rustc_hash::FxHashSet;

use tm_core::{BBox, LineId, Point, PolyLine, TransitEdgeId, TransitNodeId};

use crate::line::{Line, LineOcc, Station};

// ── Node / edge payloads ──────────────────────────────────────────────────────

/// A transit node: a stop (≥ 1 stations) or a topological joint (0 stations).
#[derive(Clone, Debug)]
pub struct TransitNode {
    pub pos: Point,
    pub stations: Vec<Station>,
    /// Incident edges, in insertion order.
    pub adj: Vec<TransitEdgeId>,
    pub(crate) alive: bool,
}

/// A transit edge carrying one or more lines along a polyline course.
#[derive(Clone, Debug)]
pub struct TransitEdge {
    pub from: TransitNodeId,
    pub to: TransitNodeId,
    /// Course oriented from `from` to `to`.
    pub polyline: PolyLine,
    pub lines: Vec<LineOcc>,
    /// Routing order stamp, set on output edges by the octilinearizer.
    pub generation: Option<u32>,
    pub(crate) alive: bool,
}

impl TransitEdge {
    /// Distinct lines on this edge, in first-occurrence order.
    pub fn distinct_lines(&self) -> Vec<LineId> {
        let mut seen = FxHashSet::default();
        self.lines
            .iter()
            .map(|o| o.line)
            .filter(|l| seen.insert(*l))
            .collect()
    }
}

// ── TransitGraph ──────────────────────────────────────────────────────────────

/// Arena-allocated geographic transit graph plus its line registry.
#[derive(Clone, Debug, Default)]
pub struct TransitGraph {
    nodes: Vec<TransitNode>,
    edges: Vec<TransitEdge>,
    lines: Vec<Line>,
}

impl TransitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Construction ──────────────────────────────────────────────────────

    pub fn add_line(&mut self, line: Line) -> LineId {
        let id = LineId(self.lines.len() as u32);
        self.lines.push(line);
        id
    }

    pub fn add_node(&mut self, pos: Point) -> TransitNodeId {
        let id = TransitNodeId(self.nodes.len() as u32);
        self.nodes.push(TransitNode {
            pos,
            stations: Vec::new(),
            adj: Vec::new(),
            alive: true,
        });
        id
    }

    pub fn add_station(&mut self, node: TransitNodeId, station: Station) {
        self.nodes[node.index()].stations.push(station);
    }

    pub fn add_edge(
        &mut self,
        from: TransitNodeId,
        to: TransitNodeId,
        polyline: PolyLine,
        lines: Vec<LineOcc>,
    ) -> TransitEdgeId {
        let id = TransitEdgeId(self.edges.len() as u32);
        self.edges.push(TransitEdge {
            from,
            to,
            polyline,
            lines,
            generation: None,
            alive: true,
        });
        self.nodes[from.index()].adj.push(id);
        self.nodes[to.index()].adj.push(id);
        id
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn node(&self, id: TransitNodeId) -> &TransitNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: TransitNodeId) -> &mut TransitNode {
        &mut self.nodes[id.index()]
    }

    pub fn edge(&self, id: TransitEdgeId) -> &TransitEdge {
        &self.edges[id.index()]
    }

    pub fn edge_mut(&mut self, id: TransitEdgeId) -> &mut TransitEdge {
        &mut self.edges[id.index()]
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Live node IDs in ascending index order (deterministic iteration).
    pub fn node_ids(&self) -> impl Iterator<Item = TransitNodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| TransitNodeId(i as u32))
    }

    /// Live edge IDs in ascending index order.
    pub fn edge_ids(&self) -> impl Iterator<Item = TransitEdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive)
            .map(|(i, _)| TransitEdgeId(i as u32))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.alive).count()
    }

    pub fn degree(&self, n: TransitNodeId) -> usize {
        self.nodes[n.index()].adj.len()
    }

    /// The endpoint of `e` that is not `n`.
    ///
    /// # Panics
    /// Panics in debug mode if `n` is not an endpoint of `e`.
    pub fn other_node(&self, e: TransitEdgeId, n: TransitNodeId) -> TransitNodeId {
        let edge = &self.edges[e.index()];
        debug_assert!(edge.from == n || edge.to == n);
        if edge.from == n {
            edge.to
        } else {
            edge.from
        }
    }

    /// Bounding box over all live node positions and edge courses.
    pub fn bbox(&self) -> BBox {
        let mut b = BBox::empty();
        for id in self.node_ids() {
            b.extend(self.node(id).pos);
        }
        for id in self.edge_ids() {
            for &p in self.edge(id).polyline.points() {
                b.extend(p);
            }
        }
        b
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Remove `e` from the graph and both adjacency lists.
    pub fn remove_edge(&mut self, e: TransitEdgeId) {
        let (from, to) = {
            let edge = &self.edges[e.index()];
            (edge.from, edge.to)
        };
        self.nodes[from.index()].adj.retain(|&x| x != e);
        self.nodes[to.index()].adj.retain(|&x| x != e);
        self.edges[e.index()].alive = false;
    }

    /// Merge `dead` into `survivor`: every edge incident to `dead` is
    /// re-anchored at `survivor`, edges connecting the two are dropped, and
    /// `dead`'s stations move over.  `survivor` keeps its position; callers
    /// adjust it afterwards if needed.
    pub fn merge_nodes(&mut self, dead: TransitNodeId, survivor: TransitNodeId) {
        debug_assert!(dead != survivor);

        let incident: Vec<TransitEdgeId> = self.nodes[dead.index()].adj.clone();
        for e in incident {
            let (from, to) = {
                let edge = &self.edges[e.index()];
                (edge.from, edge.to)
            };
            if (from == dead && to == survivor) || (to == dead && from == survivor) {
                self.remove_edge(e);
                continue;
            }
            {
                let edge = &mut self.edges[e.index()];
                if edge.from == dead {
                    edge.from = survivor;
                } else {
                    edge.to = survivor;
                }
                // Re-anchor any directional line occurrences pointing at the
                // dead node.
                for occ in &mut edge.lines {
                    if occ.direction == Some(dead) {
                        occ.direction = Some(survivor);
                    }
                }
            }
            self.nodes[survivor.index()].adj.push(e);
        }

        let stations = std::mem::take(&mut self.nodes[dead.index()].stations);
        self.nodes[survivor.index()].stations.extend(stations);
        self.nodes[dead.index()].adj.clear();
        self.nodes[dead.index()].alive = false;
    }

    /// Rotate the whole graph around `center` by `deg` degrees.
    pub fn rotate(&mut self, center: Point, deg: f64) {
        for n in self.nodes.iter_mut().filter(|n| n.alive) {
            n.pos = n.pos.rotate_around(center, deg);
            for s in &mut n.stations {
                s.pos = s.pos.rotate_around(center, deg);
            }
        }
        for e in self.edges.iter_mut().filter(|e| e.alive) {
            e.polyline.rotate_around(center, deg);
        }
    }

    // ── Short-edge collapse ───────────────────────────────────────────────

    /// Collapse every edge shorter than `min_len` whose endpoints both have
    /// degree ≥ 2 and of which at least one side is a non-station joint.
    ///
    /// The survivor is the station side when only one side has stations; the
    /// merged node moves to the midpoint of the two originals.  Runs until
    /// no edge qualifies; terminates because every merge strictly reduces
    /// the node count.  Returns the number of merges performed.
    pub fn collapse_short_edges(&mut self, min_len: f64) -> usize {
        let mut merges = 0;
        let mut changed = true;
        while changed {
            changed = false;
            let candidates: Vec<TransitEdgeId> = self.edge_ids().collect();
            for e in candidates {
                if !self.edges[e.index()].alive {
                    continue;
                }
                let (from, to) = {
                    let edge = &self.edges[e.index()];
                    (edge.from, edge.to)
                };
                if self.edges[e.index()].polyline.len() >= min_len {
                    continue;
                }
                if self.degree(from) < 2 || self.degree(to) < 2 {
                    continue;
                }
                let from_is_stop = !self.node(from).stations.is_empty();
                let to_is_stop = !self.node(to).stations.is_empty();
                if from_is_stop && to_is_stop {
                    continue;
                }

                let (dead, survivor) = if to_is_stop { (from, to) } else { (to, from) };
                let mid = self.node(from).pos.mid(self.node(to).pos);
                self.merge_nodes(dead, survivor);
                self.node_mut(survivor).pos = mid;

                merges += 1;
                changed = true;
                break;
            }
        }
        if merges > 0 {
            log::debug!("collapsed {merges} short edges");
        }
        merges
    }
}
