//! `tm-grid` — the octilinear grid graph, cost model, and grid router.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`grid`]   | `GridGraph` (CSR + R-tree), open/close protocol, settling  |
//! | [`cost`]   | `Penalties`, `NodeCost`, reversible cost vectors           |
//! | [`router`] | `GridRouter` trait, `DijkstraRouter`, `AStarRouter`        |
//!
//! The grid is created per layout attempt by `tm-octi`, fully mutated during
//! routing, and dropped once the polylines are copied back.

pub mod cost;
pub mod grid;
pub mod router;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cost::{NodeCost, Penalties};
pub use grid::{Candidate, GridEdgeKind, GridGraph, GridKind, INF};
pub use router::{AStarRouter, DijkstraRouter, GridPath, GridRouter};
