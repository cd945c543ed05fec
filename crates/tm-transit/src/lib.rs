//! `tm-transit` — geographic transit graph and combination graph.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`line`]  | `Line`, `Station`, `LineOcc`                              |
//! | [`graph`] | `TransitGraph` (arena), short-edge collapse, rotation     |
//! | [`comb`]  | `CombGraph`: degree-2 contraction, angular edge ordering  |
//!
//! The transit graph is produced by an upstream loader (out of scope here);
//! this crate owns its preparation for layout and the combination-graph
//! abstraction routed by `tm-octi`.

pub mod comb;
pub mod graph;
pub mod line;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use comb::{CombEdge, CombGraph, CombNode};
pub use graph::{TransitEdge, TransitGraph, TransitNode};
pub use line::{Line, LineOcc, Station};
