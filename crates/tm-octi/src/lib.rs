//! `tm-octi` — the octilinearizer: routes the combination graph onto the
//! octilinear grid.
//!
//! # Crate layout
//!
//! | Module              | Contents                                          |
//! |---------------------|---------------------------------------------------|
//! | [`config`]          | `LayoutConfig`                                    |
//! | [`octilinearizer`]  | `Octilinearizer`, `Drawing`, `LayoutReport`       |
//! | [`error`]           | `OctiError`, `OctiResult<T>`                      |
//!
//! The pipeline is: collapse short edges → build the combination graph →
//! grid per rotation attempt → greedy generation-ordered routing → polyline
//! write-back → output transit graph.

pub mod config;
pub mod error;
pub mod octilinearizer;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::LayoutConfig;
pub use error::{OctiError, OctiResult};
pub use octilinearizer::{build_output_graph, Drawing, LayoutReport, Octilinearizer};
