//! `tm-core` — foundational types for the `transitmap` workspace.
//!
//! This crate is a dependency of every other `tm-*` crate.  It intentionally
//! has no `tm-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                            |
//! |--------------|-----------------------------------------------------|
//! | [`ids`]      | Typed arena indices for all graphs                  |
//! | [`geom`]     | `Point`, `BBox`, `Polygon`, rotations               |
//! | [`polyline`] | `PolyLine` with arc-length slicing                  |
//! | [`bezier`]   | `CubicBezier` take-off/touch-down smoothing         |
//! | [`dir`]      | `Dir` — the eight canonical octilinear directions   |
//! | [`error`]    | `CoreError`, `CoreResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.       |

pub mod bezier;
pub mod dir;
pub mod error;
pub mod geom;
pub mod ids;
pub mod polyline;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bezier::CubicBezier;
pub use dir::{angle_diff, Dir};
pub use error::{CoreError, CoreResult};
pub use geom::{segments_intersect, BBox, Point, Polygon};
pub use ids::{
    CombEdgeId, CombNodeId, GridEdgeId, GridNodeId, LineId, TransitEdgeId, TransitNodeId,
};
pub use polyline::PolyLine;
