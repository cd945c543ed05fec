//! `tm-output` — GeoJSON reading and writing of transit graphs.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`geojson`] | Feature-collection writer and reader                      |
//! | [`error`]   | `OutputError`, `OutputResult<T>`                          |
//!
//! The reader doubles as the geometry-validation boundary: NaN coordinates
//! and zero-length courses are rejected here so the layout core can assume
//! well-formed input.

pub mod error;
pub mod geojson;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{OutputError, OutputResult};
pub use self::geojson::{
    from_feature_collection, read_geojson, to_feature_collection, write_geojson,
};
