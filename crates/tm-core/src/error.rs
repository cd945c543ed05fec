//! Workspace error base.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` via `From` impls or wrap it as one variant.  Both patterns
//! are acceptable; prefer whichever keeps error sites clean.

use thiserror::Error;

/// The base error type for `tm-core` geometry validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `tm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
