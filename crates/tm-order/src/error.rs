//! Optimizer error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("no ILP solver available")]
    NoSolver,

    #[error("ILP solver failed: {0}")]
    SolverFailed(String),

    #[error("ILP program is infeasible")]
    Infeasible,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache decode error: {0}")]
    CacheDecode(#[from] serde_json::Error),
}

pub type OrderResult<T> = Result<T, OrderError>;
