//! Octilinearizer error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OctiError {
    #[error("input graph is empty")]
    EmptyInput,
}

pub type OctiResult<T> = Result<T, OctiError>;
