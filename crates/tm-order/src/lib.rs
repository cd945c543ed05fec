//! `tm-order` — the line-order optimizer.
//!
//! Given a drawn transit graph, assign each edge a permutation of its lines
//! minimizing `same_seg_crossings · P_same + diff_seg_crossings · P_diff +
//! separations · P_split` over all nodes.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`scorer`]    | `OrderCfg`, candidate enumeration, crossing counting   |
//! | [`optimizer`] | `LineOrderOptimizer`, strategy dispatch per component  |
//! | [`ilp`]       | `IlpProgram`, `IlpSolver` capability, solution cache   |
//! | [`error`]     | `OrderError`, `OrderResult<T>`                         |
//!
//! No ILP solver is linked unconditionally: backends register with the
//! [`SolverRegistry`]; with none available the optimizer reports a fallback
//! and keeps the input ordering.

pub mod error;
pub mod ilp;
pub mod optimizer;
pub mod scorer;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{OrderError, OrderResult};
pub use ilp::{IlpProgram, IlpSolution, IlpSolver, SolverRegistry, VarKind};
pub use optimizer::{LineOrderOptimizer, OptMode, OptReport};
pub use scorer::{graph_score, initial_cfg, OrderCfg, OrderPenalties};
