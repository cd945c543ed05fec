//! 0/1 program construction and the solver capability interface.
//!
//! # Solver plurality
//!
//! No solver is linked unconditionally.  Backends implement [`IlpSolver`]
//! and register with a [`SolverRegistry`]; the registry hands out the user's
//! wish first, then falls back through the conventional preference order
//! (gurobi → coin → glpk), then anything else registered.  An empty registry
//! makes the optimizer fall back to the input ordering (logged, reported).
//!
//! # Model
//!
//! One binary variable per `(edge, line, position)` triple with the standard
//! assignment constraints, one binary "a before b" variable per needed line
//! pair linked to the position sums big-M style, and one penalized binary
//! per potential crossing/separation.
//!
//! # Cache
//!
//! Solved column vectors may be cached on disk keyed by a 64-bit FNV-1a hash
//! of the canonical program rendering; identical programs (same component,
//! same penalties) skip the solver on re-runs.

use std::path::Path;
use std::time::Duration;

use crate::error::OrderResult;

// ── Program model ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum VarKind {
    Binary,
    Continuous { lo: f64, hi: f64 },
}

#[derive(Clone, Debug)]
pub struct IlpVar {
    pub name: String,
    /// Objective coefficient (the program minimizes).
    pub obj: f64,
    pub kind: VarKind,
}

/// `lo ≤ Σ coeff·var ≤ hi`; use ±∞ for one-sided rows.
#[derive(Clone, Debug)]
pub struct IlpCons {
    pub terms: Vec<(usize, f64)>,
    pub lo: f64,
    pub hi: f64,
}

/// A minimization program over binary/bounded variables.
#[derive(Clone, Debug, Default)]
pub struct IlpProgram {
    pub name: String,
    pub vars: Vec<IlpVar>,
    pub cons: Vec<IlpCons>,
}

impl IlpProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn add_var(&mut self, name: impl Into<String>, obj: f64, kind: VarKind) -> usize {
        self.vars.push(IlpVar { name: name.into(), obj, kind });
        self.vars.len() - 1
    }

    /// `lo ≤ Σ terms ≤ hi`.
    pub fn add_constraint(&mut self, terms: Vec<(usize, f64)>, lo: f64, hi: f64) {
        self.cons.push(IlpCons { terms, lo, hi });
    }

    /// Objective value of a column vector.
    pub fn objective(&self, values: &[f64]) -> f64 {
        self.vars.iter().zip(values).map(|(v, x)| v.obj * x).sum()
    }

    /// `true` if the column vector satisfies every row.
    pub fn feasible(&self, values: &[f64]) -> bool {
        self.cons.iter().all(|c| {
            let sum: f64 = c.terms.iter().map(|&(i, coeff)| coeff * values[i]).sum();
            sum >= c.lo - 1e-6 && sum <= c.hi + 1e-6
        })
    }

    /// Deterministic textual rendering; the cache key hashes this.
    pub fn canonical(&self) -> String {
        use std::fmt::Write;
        let mut s = String::new();
        let _ = writeln!(s, "min {}", self.name);
        for v in &self.vars {
            let _ = writeln!(s, "v {} {} {:?}", v.name, v.obj, v.kind);
        }
        for c in &self.cons {
            let _ = write!(s, "c {} <= ", c.lo);
            for (i, coeff) in &c.terms {
                let _ = write!(s, "{coeff}*{i} ");
            }
            let _ = writeln!(s, "<= {}", c.hi);
        }
        s
    }
}

// ── Solution ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IlpSolution {
    /// One value per variable, in program order.
    pub values: Vec<f64>,
    pub objective: f64,
    /// `false` when a time limit stopped the solver at a feasible incumbent.
    pub optimal: bool,
}

// ── Solver interface ──────────────────────────────────────────────────────────

/// Capability interface an ILP backend must provide.
pub trait IlpSolver {
    fn name(&self) -> &str;

    /// Solve `prog` to optimality, or to the best feasible incumbent within
    /// `time_limit`.
    fn solve(&self, prog: &IlpProgram, time_limit: Option<Duration>) -> OrderResult<IlpSolution>;
}

type SolverFactory = Box<dyn Fn() -> Box<dyn IlpSolver>>;

/// Registered solver backends, consulted wish-first.
#[derive(Default)]
pub struct SolverRegistry {
    factories: Vec<(String, SolverFactory)>,
}

/// Conventional fallback order when the wish is absent or unavailable.
const PREFERENCE: [&str; 3] = ["gurobi", "coin", "glpk"];

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn IlpSolver> + 'static,
    ) {
        self.factories.push((name.into(), Box::new(factory)));
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// First try the wish, then the preference chain, then anything left.
    pub fn acquire(&self, wish: Option<&str>) -> Option<Box<dyn IlpSolver>> {
        if let Some(wish) = wish {
            if let Some((_, f)) = self.factories.iter().find(|(n, _)| n == wish) {
                return Some(f());
            }
            log::warn!("requested ILP solver '{wish}' is not available, falling back");
        }
        for pref in PREFERENCE {
            if let Some((_, f)) = self.factories.iter().find(|(n, _)| n == pref) {
                return Some(f());
            }
        }
        self.factories.first().map(|(_, f)| f())
    }
}

// ── Solution cache ────────────────────────────────────────────────────────────

/// 64-bit FNV-1a over the canonical program rendering.
pub fn program_key(prog: &IlpProgram) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in prog.canonical().bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

pub fn cache_lookup(dir: &Path, key: u64) -> OrderResult<Option<IlpSolution>> {
    let path = dir.join(format!("{key:016x}.json"));
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn cache_store(dir: &Path, key: u64, sol: &IlpSolution) -> OrderResult<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{key:016x}.json"));
    std::fs::write(path, serde_json::to_string(sol)?)?;
    Ok(())
}

/// Solve with cache consultation on both sides.
pub fn solve_cached(
    solver: &dyn IlpSolver,
    prog: &IlpProgram,
    time_limit: Option<Duration>,
    cache_dir: Option<&Path>,
) -> OrderResult<IlpSolution> {
    let key = cache_dir.map(|d| (d, program_key(prog)));
    if let Some((dir, k)) = key {
        match cache_lookup(dir, k) {
            Ok(Some(sol)) => {
                log::debug!("ILP cache hit for {}", prog.name);
                return Ok(sol);
            }
            Ok(None) => {}
            Err(e) => log::warn!("ILP cache read failed: {e}"),
        }
    }
    let sol = solver.solve(prog, time_limit)?;
    if let Some((dir, k)) = key {
        if let Err(e) = cache_store(dir, k, &sol) {
            log::warn!("ILP cache write failed: {e}");
        }
    }
    Ok(sol)
}
