//! Pluggable sparse linear-solver backends.
//!
//! Grounded on `basic/solver.rs`'s `Solve` trait and its three backend modules
//! (`rsparse`, `klu`, `faer`). That crate's `Solve::solve` takes raw `Ap`/`Ai`/`Ax` slices
//! and does the symbolic/numeric split implicitly inside each impl. Per the driver contract
//! (repeated `initialize` vs `solve(..., just_initialized)` calls, explicit `reset`), the
//! split is made explicit here as three trait methods so the NR driver controls exactly when
//! re-analysis happens instead of leaving it to a backend-internal `is_none()` check.

use crate::error::SolverState;
use crate::numeric::{CscMatrix, Real};

#[cfg(feature = "rsparse")]
mod generic;
#[cfg(feature = "rsparse")]
pub use generic::GenericLuSolver;

#[cfg(feature = "klu")]
mod klu;
#[cfg(feature = "klu")]
pub use klu::KluSolver;

#[cfg(feature = "faer")]
mod faer;
#[cfg(feature = "faer")]
pub use faer::FaerSolver;

#[cfg(feature = "nicslu")]
mod nicslu;
#[cfg(feature = "nicslu")]
pub use nicslu::NicsluSolver;

/// Capability exposed by every sparse LU backend: symbolic analysis + numeric
/// factorisation, followed by reuse-aware refactor/solve, and an explicit reset.
pub trait LinearSolver {
    /// Full symbolic analysis and numeric factorisation of `j`. Backend retains both.
    fn initialize(&mut self, j: &CscMatrix<Real>) -> SolverState;

    /// Solves `j · x = b`, `b` holding `x` on success. When `just_initialized` is `false`
    /// and the backend supports it, reuses the retained symbolic analysis and only
    /// refactors numerically; otherwise behaves like `initialize` followed by a solve.
    fn solve(&mut self, j: &CscMatrix<Real>, b: &mut [Real], just_initialized: bool)
        -> SolverState;

    /// Clears all retained symbolic/numeric state. The next `initialize` starts fresh.
    fn reset(&mut self);
}

#[cfg(feature = "klu")]
pub type DefaultSolver = KluSolver;

#[cfg(all(not(feature = "klu"), feature = "faer"))]
pub type DefaultSolver = FaerSolver;

#[cfg(all(not(feature = "klu"), not(feature = "faer"), feature = "rsparse"))]
pub type DefaultSolver = GenericLuSolver;
