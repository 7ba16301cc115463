//! Error and solver-state taxonomy.
//!
//! Grounded on `original_source/BaseSolver.h`'s `ErrorType` enum (`NoError`, `SingularMatrix`,
//! `TooManyIterations`, `InfiniteValue`, `SolverAnalyze`, `SolverFactor`, `SolverReFactor`,
//! `SolverSolve`, `NotInitError`, `LicenseError`) and `NICSLUSolver`'s `#ifdef
//! NICSLU_SOLVER_AVAILABLE` licensing guard, which is why `LicenseError` is sticky: once a
//! backend reports it, every subsequent call returns the same state until [`SolverState::reset`]
//! is observed by the caller.

use thiserror::Error;

/// Outcome of a linear-solver call, returned by every [`crate::solver::LinearSolver`] method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverState {
    NoError,
    SingularMatrix,
    TooManyIterations,
    InfiniteValue,
    SolverAnalyze,
    SolverFactor,
    SolverReFactor,
    SolverSolve,
    NotInit,
    LicenseError,
}

impl SolverState {
    pub fn is_ok(self) -> bool {
        matches!(self, SolverState::NoError)
    }

    /// Once a backend reports `LicenseError` it must keep reporting it until `reset()`.
    pub fn is_sticky(self) -> bool {
        matches!(self, SolverState::LicenseError)
    }
}

/// Errors surfaced by the power-flow driver above the linear-solver layer.
#[derive(Debug, Error)]
pub enum PfError {
    #[error("linear solver reported {0:?}")]
    Linear(SolverState),

    #[error("jacobian is singular or structurally rank-deficient")]
    SingularJacobian,

    #[error("bus partition is invalid: {0}")]
    InvalidPartition(String),

    #[error("reached the iteration cap ({0}) without converging")]
    NotConverged(usize),
}
