//! NICSLU backend stub.
//!
//! Grounded on `original_source/NICSLUSolver.h`'s `#ifdef NICSLU_SOLVER_AVAILABLE` guard:
//! NICSLU is a licensed, closed-source solver the original links conditionally and falls
//! back from when the license or native library isn't available. This crate never vendors
//! that library, so the `nicslu` feature compiles a backend that always reports
//! `SolverState::LicenseError`, matching the original's behavior when the guard is off
//! rather than silently no-op succeeding.

use super::LinearSolver;
use crate::error::SolverState;
use crate::numeric::{CscMatrix, Real};

#[derive(Default)]
pub struct NicsluSolver;

impl LinearSolver for NicsluSolver {
    fn initialize(&mut self, _j: &CscMatrix<Real>) -> SolverState {
        SolverState::LicenseError
    }

    fn solve(&mut self, _j: &CscMatrix<Real>, _b: &mut [Real], _just_initialized: bool) -> SolverState {
        SolverState::LicenseError
    }

    fn reset(&mut self) {}
}

#[test]
fn always_reports_license_error() {
    let mut s = NicsluSolver::default();
    let j = CscMatrix::identity(1);
    assert_eq!(s.initialize(&j), SolverState::LicenseError);
    assert_eq!(s.solve(&j, &mut [0.0], true), SolverState::LicenseError);
}
