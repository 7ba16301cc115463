//! KLU (SuiteSparse) backend adapter.
//!
//! Grounded on `basic/solver/klu.rs`'s `KLUSolver`, which calls `solve_sym` (symbolic
//! analysis) followed immediately by `factor` on every single `solve()`, never reusing
//! analysis across calls. That throws away exactly the reuse `klu_l_refactor` exists for.
//! This adapter keeps the same thin-pointer-call style but drives `acpf_sol_klu`'s
//! `analyze`/`factor`/`refactor` explicitly from `initialize`/`solve(..., just_initialized)`,
//! matching the `LinearSolver` contract.

use super::LinearSolver;
use crate::error::SolverState;
use crate::numeric::{CscMatrix, Real};
use acpf_sol_klu::KLUSolver;

#[derive(Default)]
pub struct KluSolver {
    inner: KLUSolver,
    ap: Vec<i64>,
    ai: Vec<i64>,
    ax: Vec<f64>,
    license_error: bool,
}

fn status_to_state(status: i64) -> SolverState {
    if status == 0 {
        SolverState::NoError
    } else {
        SolverState::SingularMatrix
    }
}

impl KluSolver {
    fn load(&mut self, j: &CscMatrix<Real>) {
        self.ap = j.col_offsets().iter().map(|&v| v as i64).collect();
        self.ai = j.row_indices().iter().map(|&v| v as i64).collect();
        self.ax = j.values().to_vec();
    }
}

impl LinearSolver for KluSolver {
    fn initialize(&mut self, j: &CscMatrix<Real>) -> SolverState {
        if self.license_error {
            return SolverState::LicenseError;
        }
        self.load(j);
        let n = j.nrows() as i64;
        unsafe {
            if self.inner.analyze(self.ap.as_mut_ptr(), self.ai.as_mut_ptr(), n) != 0 {
                return SolverState::SolverAnalyze;
            }
            if self
                .inner
                .factor(self.ap.as_mut_ptr(), self.ai.as_mut_ptr(), self.ax.as_mut_ptr())
                != 0
            {
                return SolverState::SolverFactor;
            }
        }
        SolverState::NoError
    }

    fn solve(
        &mut self,
        j: &CscMatrix<Real>,
        b: &mut [Real],
        just_initialized: bool,
    ) -> SolverState {
        if self.license_error {
            return SolverState::LicenseError;
        }
        if !just_initialized {
            self.load(j);
            if !self.inner.has_symbolic() {
                return SolverState::NotInit;
            }
            let status = unsafe {
                self.inner
                    .refactor(self.ap.as_mut_ptr(), self.ai.as_mut_ptr(), self.ax.as_mut_ptr())
            };
            let state = status_to_state(status);
            if !state.is_ok() {
                return SolverState::SolverReFactor;
            }
        }
        let n = j.nrows() as i64;
        let status = unsafe { self.inner.solve(b.as_mut_ptr(), n, 1) };
        if status != 0 {
            return SolverState::SolverSolve;
        }
        SolverState::NoError
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.license_error = false;
    }
}

#[test]
fn default_construction_does_not_panic() {
    let _s = KluSolver::default();
}
