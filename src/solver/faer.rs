//! faer backend adapter.
//!
//! Grounded on `basic/solver/faer.rs`'s `FaerSolver`: builds an unchecked
//! `SymbolicSparseColMatRef` over the raw CSC triple, keeps `SymbolicLu` across calls and
//! rebuilds the numeric `Lu` every solve via `try_new_with_symbolic`, solving in place
//! through `MatMut::from_column_major_slice_mut`.

use super::LinearSolver;
use crate::error::SolverState;
use crate::numeric::{CscMatrix, Real};
use faer::linalg::solvers::Solve as _;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::{SparseColMatRef, SymbolicSparseColMatRef};
use faer::MatMut;

#[derive(Default)]
pub struct FaerSolver {
    symbolic: Option<SymbolicLu<usize>>,
    lu: Option<Lu<usize, Real>>,
}

impl FaerSolver {
    fn factor(&mut self, j: &CscMatrix<Real>, reuse_symbolic: bool) -> SolverState {
        let col_ptrs = j.col_offsets();
        let row_idx = j.row_indices();
        let values = j.values();
        let n = j.nrows();

        let s = unsafe { SymbolicSparseColMatRef::new_unchecked(n, n, col_ptrs, None, row_idx) };
        let mat = SparseColMatRef::new(s, values);

        if !reuse_symbolic || self.symbolic.is_none() {
            self.symbolic = match SymbolicLu::try_new(s) {
                Ok(sym) => Some(sym),
                Err(_) => return SolverState::SolverAnalyze,
            };
        }

        self.lu = match Lu::try_new_with_symbolic(self.symbolic.as_ref().unwrap().clone(), mat) {
            Ok(lu) => Some(lu),
            Err(_) => return SolverState::SolverFactor,
        };
        SolverState::NoError
    }
}

impl LinearSolver for FaerSolver {
    fn initialize(&mut self, j: &CscMatrix<Real>) -> SolverState {
        self.factor(j, false)
    }

    fn solve(
        &mut self,
        j: &CscMatrix<Real>,
        b: &mut [Real],
        just_initialized: bool,
    ) -> SolverState {
        if !just_initialized {
            let state = self.factor(j, true);
            if !state.is_ok() {
                return state;
            }
        }
        let Some(lu) = self.lu.as_ref() else {
            return SolverState::NotInit;
        };
        let n = j.nrows();
        let mat_ref = MatMut::from_column_major_slice_mut(b, n, 1);
        lu.solve_in_place(mat_ref);
        SolverState::NoError
    }

    fn reset(&mut self) {
        self.symbolic = None;
        self.lu = None;
    }
}
