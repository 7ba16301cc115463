//! Generic sparse LU backend, no native dependencies.
//!
//! Grounded on `basic/solver/rsparse.rs`'s `RSparseSolver`: converts the CSC triple into
//! `rsparse::data::Sprs`, reuses the symbolic analysis (`sqr`) across calls and always
//! refactors numerically (`lu`) before applying the permutations (`ipvec`/`lsolve`/`usolve`).

use super::LinearSolver;
use crate::error::SolverState;
use crate::numeric::{CscMatrix, Real};
use rsparse::data::{Sprs, Symb};
use rsparse::{ipvec, lsolve, lu, sqr, usolve};

use tracing::warn;

fn to_sprs(j: &CscMatrix<Real>) -> Sprs {
    let n = j.nrows();
    Sprs {
        m: n,
        n,
        p: j.col_offsets().iter().map(|&v| v as isize).collect(),
        i: j.row_indices().to_vec(),
        x: j.values().to_vec(),
        nzmax: j.nnz(),
    }
}

#[derive(Default)]
pub struct GenericLuSolver {
    symbolic: Option<Symb>,
    scratch: Vec<Real>,
}

impl LinearSolver for GenericLuSolver {
    fn initialize(&mut self, j: &CscMatrix<Real>) -> SolverState {
        let a = to_sprs(j);
        self.symbolic = Some(sqr(&a, 1, false));
        self.scratch = vec![0.0; j.nrows()];
        SolverState::NoError
    }

    fn solve(
        &mut self,
        j: &CscMatrix<Real>,
        b: &mut [Real],
        just_initialized: bool,
    ) -> SolverState {
        if !just_initialized && self.symbolic.is_none() {
            warn!("generic LU solver asked to reuse analysis with none retained");
            return SolverState::NotInit;
        }
        let a = to_sprs(j);
        if self.symbolic.is_none() {
            self.symbolic = Some(sqr(&a, 1, false));
            self.scratch = vec![0.0; j.nrows()];
        }
        let s = self.symbolic.as_mut().unwrap();
        let numeric = match lu(&a, s, 1e-6) {
            Ok(n) => n,
            Err(_) => return SolverState::SolverFactor,
        };
        ipvec(&numeric.pinv, b, &mut self.scratch);
        lsolve(&numeric.l, &mut self.scratch);
        usolve(&numeric.u, &mut self.scratch);
        ipvec(&s.q, &self.scratch, b);
        SolverState::NoError
    }

    fn reset(&mut self) {
        self.symbolic = None;
        self.scratch.clear();
    }
}
