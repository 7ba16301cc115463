//! Newton-Raphson AC power-flow core.
//!
//! Computes bus voltages satisfying `diag(V)·conj(Ybus·V) = Sbus` at every non-slack bus,
//! given a bus admittance matrix, an initial voltage guess and a PV/PQ/slack partition.
//! Ships the Jacobian assembler with sparsity-pattern reuse, the dS/dVa–dS/dVm derivative
//! engine, a pluggable sparse LU backend abstraction, and both single-slack and
//! distributed-slack drivers.
//!
//! See [`driver::NrSolver`] for the entry point.

pub mod derivative;
pub mod driver;
pub mod error;
pub mod jacobian;
pub mod numeric;
pub mod partition;
pub mod residual;
pub mod solver;

pub mod prelude {
    pub use crate::driver::{NrSolver, SlackMode, Timers};
    pub use crate::error::{PfError, SolverState};
    pub use crate::numeric::{Cplx, CscMatrix, DVector, Real};
    pub use crate::partition::BusPartition;
    pub use crate::solver::LinearSolver;
}
