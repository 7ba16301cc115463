//! Newton-Raphson driver: orchestrates residual evaluation, Jacobian assembly, the linear
//! solve and the voltage update, for both the single-slack and distributed-slack variants.
//!
//! Grounded on `basic/newtonpf.rs`'s `newton_pf` outer loop (mismatch → Jacobian → solve →
//! `update_v` → recheck) and `original_source/BaseSolver.h`'s setup/teardown sequence
//! (sticky `LicenseError` short-circuit, timers, `is_linear_solver_valid`).

use std::time::{Duration, Instant};

use crate::derivative;
use crate::error::{PfError, SolverState};
use crate::jacobian::{self, DistributedSlack, Jacobian};
use crate::numeric::{Cplx, CscMatrix, DVector, Real};
use crate::partition::{BusPartition, InverseIndex};
use crate::residual;
use crate::solver::LinearSolver;

/// Infinity norm that tolerates a zero-length residual (no non-slack buses at all).
fn inf_norm(f: &DVector<Real>) -> Real {
    f.iter().fold(0.0, |acc, &x| acc.max(x.abs()))
}

/// Rejects out-of-range bus ids and overlap between `slack_ids`/`pv`/`pq` before any solver
/// state is touched. A malformed partition would otherwise either silently drop Jacobian
/// entries for the offending bus or index out of bounds deep inside `InverseIndex`/`apply_update`.
fn validate_partition(partition: &BusPartition, n: usize) -> Result<(), PfError> {
    let mut seen = vec![false; n];
    for (name, list) in [
        ("slack_ids", &partition.slack_ids),
        ("pv", &partition.pv),
        ("pq", &partition.pq),
    ] {
        for &bus in list {
            if bus >= n {
                return Err(PfError::InvalidPartition(format!(
                    "{name} contains out-of-range bus {bus} (n={n})"
                )));
            }
            if seen[bus] {
                return Err(PfError::InvalidPartition(format!(
                    "bus {bus} appears in more than one of slack_ids/pv/pq"
                )));
            }
            seen[bus] = true;
        }
    }
    let covered = partition.slack_ids.len() + partition.pv.len() + partition.pq.len();
    if covered != n {
        return Err(PfError::InvalidPartition(format!(
            "slack_ids/pv/pq cover {covered} of {n} buses"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum SlackMode {
    Single,
    /// `slack_weights` is bus-indexed (length `n`, like `Sbus`); only the entries at
    /// `slack_ids` are consulted.
    Distributed { slack_weights: Vec<Real> },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Timers {
    pub residual: Duration,
    pub jacobian: Duration,
    pub linear_solve: Duration,
    pub convergence: Duration,
    pub total: Duration,
}

/// Persistent Newton-Raphson solver state: Jacobian pattern, value map, derivative buffers
/// and linear-solver backend all survive across `compute_pf` calls as long as the partition
/// shape is unchanged.
pub struct NrSolver<L: LinearSolver> {
    backend: L,
    pvpq: Vec<usize>,
    pq: Vec<usize>,
    inv: InverseIndex,
    d_va: Option<CscMatrix<Cplx>>,
    d_vm: Option<CscMatrix<Cplx>>,
    jac: Option<Jacobian>,
    x_extra: Vec<Real>,
    v: DVector<Cplx>,
    err: SolverState,
    iter: usize,
    converged: bool,
    timers: Timers,
}

impl<L: LinearSolver + Default> Default for NrSolver<L> {
    fn default() -> Self {
        Self {
            backend: L::default(),
            pvpq: Vec::new(),
            pq: Vec::new(),
            inv: InverseIndex {
                pvpq_inv: Vec::new(),
                pq_inv: Vec::new(),
            },
            d_va: None,
            d_vm: None,
            jac: None,
            x_extra: Vec::new(),
            v: DVector::zeros(0),
            err: SolverState::NoError,
            iter: 0,
            converged: false,
            timers: Timers::default(),
        }
    }
}

impl<L: LinearSolver> NrSolver<L> {
    pub fn get_v(&self) -> &DVector<Cplx> {
        &self.v
    }

    pub fn get_vm(&self) -> DVector<Real> {
        DVector::from_iterator(self.v.len(), self.v.iter().map(|c| c.norm()))
    }

    pub fn get_va(&self) -> DVector<Real> {
        DVector::from_iterator(self.v.len(), self.v.iter().map(|c| c.arg()))
    }

    pub fn get_error(&self) -> SolverState {
        self.err
    }

    pub fn get_nb_iter(&self) -> usize {
        self.iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn get_timers(&self) -> Timers {
        self.timers
    }

    pub fn get_j(&self) -> Option<&CscMatrix<Real>> {
        self.jac.as_ref().map(|j| &j.matrix)
    }

    /// Releases retained symbolic analysis, derivative buffers and the Jacobian pattern.
    /// The next `compute_pf` call rebuilds everything from scratch.
    pub fn reset(&mut self) {
        self.backend.reset();
        self.d_va = None;
        self.d_vm = None;
        self.jac = None;
        self.x_extra.clear();
        self.err = SolverState::NoError;
        self.iter = 0;
        self.converged = false;
    }

    pub fn compute_pf(
        &mut self,
        y: &CscMatrix<Cplx>,
        v0: &DVector<Cplx>,
        sbus: &DVector<Cplx>,
        partition: &BusPartition,
        mode: &SlackMode,
        tol: Real,
        max_iter: usize,
    ) -> Result<(), PfError> {
        let total_start = Instant::now();
        self.timers = Timers::default();

        let n = y.nrows();
        if sbus.len() != n || v0.len() != n || y.ncols() != n {
            return Err(PfError::InvalidPartition(format!(
                "size mismatch: n={n}, |Sbus|={}, |V|={}, Ybus={}x{}",
                sbus.len(),
                v0.len(),
                y.nrows(),
                y.ncols()
            )));
        }
        validate_partition(partition, n)?;

        if self.err.is_sticky() {
            return Err(PfError::Linear(self.err));
        }
        self.err = SolverState::NoError;

        let pvpq = match mode {
            SlackMode::Single => partition.pvpq_single_slack(),
            SlackMode::Distributed { .. } => partition.pvpq_distributed_slack(),
        };
        let pq = partition.pq.clone();
        let inv = InverseIndex::build(n, &pvpq, &pq);

        let dist = match mode {
            SlackMode::Single => None,
            SlackMode::Distributed { slack_weights } => {
                let total_weight: Real = partition
                    .slack_ids
                    .iter()
                    .map(|&bus| slack_weights[bus])
                    .sum();
                let weights: Vec<Real> = partition.slack_ids[1..]
                    .iter()
                    .map(|&bus| slack_weights[bus])
                    .collect();
                let ratios: Vec<Real> = weights.iter().map(|&w| w / total_weight).collect();
                Some(DistributedSlack {
                    reference_bus: partition.slack_ids[0],
                    extra_buses: partition.slack_ids[1..].to_vec(),
                    ratios,
                    weights,
                })
            }
        };

        let pattern_changed = self.pvpq != pvpq || self.pq != pq || self.jac.is_none();
        self.pvpq = pvpq.clone();
        self.pq = pq.clone();
        self.inv = inv;
        if pattern_changed {
            self.jac = None;
            self.x_extra = vec![0.0; dist.as_ref().map(|d| d.ratios.len()).unwrap_or(0)];
        }

        self.v = v0.clone();
        self.iter = 0;
        self.converged = false;

        let t0 = Instant::now();
        let mut f = self.evaluate_residual(y, sbus, dist.as_ref());
        self.timers.residual += t0.elapsed();

        if f.iter().any(|v| !v.is_finite()) {
            self.err = SolverState::InfiniteValue;
            self.timers.total += total_start.elapsed();
            return Err(PfError::NotConverged(self.iter));
        }

        if inf_norm(&f) <= tol {
            self.converged = true;
            self.timers.total += total_start.elapsed();
            return Ok(());
        }

        while !self.converged && self.iter < max_iter {
            self.iter += 1;

            let t0 = Instant::now();
            if self.d_va.is_none() {
                let (d_vm, d_va) = derivative::compute(y, &self.v);
                self.d_va = Some(d_va);
                self.d_vm = Some(d_vm);
            } else {
                let d_va = self.d_va.as_mut().unwrap();
                let d_vm = self.d_vm.as_mut().unwrap();
                derivative::refresh(y, &self.v, d_vm, d_va);
            }
            let d_va = self.d_va.as_ref().unwrap();
            let d_vm = self.d_vm.as_ref().unwrap();

            if self.jac.is_none() {
                self.jac = Some(
                    jacobian::assemble_unknown_pattern(
                        d_va,
                        d_vm,
                        &self.pvpq,
                        &self.pq,
                        &self.inv,
                        dist.as_ref(),
                    )
                    .map_err(|_| PfError::SingularJacobian)?,
                );
            } else {
                jacobian::assemble_known_pattern(self.jac.as_mut().unwrap(), d_va, d_vm);
            }
            self.timers.jacobian += t0.elapsed();

            let jac = self.jac.as_ref().unwrap();
            let t0 = Instant::now();
            let state = if self.iter == 1 && pattern_changed {
                self.backend.initialize(&jac.matrix)
            } else {
                SolverState::NoError
            };
            if !state.is_ok() {
                self.err = state;
                return Err(PfError::Linear(state));
            }
            let state = self
                .backend
                .solve(&jac.matrix, f.as_mut_slice(), self.iter == 1 && pattern_changed);
            self.timers.linear_solve += t0.elapsed();
            if !state.is_ok() {
                self.err = state;
                return Err(PfError::Linear(state));
            }

            let (n_pvpq, n_pq) = (jac.n_pvpq, jac.n_pq);
            self.apply_update(&f, n_pvpq, n_pq, dist.as_ref());

            let t0 = Instant::now();
            f = self.evaluate_residual(y, sbus, dist.as_ref());
            self.timers.residual += t0.elapsed();

            if f.iter().any(|v| !v.is_finite()) {
                self.converged = false;
                self.err = SolverState::InfiniteValue;
                break;
            }

            let t0 = Instant::now();
            self.converged = inf_norm(&f) <= tol;
            self.timers.convergence += t0.elapsed();
        }

        self.timers.total += total_start.elapsed();
        if !self.converged {
            if self.err.is_ok() {
                self.err = SolverState::TooManyIterations;
            }
            return Err(PfError::NotConverged(self.iter));
        }
        Ok(())
    }

    fn evaluate_residual(
        &self,
        y: &CscMatrix<Cplx>,
        sbus: &DVector<Cplx>,
        dist: Option<&DistributedSlack>,
    ) -> DVector<Real> {
        match dist {
            None => residual::evaluate(y, &self.v, sbus, &self.pvpq, &self.pq),
            Some(d) => residual::evaluate_distributed(
                y,
                &self.v,
                sbus,
                &self.pvpq,
                &self.pq,
                d,
                &self.x_extra,
            ),
        }
    }

    fn apply_update(
        &mut self,
        f: &DVector<Real>,
        n_pvpq: usize,
        n_pq: usize,
        dist: Option<&DistributedSlack>,
    ) {
        let mut vm = self.get_vm();
        let mut va = self.get_va();

        for (i, &bus) in self.pvpq.iter().enumerate() {
            va[bus] -= f[i];
        }
        for (i, &bus) in self.pq.iter().enumerate() {
            va[bus] -= f[n_pvpq + i];
            vm[bus] -= f[n_pvpq + n_pq + i];
        }
        if let Some(d) = dist {
            let core = n_pvpq + 2 * n_pq;
            for i in 0..d.ratios.len() {
                self.x_extra[i] -= f[core + i];
            }
        }

        for i in 0..self.v.len() {
            self.v[i] = Cplx::from_polar(vm[i], va[i]);
        }
    }
}
