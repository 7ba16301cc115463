//! Residual (mismatch) evaluator.
//!
//! Grounded on `original_source/BaseSolver.h`'s two `_evaluate_Fx` overloads (single-slack
//! and distributed-slack). Computes `mis = V ⊙ conj(Ybus·V) − Sbus` once and scatters its
//! real/imaginary parts into the three contiguous blocks the Jacobian assembler's column
//! ordering expects: angle mismatch at `pvpq` buses, angle mismatch at `pq` buses, magnitude
//! mismatch at `pq` buses.

use crate::jacobian::DistributedSlack;
use crate::numeric::{Cplx, CscMatrix, DVector, Real};

/// `F = [real(mis)[pvpq] ; real(mis)[pq] ; imag(mis)[pq]]`, length `|pvpq| + 2*|pq|`.
pub fn evaluate(
    y: &CscMatrix<Cplx>,
    v: &DVector<Cplx>,
    sbus: &DVector<Cplx>,
    pvpq: &[usize],
    pq: &[usize],
) -> DVector<Real> {
    let mis = mismatch(y, v, sbus);
    let n_pvpq = pvpq.len();
    let n_pq = pq.len();
    let mut f = DVector::zeros(n_pvpq + 2 * n_pq);
    for (i, &bus) in pvpq.iter().enumerate() {
        f[i] = mis[bus].re;
    }
    for (i, &bus) in pq.iter().enumerate() {
        f[n_pvpq + i] = mis[bus].re;
        f[n_pvpq + n_pq + i] = mis[bus].im;
    }
    f
}

/// Distributed-slack residual: appends one entry per extra slack bus,
/// `G_i = x_i - ratio_i * mis[reference_bus].re`, where `x` holds the current value of each
/// extra slack-share unknown (driver-owned state, not part of `V`).
pub fn evaluate_distributed(
    y: &CscMatrix<Cplx>,
    v: &DVector<Cplx>,
    sbus: &DVector<Cplx>,
    pvpq: &[usize],
    pq: &[usize],
    dist: &DistributedSlack,
    x: &[Real],
) -> DVector<Real> {
    let mis = mismatch(y, v, sbus);
    let core = evaluate(y, v, sbus, pvpq, pq);
    let mut f = DVector::zeros(core.len() + dist.ratios.len());
    f.rows_mut(0, core.len()).copy_from(&core);
    let p0 = mis[dist.reference_bus].re;
    for (i, &ratio) in dist.ratios.iter().enumerate() {
        f[core.len() + i] = x[i] - ratio * p0;
    }
    f
}

fn mismatch(y: &CscMatrix<Cplx>, v: &DVector<Cplx>, sbus: &DVector<Cplx>) -> DVector<Cplx> {
    let ibus = y * v;
    let mut mis = DVector::zeros(v.len());
    for i in 0..v.len() {
        mis[i] = v[i] * ibus[i].conj() - sbus[i];
    }
    mis
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::pattern::SparsityPattern;
    use num_complex::Complex64;

    #[test]
    fn flat_start_self_consistent_lengths() {
        let offsets = vec![0, 2, 4];
        let rows = vec![0, 1, 0, 1];
        let pattern = SparsityPattern::try_from_offsets_and_indices(2, 2, offsets, rows).unwrap();
        let diag = Complex64::new(0.0, 19.9);
        let off = Complex64::new(0.0, -10.0);
        let y = CscMatrix::try_from_pattern_and_values(pattern, vec![diag, -off, -off, diag])
            .unwrap();
        let v = DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)]);
        let s = DVector::from_vec(vec![Complex64::new(0.0, 0.0), Complex64::new(-0.5, -0.2)]);

        let pvpq: Vec<usize> = vec![];
        let pq = vec![1usize];
        let f = evaluate(&y, &v, &s, &pvpq, &pq);
        assert_eq!(f.len(), 0 + 2 * 1);
    }
}
