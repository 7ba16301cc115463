//! Power-injection derivative engine: dS/dVa and dS/dVm.
//!
//! Grounded on `basic/dsbus_dv.rs`'s `dSbus_dV`, which builds the two Jacobian blocks from
//! diagonal matrix products (MATPOWER's TN2, Zimmerman & Chiang). That formulation goes
//! through three sparse matrix products per call and does not guarantee the result shares
//! `Ybus`'s sparsity pattern. Here the same closed-form entries are computed directly while
//! walking `Ybus`'s own CSC structure, so `dS/dVa` and `dS/dVm` are built once with exactly
//! `Ybus`'s pattern and refreshed in place afterwards — the value-map reuse in
//! [`crate::jacobian`] depends on that guarantee.
//!
//! For each nonzero Y[r, c]:
//!   dS/dVm\[r, c\] = V\[r\] * conj(Y\[r, c\] * Vnorm\[c\])  (+ conj(Ibus\[r\]) * Vnorm\[c\] on the diagonal)
//!   dS/dVa\[r, c\] = -j * V\[r\] * conj(Y\[r, c\] * V\[c\])  (+ j * V\[r\] * conj(Ibus\[r\]) on the diagonal)
//!
//! where `Ibus = Ybus * V` and `Vnorm[k] = V[k] / |V[k]|`.

use crate::numeric::{Cplx, CscMatrix, DVector};
use num_complex::Complex64;

fn vnorm(v: Cplx) -> Cplx {
    v / Complex64::new(v.norm(), 0.0)
}

/// Allocates fresh `dS/dVa` and `dS/dVm` matrices sharing `y`'s sparsity pattern and fills
/// them for the given voltage vector. Call once when the pattern is established; afterwards
/// prefer [`refresh`] to avoid re-allocating.
pub fn compute(y: &CscMatrix<Cplx>, v: &DVector<Cplx>) -> (CscMatrix<Cplx>, CscMatrix<Cplx>) {
    let mut d_vm = y.clone();
    let mut d_va = y.clone();
    refresh(y, v, &mut d_vm, &mut d_va);
    (d_vm, d_va)
}

/// Refreshes `d_vm` and `d_va` in place for a new voltage vector `v`. `d_vm` and `d_va` must
/// already share `y`'s sparsity pattern (as produced by [`compute`]); only values change.
pub fn refresh(
    y: &CscMatrix<Cplx>,
    v: &DVector<Cplx>,
    d_vm: &mut CscMatrix<Cplx>,
    d_va: &mut CscMatrix<Cplx>,
) {
    let n = v.len();
    let ibus = y * v;
    let vn: Vec<Cplx> = v.iter().copied().map(vnorm).collect();

    let col_offsets = y.col_offsets().to_vec();
    let row_indices = y.row_indices().to_vec();
    let i = Complex64::i();

    let dvm_values = d_vm.values_mut();
    let dva_values = d_va.values_mut();

    for c in 0..n {
        let start = col_offsets[c];
        let end = col_offsets[c + 1];
        let vn_c = vn[c];
        let v_c = v[c];
        for idx in start..end {
            let r = row_indices[idx];
            let y_rc = y.values()[idx];
            let v_r = v[r];

            let mut dvm = v_r * (y_rc * vn_c).conj();
            let mut dva = -i * v_r * (y_rc * v_c).conj();

            if r == c {
                dvm += ibus[r].conj() * vn_c;
                dva += i * v_r * ibus[r].conj();
            }

            dvm_values[idx] = dvm;
            dva_values[idx] = dva;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::pattern::SparsityPattern;

    fn two_bus_ybus() -> CscMatrix<Cplx> {
        // Simple two-bus pi-line admittance matrix, diagonal-dominant, fully dense 2x2.
        let pattern =
            SparsityPattern::try_from_offsets_and_indices(2, 2, vec![0, 2, 4], vec![0, 1, 0, 1])
                .unwrap();
        let y = Complex64::new(0.0, -10.0);
        let values = vec![
            Complex64::new(0.0, 19.9),
            -y,
            -y,
            Complex64::new(0.0, 19.9),
        ];
        CscMatrix::try_from_pattern_and_values(pattern, values).unwrap()
    }

    #[test]
    fn pattern_matches_ybus() {
        let y = two_bus_ybus();
        let v = DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(0.98, -0.02)]);
        let (d_vm, d_va) = compute(&y, &v);
        assert_eq!(d_vm.pattern().major_offsets(), y.pattern().major_offsets());
        assert_eq!(d_vm.pattern().minor_indices(), y.pattern().minor_indices());
        assert_eq!(d_va.pattern().major_offsets(), y.pattern().major_offsets());
        assert_eq!(d_va.nnz(), y.nnz());
    }

    #[test]
    fn refresh_matches_compute() {
        let y = two_bus_ybus();
        let v0 = DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(0.98, -0.02)]);
        let v1 = DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(0.96, -0.03)]);

        let (mut d_vm, mut d_va) = compute(&y, &v0);
        refresh(&y, &v1, &mut d_vm, &mut d_va);
        let (d_vm_direct, d_va_direct) = compute(&y, &v1);

        for (a, b) in d_vm.values().iter().zip(d_vm_direct.values()) {
            assert!((a - b).norm() < 1e-12);
        }
        for (a, b) in d_va.values().iter().zip(d_va_direct.values()) {
            assert!((a - b).norm() < 1e-12);
        }
    }
}
