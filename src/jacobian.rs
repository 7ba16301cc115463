//! Two-mode Jacobian assembly with value-map reuse.
//!
//! Grounded on `basic/newtonpf.rs`'s `build_jacobian`, which rebuilds `J` from scratch every
//! iteration via `csc_hstack`/`csc_vstack` over freshly sliced blocks of `dS/dVa`/`dS/dVm`.
//! That is correct but throws away the previous iteration's sparsity analysis every time. Here
//! [`assemble_unknown_pattern`] does that work once — walking `dS/dVa`/`dS/dVm`'s columns,
//! mapping each surviving entry's row through [`InverseIndex`], and recording where in `J`'s
//! final `values()` array it landed — and [`assemble_known_pattern`] replays the recorded
//! mapping to refresh `J`'s values in a single linear pass without touching the pattern again.
//!
//! Unknown/row ordering follows the residual evaluator's three contiguous blocks: angle at
//! `pvpq` buses, angle at `pq` buses, magnitude at `pq` buses — `m = |pvpq| + 2*|pq|`. The
//! first two column groups both read `dS/dVa` (only the source bus list differs); the third
//! reads `dS/dVm`. Every column contributes its real part to the angle rows (block 1 for
//! `pvpq` sources, block 2 for `pq` sources) and its imaginary part to the magnitude rows
//! (block 3, `pq` only).

use crate::numeric::{Cplx, CscMatrix, Real};
use crate::partition::InverseIndex;
use nalgebra_sparse::SparseFormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsSource {
    Va,
    Vm,
}

/// Tagged index into `dS/dVa`'s or `dS/dVm`'s flat `values()` array, or a fixed constant.
/// Safe substitute for the raw-pointer value maps a systems language would reach for here.
#[derive(Debug, Clone, Copy)]
pub enum ValueMapEntry {
    Dense {
        source: DsSource,
        index: usize,
        imag: bool,
        scale: Real,
    },
    Constant(Real),
}

/// Describes the extra unknown/row pair the distributed-slack driver adds per additional
/// slack bus. Each extra unknown `x_i` stands for `slack_weights[i] * x_i` of real power
/// picked up by slack bus `i` beyond its nominal share, constrained against the reference
/// bus's own mismatch (see the crate design notes for the derivation).
pub struct DistributedSlack {
    pub reference_bus: usize,
    /// `slack_ids[1..]`, aligned with `ratios` and `weights`.
    pub extra_buses: Vec<usize>,
    /// `slack_weights[i] / sum(slack_weights)` for each bus in `extra_buses`.
    pub ratios: Vec<Real>,
    /// Raw `slack_weights[i]` (not normalized) for each bus in `extra_buses`.
    pub weights: Vec<Real>,
}

pub struct Jacobian {
    pub matrix: CscMatrix<Real>,
    pub value_map: Vec<ValueMapEntry>,
    /// Sizes of the three core row/column blocks: (|pvpq|, |pq|). Magnitude block is |pq|.
    pub n_pvpq: usize,
    pub n_pq: usize,
}

fn column_bus_list(pvpq: &[usize], pq: &[usize]) -> Vec<(DsSource, usize)> {
    let mut out = Vec::with_capacity(pvpq.len() + 2 * pq.len());
    out.extend(pvpq.iter().map(|&b| (DsSource::Va, b)));
    out.extend(pq.iter().map(|&b| (DsSource::Va, b)));
    out.extend(pq.iter().map(|&b| (DsSource::Vm, b)));
    out
}

/// Builds `J` from scratch, recording a [`ValueMapEntry`] for every nonzero so that later
/// iterations can refresh values without rediscovering the pattern.
pub fn assemble_unknown_pattern(
    d_va: &CscMatrix<Cplx>,
    d_vm: &CscMatrix<Cplx>,
    pvpq: &[usize],
    pq: &[usize],
    inv: &InverseIndex,
    distributed: Option<&DistributedSlack>,
) -> Result<Jacobian, SparseFormatError> {
    let n_pvpq = pvpq.len();
    let n_pq = pq.len();
    let core = n_pvpq + 2 * n_pq;
    let extra = distributed.map(|d| d.extra_buses.len()).unwrap_or(0);
    let m = core + extra;

    let mut col_offsets = Vec::with_capacity(m + 1);
    let mut row_indices = Vec::new();
    let mut values = Vec::new();
    let mut value_map = Vec::new();
    col_offsets.push(0);

    for (kind, bus) in column_bus_list(pvpq, pq) {
        let d = match kind {
            DsSource::Va => d_va,
            DsSource::Vm => d_vm,
        };
        let offsets = d.col_offsets();
        let range = offsets[bus]..offsets[bus + 1];
        let rows = d.row_indices();
        let vals = d.values();

        let mut entries: Vec<(usize, Real, ValueMapEntry)> = Vec::with_capacity(2 * range.len());
        for idx in range.clone() {
            let r = rows[idx];
            if inv.pvpq_inv[r] >= 0 {
                let out_row = inv.pvpq_inv[r] as usize;
                entries.push((
                    out_row,
                    vals[idx].re,
                    ValueMapEntry::Dense {
                        source: kind,
                        index: idx,
                        imag: false,
                        scale: 1.0,
                    },
                ));
            } else if inv.pq_inv[r] >= 0 {
                let p = inv.pq_inv[r] as usize;
                entries.push((
                    n_pvpq + p,
                    vals[idx].re,
                    ValueMapEntry::Dense {
                        source: kind,
                        index: idx,
                        imag: false,
                        scale: 1.0,
                    },
                ));
                entries.push((
                    n_pvpq + n_pq + p,
                    vals[idx].im,
                    ValueMapEntry::Dense {
                        source: kind,
                        index: idx,
                        imag: true,
                        scale: 1.0,
                    },
                ));
            } else if let Some(dist) = distributed {
                if r == dist.reference_bus {
                    for (i, &ratio) in dist.ratios.iter().enumerate() {
                        let out_row = core + i;
                        entries.push((
                            out_row,
                            -ratio * vals[idx].re,
                            ValueMapEntry::Dense {
                                source: kind,
                                index: idx,
                                imag: false,
                                scale: -ratio,
                            },
                        ));
                    }
                }
            }
        }
        entries.sort_by_key(|(row, _, _)| *row);
        for (row, val, map_entry) in entries {
            row_indices.push(row);
            values.push(val);
            value_map.push(map_entry);
        }
        col_offsets.push(row_indices.len());
    }

    if let Some(dist) = distributed {
        for (i, (&bus, &weight)) in dist.extra_buses.iter().zip(&dist.weights).enumerate() {
            let own_row = inv.pvpq_inv[bus];
            debug_assert!(own_row >= 0, "extra slack bus must already be in pvpq");
            let mut entries = vec![
                (own_row as usize, ValueMapEntry::Constant(-weight)),
                (core + i, ValueMapEntry::Constant(1.0)),
            ];
            entries.sort_by_key(|(row, _)| *row);
            for (row, map_entry) in entries {
                row_indices.push(row);
                values.push(match map_entry {
                    ValueMapEntry::Constant(v) => v,
                    _ => unreachable!(),
                });
                value_map.push(map_entry);
            }
            col_offsets.push(row_indices.len());
        }
    }

    let matrix = CscMatrix::try_from_csc_data(m, m, col_offsets, row_indices, values)?;
    Ok(Jacobian {
        matrix,
        value_map,
        n_pvpq,
        n_pq,
    })
}

/// Refreshes `jac.matrix`'s values in place from the current `d_va`/`d_vm`, replaying the
/// recorded [`ValueMapEntry`] list. Does not touch `jac.matrix`'s sparsity pattern.
pub fn assemble_known_pattern(jac: &mut Jacobian, d_va: &CscMatrix<Cplx>, d_vm: &CscMatrix<Cplx>) {
    let out = jac.matrix.values_mut();
    for (p, entry) in jac.value_map.iter().enumerate() {
        out[p] = match *entry {
            ValueMapEntry::Dense {
                source,
                index,
                imag,
                scale,
            } => {
                let c = match source {
                    DsSource::Va => d_va.values()[index],
                    DsSource::Vm => d_vm.values()[index],
                };
                scale * if imag { c.im } else { c.re }
            }
            ValueMapEntry::Constant(v) => v,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative;
    use crate::numeric::DVector;
    use nalgebra_sparse::pattern::SparsityPattern;
    use num_complex::Complex64;

    fn three_bus_ybus() -> CscMatrix<Cplx> {
        // bus 0 = slack, bus 1 = pv, bus 2 = pq, fully meshed for nonzero pattern everywhere.
        let offsets = vec![0, 3, 6, 9];
        let rows = vec![0, 1, 2, 0, 1, 2, 0, 1, 2];
        let pattern = SparsityPattern::try_from_offsets_and_indices(3, 3, offsets, rows).unwrap();
        let diag = Complex64::new(0.0, 29.9);
        let off = Complex64::new(0.0, -10.0);
        let values = vec![diag, off, off, off, diag, off, off, off, diag];
        CscMatrix::try_from_pattern_and_values(pattern, values).unwrap()
    }

    #[test]
    fn single_slack_shape_is_pvpq_plus_2pq() {
        let y = three_bus_ybus();
        let v = DVector::from_vec(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
        ]);
        let (d_vm, d_va) = derivative::compute(&y, &v);

        let pvpq = vec![1usize];
        let pq = vec![2usize];
        let inv = crate::partition::InverseIndex::build(3, &pvpq, &pq);

        let jac = assemble_unknown_pattern(&d_va, &d_vm, &pvpq, &pq, &inv, None).unwrap();
        assert_eq!(jac.matrix.nrows(), 3);
        assert_eq!(jac.matrix.ncols(), 3);
        assert_eq!(jac.value_map.len(), jac.matrix.nnz());
    }

    #[test]
    fn known_pattern_refresh_matches_fresh_assembly() {
        let y = three_bus_ybus();
        let v0 = DVector::from_vec(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
        ]);
        let v1 = DVector::from_vec(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.99, -0.01),
            Complex64::new(0.97, -0.03),
        ]);

        let pvpq = vec![1usize];
        let pq = vec![2usize];
        let inv = crate::partition::InverseIndex::build(3, &pvpq, &pq);

        let (mut d_vm, mut d_va) = derivative::compute(&y, &v0);
        let mut jac = assemble_unknown_pattern(&d_va, &d_vm, &pvpq, &pq, &inv, None).unwrap();

        derivative::refresh(&y, &v1, &mut d_vm, &mut d_va);
        assemble_known_pattern(&mut jac, &d_va, &d_vm);

        let (d_vm_direct, d_va_direct) = derivative::compute(&y, &v1);
        let fresh =
            assemble_unknown_pattern(&d_va_direct, &d_vm_direct, &pvpq, &pq, &inv, None).unwrap();

        for (a, b) in jac.matrix.values().iter().zip(fresh.matrix.values()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
