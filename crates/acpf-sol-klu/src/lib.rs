#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

//! Thin unsafe wrapper around SuiteSparse KLU's `klu_l_*` (64-bit index) API.
//!
//! This crate owns the `klu_l_common`/`klu_l_symbolic`/`klu_l_numeric` handles and exposes
//! `analyze`/`factor`/`refactor`/`solve`/`reset` as raw-pointer calls. The safe `LinearSolver`
//! adapter (pattern detection, error mapping) lives in the `acpf` crate's `solver::klu` module.

use acpf_klu_sys::*;
use std::alloc::{alloc, Layout};

pub struct KLUSolver {
    pub common: *mut klu_l_common,
    pub symbolic: *mut klu_l_symbolic,
    pub numeric: *mut klu_l_numeric,
}

impl Default for KLUSolver {
    fn default() -> Self {
        unsafe {
            let tmp = KLUSolver {
                common: alloc(Layout::for_value(&klu_l_common::default())) as *mut klu_l_common,
                symbolic: std::ptr::null_mut() as *mut klu_l_symbolic,
                numeric: std::ptr::null_mut() as *mut klu_l_numeric,
            };

            klu_l_defaults(tmp.common);
            tmp
        }
    }
}

impl Drop for KLUSolver {
    fn drop(&mut self) {
        unsafe {
            klu_l_free_symbolic(&mut self.symbolic as *mut *mut klu_l_symbolic, self.common);
            klu_l_free_numeric(&mut self.numeric as *mut *mut klu_l_numeric, self.common);
        };
    }
}

impl KLUSolver {
    /// Symbolic analysis. Frees any previously retained symbolic factors.
    pub unsafe fn analyze(&mut self, Ap: *mut i64, Ai: *mut i64, n: i64) -> i64 {
        if !self.symbolic.is_null() {
            klu_l_free_symbolic(&mut self.symbolic as *mut *mut klu_l_symbolic, self.common);
        }
        self.symbolic = klu_l_analyze(n, Ap, Ai, self.common);
        (*self.common).status.into()
    }

    /// Full numeric factorisation from a fresh symbolic analysis.
    pub unsafe fn factor(&mut self, Ap: *mut i64, Ai: *mut i64, Ax: *mut f64) -> i64 {
        if !self.numeric.is_null() {
            klu_l_free_numeric(&mut self.numeric as *mut *mut klu_l_numeric, self.common);
        }
        self.numeric = klu_l_factor(Ap, Ai, Ax, self.symbolic, self.common);
        (*self.common).status.into()
    }

    /// Re-uses the retained symbolic analysis and numeric factors, refreshing only values.
    pub unsafe fn refactor(&mut self, Ap: *mut i64, Ai: *mut i64, Ax: *mut f64) -> i64 {
        klu_l_refactor(Ap, Ai, Ax, self.symbolic, self.numeric, self.common);
        (*self.common).status.into()
    }

    pub unsafe fn solve(&mut self, b: *mut f64, n: i64, bn: i64) -> i64 {
        klu_l_solve(self.symbolic, self.numeric, n, bn, b, self.common);
        (*self.common).status.into()
    }

    pub fn reset(&mut self) {
        unsafe {
            klu_l_free_symbolic(&mut self.symbolic as *mut *mut klu_l_symbolic, self.common);
            klu_l_free_numeric(&mut self.numeric as *mut *mut klu_l_numeric, self.common);

            *self.common = klu_l_common::default();
            self.symbolic = std::ptr::null_mut();
            self.numeric = std::ptr::null_mut();

            klu_l_defaults(self.common);
        }
    }

    pub fn has_symbolic(&self) -> bool {
        !self.symbolic.is_null()
    }

    pub fn has_numeric(&self) -> bool {
        !self.numeric.is_null()
    }
}

unsafe impl Send for KLUSolver {}
unsafe impl Sync for KLUSolver {}

#[test]
fn drop_test() {
    let klu = KLUSolver::default();
    drop(klu);
}

#[test]
fn reset_test() {
    let mut klu = KLUSolver::default();
    klu.reset();
}
