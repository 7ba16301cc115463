//! Scalar aliases shared by the derivative engine, the Jacobian assembler and the
//! linear-solver adapters.

pub type Real = f64;
pub type Cplx = num_complex::Complex64;

pub use nalgebra::DVector;
pub use nalgebra_sparse::CscMatrix;
