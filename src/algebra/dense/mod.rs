#![allow(non_snake_case)]

mod core;
mod ldl;
mod lufull;
mod matrix_math;

pub use self::ldl::*;
pub use self::lufull::*;

use crate::algebra::FloatT;

/// Dense matrix in column-major format
///
/// __Example usage__ : To construct the 2 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  4.  6.]
/// ```
///
/// ```no_run
/// use orthant::algebra::Matrix;
///
/// let A : Matrix<f64> = Matrix::new(
///    (2, 3),                           // m, n
///    vec![1., 2., 3., 4., 5., 6.],     // data, column by column
///  );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// vector of data in column major format
    pub data: Vec<T>,
}

impl<T: FloatT> Matrix<T> {
    pub fn new(size: (usize, usize), data: Vec<T>) -> Self {
        let (m, n) = size;
        assert_eq!(m * n, data.len());
        Self { m, n, data }
    }
}
