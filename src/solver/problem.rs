#![allow(non_snake_case)]
use crate::algebra::*;
use crate::solver::kkt::{DenseKKTEngine, KKTEngine, KKTSystemKind, SparseKKTEngine};
use crate::solver::MehrotraSettings;

// ---------------
// problem/solution/residual value objects for the direct conic form
// ---------------

/// A linear program in direct conic form: `min cᵀx  s.t.  Ax = b, x ≥ 0`.
///
/// Immutable for the duration of a solve.
#[derive(Debug, Clone)]
pub struct DirectProblem<T, M> {
    /// constraint matrix, `m` x `n`
    pub A: M,
    /// right hand side, length `m`
    pub b: Vec<T>,
    /// cost vector, length `n`
    pub c: Vec<T>,
}

impl<T, M> DirectProblem<T, M>
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    pub fn new(A: M, b: Vec<T>, c: Vec<T>) -> Self {
        assert_eq!(A.nrows(), b.len(), "A and b incompatible dimensions.");
        assert_eq!(A.ncols(), c.len(), "A and c incompatible dimensions.");
        Self { A, b, c }
    }
}

/// A primal-dual triple `(x, y, z)`.
///
/// While the solver is running, `x > 0` and `z > 0` hold componentwise;
/// the driver reports a violation as
/// [`MehrotraError::NonPositiveIterate`](crate::solver::MehrotraError).
#[derive(Debug, Clone)]
pub struct DirectSolution<T> {
    /// primal variables, length `n`
    pub x: Vec<T>,
    /// dual variables for the equality constraints, length `m`
    pub y: Vec<T>,
    /// dual variables for the cone constraint, length `n`
    pub z: Vec<T>,
}

impl<T> DirectSolution<T>
where
    T: FloatT,
{
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            y: vec![T::zero(); m],
            z: vec![T::zero(); n],
        }
    }
}

/// KKT residuals at an iterate.
#[derive(Debug, Clone)]
pub struct DirectResidual<T> {
    /// `r_b = Ax − b` (perturbed by `−δ²y` under primal regularization)
    pub primal_equality: Vec<T>,
    /// `r_c = Aᵀy − z + c` (perturbed by `+γ²x` under dual regularization)
    pub dual_equality: Vec<T>,
    /// `r_μ = x ∘ z`
    pub dual_conic: Vec<T>,
}

impl<T> DirectResidual<T>
where
    T: FloatT,
{
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            primal_equality: vec![T::zero(); m],
            dual_equality: vec![T::zero(); n],
            dual_conic: vec![T::zero(); n],
        }
    }
}

// ---------------
// the seam between the generic driver and the two matrix kinds
// ---------------

/// Operations the Mehrotra driver requires of a constraint matrix kind.
pub trait ConstraintMatrix<T: FloatT>:
    ShapedMatrix + MatrixMath<T> + MatrixMathMut<T> + Clone
{
    /// the KKT factor/solve engine paired with this matrix kind
    type Engine: KKTEngine<T, M = Self>;

    /// `y = a*A*x + b*y`
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T);

    /// `y = a*Aᵀ*x + b*y`
    fn gemv_t(&self, y: &mut [T], x: &[T], a: T, b: T);

    /// Estimate of ‖A‖₂ by `basis_size` power-iteration sweeps on AᵀA.
    fn norm_two_estimate(&self, basis_size: usize) -> T;

    fn new_engine(
        &self,
        kind: KKTSystemKind,
        settings: &MehrotraSettings<T>,
        two_norm_est: T,
    ) -> Self::Engine;
}

impl<T> ConstraintMatrix<T> for Matrix<T>
where
    T: FloatT,
{
    type Engine = DenseKKTEngine<T>;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        MatrixVectorMultiply::gemv(self, y, x, a, b);
    }

    fn gemv_t(&self, y: &mut [T], x: &[T], a: T, b: T) {
        MatrixVectorMultiply::gemv(&self.t(), y, x, a, b);
    }

    fn norm_two_estimate(&self, basis_size: usize) -> T {
        norm_two_estimate(self, basis_size)
    }

    fn new_engine(
        &self,
        kind: KKTSystemKind,
        settings: &MehrotraSettings<T>,
        two_norm_est: T,
    ) -> Self::Engine {
        DenseKKTEngine::new(self, kind, settings, two_norm_est)
    }
}

impl<T> ConstraintMatrix<T> for CscMatrix<T>
where
    T: FloatT,
{
    type Engine = SparseKKTEngine<T>;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        MatrixVectorMultiply::gemv(self, y, x, a, b);
    }

    fn gemv_t(&self, y: &mut [T], x: &[T], a: T, b: T) {
        MatrixVectorMultiply::gemv(&self.t(), y, x, a, b);
    }

    fn norm_two_estimate(&self, basis_size: usize) -> T {
        norm_two_estimate(self, basis_size)
    }

    fn new_engine(
        &self,
        kind: KKTSystemKind,
        settings: &MehrotraSettings<T>,
        two_norm_est: T,
    ) -> Self::Engine {
        SparseKKTEngine::new(self, kind, settings, two_norm_est)
    }
}

// Power iteration on AᵀA from a deterministic start vector.  The
// iteration count plays the role of the estimation basis size.
fn norm_two_estimate<T, M>(A: &M, basis_size: usize) -> T
where
    T: FloatT,
    M: ConstraintMatrix<T> + ?Sized,
{
    let (m, n) = (A.nrows(), A.ncols());
    if m == 0 || n == 0 {
        return T::zero();
    }

    let mut v = vec![T::one(); n];
    v.scale(T::recip(T::sqrt(T::from_usize(n).unwrap())));
    let mut u = vec![T::zero(); m];

    let mut est = T::zero();
    for _ in 0..usize::max(basis_size, 1) {
        A.gemv(&mut u, &v, T::one(), T::zero());
        A.gemv_t(&mut v, &u, T::one(), T::zero());
        let vnorm = v.norm();
        if vnorm == T::zero() {
            return T::zero();
        }
        v.scale(T::recip(vnorm));
        est = T::sqrt(vnorm);
    }
    est
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_two_estimate_diagonal() {
        let A = Matrix::<f64>::from(&[
            [3., 0.], //
            [0., 1.], //
        ]);
        let est = ConstraintMatrix::norm_two_estimate(&A, 15);
        assert!((est - 3.).abs() <= 1e-6);
    }
}
