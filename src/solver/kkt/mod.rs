#![allow(non_snake_case)]
//! Assembly, right-hand sides and expansion for the three KKT
//! linearizations of the direct-form LP optimality conditions.
//!
//! The Newton equations at an iterate `(x, y, z)`, with permanent
//! regularization `(γ, δ)`, are
//!
//! ```text
//!   A Δx − δ²Δy        = −r_b
//!   γ²Δx + AᵀΔy − Δz   = −r_c
//!   Z Δx + X Δz        = −r_mu
//! ```
//!
//! eliminated into one of three symmetric systems selected by
//! [`KKTSystemKind`].

mod dense;
mod sparse;

pub use dense::*;
pub use sparse::*;

use crate::algebra::*;
use crate::solver::{ConstraintMatrix, DirectResidual, MehrotraSettings};
use itertools::izip;
use thiserror::Error;

/// Which linearization of the KKT conditions to factor.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KKTSystemKind {
    /// the (2n+m)-dimensional symmetric indefinite system
    Full,
    /// the (n+m)-dimensional quasidefinite system with Δz eliminated
    Augmented,
    /// the m-dimensional positive definite system with Δx and Δz eliminated
    Normal,
}

impl KKTSystemKind {
    pub(crate) fn system_size(&self, m: usize, n: usize) -> usize {
        match self {
            KKTSystemKind::Full => 2 * n + m,
            KKTSystemKind::Augmented => n + m,
            KKTSystemKind::Normal => m,
        }
    }

    // expected signs of D in the LDL factorization of each block
    pub(crate) fn dsigns(&self, m: usize, n: usize) -> Vec<i8> {
        match self {
            KKTSystemKind::Full => {
                let mut signs = vec![1_i8; 2 * n + m];
                signs[n..].fill(-1);
                signs
            }
            KKTSystemKind::Augmented => {
                let mut signs = vec![1_i8; n + m];
                signs[n..].fill(-1);
                signs
            }
            KKTSystemKind::Normal => vec![1_i8; m],
        }
    }
}

/// Failure inside the linear solver adapter.  The driver decides
/// whether it is benign based on the composite error already achieved.
#[derive(Error, Debug)]
pub enum KKTFailure {
    #[error("KKT factorization failed")]
    Factorization,
    #[error("KKT solve produced a non-finite result")]
    Solve,
}

/// Factor-and-solve adapter implemented per matrix kind.
pub trait KKTEngine<T: FloatT> {
    type M: ConstraintMatrix<T>;

    /// Assemble the selected KKT system at the current iterate and
    /// factor it.  `w_max_norm` is the max norm of the Nesterov-Todd
    /// scaling point, used to select the inner equilibration strategy.
    fn update(&mut self, A: &Self::M, x: &[T], z: &[T], w_max_norm: T) -> Result<(), KKTFailure>;

    /// Solve `J d = b` in place against the current factors.
    fn solve(&mut self, d: &mut [T]) -> Result<(), KKTFailure>;
}

// The diagonal perturbation stabilizing the factorization, with signs
// matching the inertia of each block and magnitude proportional to the
// problem scale.  Removed from solutions by iterative refinement.
pub(crate) fn build_reg_tmp<T: FloatT>(
    kind: KKTSystemKind,
    m: usize,
    n: usize,
    settings: &MehrotraSettings<T>,
    two_norm_est: T,
) -> Vec<T> {
    let scale = two_norm_est + T::one();
    let gamma_tmp = settings.reg0_tmp * settings.reg0_tmp * scale;
    let delta_tmp = settings.reg1_tmp * settings.reg1_tmp * scale;
    let beta_tmp = settings.reg2_tmp * settings.reg2_tmp * scale;

    match kind {
        KKTSystemKind::Full => {
            let mut reg = vec![T::zero(); 2 * n + m];
            reg[0..n].set(gamma_tmp);
            reg[n..n + m].set(-delta_tmp);
            reg[n + m..].set(-beta_tmp);
            reg
        }
        KKTSystemKind::Augmented => {
            let mut reg = vec![T::zero(); n + m];
            reg[0..n].set(gamma_tmp);
            reg[n..].set(-delta_tmp);
            reg
        }
        // the normal equations are already positive definite
        KKTSystemKind::Normal => vec![T::zero(); m],
    }
}

// ---------------
// right-hand sides
// ---------------

/// RHS of the full system: `d = [−r_c; −r_b; Z⁻¹r_mu]`.
pub(crate) fn kkt_rhs<T: FloatT>(residual: &DirectResidual<T>, z: &[T], d: &mut [T]) {
    let n = residual.dual_equality.len();
    let m = residual.primal_equality.len();
    assert_eq!(d.len(), 2 * n + m);

    d[0..n].scalarop_from(|v| -v, &residual.dual_equality);
    d[n..n + m].scalarop_from(|v| -v, &residual.primal_equality);
    for (d, &rmu, &zi) in izip!(&mut d[n + m..], &residual.dual_conic, z) {
        *d = rmu / zi;
    }
}

/// RHS of the augmented system: `d = [−r_c − X⁻¹r_mu; −r_b]`.
pub(crate) fn augmented_kkt_rhs<T: FloatT>(x: &[T], residual: &DirectResidual<T>, d: &mut [T]) {
    let n = residual.dual_equality.len();
    let m = residual.primal_equality.len();
    assert_eq!(d.len(), n + m);

    for (d, &rc, &rmu, &xi) in izip!(
        &mut d[0..n],
        &residual.dual_equality,
        &residual.dual_conic,
        x
    ) {
        *d = -rc - rmu / xi;
    }
    d[n..].scalarop_from(|v| -v, &residual.primal_equality);
}

/// RHS of the normal system: `rhs = r_b − A·D·(r_c + X⁻¹r_mu)` with
/// `D = (Z/X + γ²I)⁻¹`.
pub(crate) fn normal_kkt_rhs<T, M>(
    A: &M,
    gamma_sq: T,
    x: &[T],
    z: &[T],
    residual: &DirectResidual<T>,
    work: &mut [T],
    d: &mut [T],
) where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    assert_eq!(d.len(), residual.primal_equality.len());
    assert_eq!(work.len(), x.len());

    // work = D (r_c + r_mu / x)
    for (w, &rc, &rmu, &xi, &zi) in izip!(
        work.iter_mut(),
        &residual.dual_equality,
        &residual.dual_conic,
        x,
        z
    ) {
        *w = (rc + rmu / xi) / (zi / xi + gamma_sq);
    }

    d.copy_from(&residual.primal_equality);
    A.gemv(d, work, -T::one(), T::one());
}

// ---------------
// expansion of solved systems back to (Δx, Δy, Δz)
// ---------------

/// Unpack the solved full system.
pub(crate) fn expand_solution<T: FloatT>(
    m: usize,
    n: usize,
    d: &[T],
    dx: &mut [T],
    dy: &mut [T],
    dz: &mut [T],
) {
    assert_eq!(d.len(), 2 * n + m);
    dx.copy_from(&d[0..n]);
    dy.copy_from(&d[n..n + m]);
    dz.copy_from(&d[n + m..]);
}

/// Unpack the solved augmented system, recovering
/// `Δz = −X⁻¹(r_mu + Z∘Δx)`.
pub(crate) fn expand_augmented_solution<T: FloatT>(
    x: &[T],
    z: &[T],
    r_mu: &[T],
    d: &[T],
    dx: &mut [T],
    dy: &mut [T],
    dz: &mut [T],
) {
    let n = x.len();
    dx.copy_from(&d[0..n]);
    dy.copy_from(&d[n..]);
    for (dz, &rmu, &zi, &xi, &dxi) in izip!(dz.iter_mut(), r_mu, z, x, &*dx) {
        *dz = -(rmu + zi * dxi) / xi;
    }
}

/// Unpack the solved normal system:
/// `Δx = −D(r_c + X⁻¹r_mu + AᵀΔy)`, then Δz as in the augmented case.
pub(crate) fn expand_normal_solution<T, M>(
    A: &M,
    gamma_sq: T,
    x: &[T],
    z: &[T],
    residual: &DirectResidual<T>,
    d: &[T],
    dx: &mut [T],
    dy: &mut [T],
    dz: &mut [T],
) where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    dy.copy_from(d);

    // dx = A^T dy, then fold in the residual terms
    A.gemv_t(dx, dy, T::one(), T::zero());
    for (dx, &rc, &rmu, &xi, &zi) in izip!(
        dx.iter_mut(),
        &residual.dual_equality,
        &residual.dual_conic,
        x,
        z
    ) {
        *dx = -(rc + rmu / xi + *dx) / (zi / xi + gamma_sq);
    }

    for (dz, &rmu, &zi, &xi, &dxi) in izip!(dz.iter_mut(), &residual.dual_conic, z, x, &*dx) {
        *dz = -(rmu + zi * dxi) / xi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::DirectResidual;

    // verify that each eliminated form reproduces the full Newton system
    // on a small fixed problem by checking the recovered (dx, dy, dz)
    // against the Newton equations directly.
    fn check_newton<M: ConstraintMatrix<f64>>(
        A: &M,
        x: &[f64],
        z: &[f64],
        residual: &DirectResidual<f64>,
        dx: &[f64],
        dy: &[f64],
        dz: &[f64],
        gamma_sq: f64,
        delta_sq: f64,
        tol: f64,
    ) {
        let (m, n) = A.size();

        // A dx - delta^2 dy + r_b = 0
        let mut rb = residual.primal_equality.clone();
        A.gemv(&mut rb, dx, 1., 1.);
        rb.axpby(-delta_sq, dy, 1.);
        assert!(rb.norm() <= tol, "primal equation violated: {}", rb.norm());

        // gamma^2 dx + A^T dy - dz + r_c = 0
        let mut rc = residual.dual_equality.clone();
        A.gemv_t(&mut rc, dy, 1., 1.);
        rc.axpby(gamma_sq, dx, 1.);
        rc.axpby(-1., dz, 1.);
        assert!(rc.norm() <= tol, "dual equation violated: {}", rc.norm());

        // z o dx + x o dz + r_mu = 0
        for i in 0..n {
            let v = z[i] * dx[i] + x[i] * dz[i] + residual.dual_conic[i];
            assert!(v.abs() <= tol, "conic equation violated: {v}");
        }
        let _ = m;
    }

    fn fixture() -> (Matrix<f64>, Vec<f64>, Vec<f64>, DirectResidual<f64>) {
        let A = Matrix::from(&[
            [1., 2., 0.], //
            [0., 1., 3.], //
        ]);
        let x = vec![0.5, 1.5, 2.];
        let z = vec![1., 0.25, 0.75];
        let mut residual = DirectResidual::new(2, 3);
        residual.primal_equality = vec![0.3, -0.2];
        residual.dual_equality = vec![0.1, -0.4, 0.2];
        residual.dual_conic = vec![0.5, 0.375, 1.5];
        (A, x, z, residual)
    }

    #[test]
    fn test_augmented_matches_newton() {
        use crate::solver::MehrotraSettingsBuilder;

        let (A, x, z, residual) = fixture();
        let settings = MehrotraSettingsBuilder::default()
            .reg0_perm(0.)
            .reg1_perm(0.)
            .reg2_perm(0.)
            .reg0_tmp(0.)
            .reg1_tmp(0.)
            .reg2_tmp(0.)
            .system(KKTSystemKind::Augmented)
            .build()
            .unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Augmented, &settings, 3.);
        engine.update(&A, &x, &z, 1.).unwrap();

        let mut d = vec![0.; 5];
        augmented_kkt_rhs(&x, &residual, &mut d);
        engine.solve(&mut d).unwrap();

        let (mut dx, mut dy, mut dz) = (vec![0.; 3], vec![0.; 2], vec![0.; 3]);
        expand_augmented_solution(&x, &z, &residual.dual_conic, &d, &mut dx, &mut dy, &mut dz);
        check_newton(&A, &x, &z, &residual, &dx, &dy, &dz, 0., 0., 1e-9);
    }

    #[test]
    fn test_full_matches_newton() {
        use crate::solver::MehrotraSettingsBuilder;

        let (A, x, z, residual) = fixture();
        let settings = MehrotraSettingsBuilder::default()
            .reg0_perm(0.)
            .reg1_perm(0.)
            .reg2_perm(0.)
            .reg0_tmp(0.)
            .reg1_tmp(0.)
            .reg2_tmp(0.)
            .system(KKTSystemKind::Full)
            .build()
            .unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Full, &settings, 3.);
        engine.update(&A, &x, &z, 1.).unwrap();

        let mut d = vec![0.; 8];
        kkt_rhs(&residual, &z, &mut d);
        engine.solve(&mut d).unwrap();

        let (mut dx, mut dy, mut dz) = (vec![0.; 3], vec![0.; 2], vec![0.; 3]);
        expand_solution(2, 3, &d, &mut dx, &mut dy, &mut dz);
        check_newton(&A, &x, &z, &residual, &dx, &dy, &dz, 0., 0., 1e-9);
    }

    #[test]
    fn test_normal_matches_newton() {
        use crate::solver::MehrotraSettingsBuilder;

        let (A, x, z, residual) = fixture();
        let settings = MehrotraSettingsBuilder::default()
            .system(KKTSystemKind::Normal)
            .build()
            .unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Normal, &settings, 3.);
        engine.update(&A, &x, &z, 1.).unwrap();

        let mut d = vec![0.; 2];
        let mut work = vec![0.; 3];
        normal_kkt_rhs(&A, 0., &x, &z, &residual, &mut work, &mut d);
        engine.solve(&mut d).unwrap();

        let (mut dx, mut dy, mut dz) = (vec![0.; 3], vec![0.; 2], vec![0.; 3]);
        expand_normal_solution(&A, 0., &x, &z, &residual, &d, &mut dx, &mut dy, &mut dz);
        check_newton(&A, &x, &z, &residual, &dx, &dy, &dz, 0., 0., 1e-9);
    }
}
