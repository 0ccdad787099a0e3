#![allow(non_snake_case)]
//! Iteration-wide scalars and residuals for the IPM loop.

use crate::algebra::*;
use crate::solver::{
    pos_orth, ConstraintMatrix, DirectProblem, DirectResidual, DirectSolution, MehrotraSettings,
};

/// Permanent regularization of the problem formulation.  These shift
/// the KKT conditions themselves, unlike the temporary regularization
/// that only stabilizes factorization.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PermanentRegularization<T> {
    /// γ², applied to the dual equality residual
    pub gamma_sq: T,
    /// δ², applied to the primal equality residual
    pub delta_sq: T,
}

/// Scalars and residuals tracked across outer iterations.
#[derive(Debug, Clone)]
pub struct SolverState<T> {
    pub b_norm: T,
    pub c_norm: T,

    /// barrier parameter μ = (xᵀz)/n
    pub barrier: T,
    pub barrier_old: T,
    pub barrier_affine: T,
    pub sigma: T,

    pub primal_objective: T,
    pub dual_objective: T,
    pub relative_gap: T,

    pub residual: DirectResidual<T>,
    pub primal_equality_norm: T,
    pub dual_equality_norm: T,
    pub dual_conic_norm: T,
    pub relative_primal_equality_norm: T,
    pub relative_dual_equality_norm: T,

    pub num_its: u32,
    /// max of the relative primal/dual residual norms and the relative gap
    pub dimacs_error: T,
}

impl<T> SolverState<T>
where
    T: FloatT,
{
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            b_norm: T::zero(),
            c_norm: T::zero(),
            barrier: T::zero(),
            barrier_old: T::zero(),
            barrier_affine: T::zero(),
            sigma: T::zero(),
            primal_objective: T::zero(),
            dual_objective: T::zero(),
            relative_gap: T::zero(),
            residual: DirectResidual::new(m, n),
            primal_equality_norm: T::zero(),
            dual_equality_norm: T::zero(),
            dual_conic_norm: T::zero(),
            relative_primal_equality_norm: T::zero(),
            relative_dual_equality_norm: T::zero(),
            num_its: 0,
            dimacs_error: T::one(),
        }
    }

    pub(crate) fn initialize<M>(
        &mut self,
        problem: &DirectProblem<T, M>,
        settings: &MehrotraSettings<T>,
    ) where
        M: ConstraintMatrix<T>,
    {
        self.b_norm = problem.b.norm();
        self.c_norm = problem.c.norm();
        self.barrier_old = (0.1).as_T();
        if settings.print {
            println!("|| b ||_2 = {:e}", self.b_norm);
            println!("|| c ||_2 = {:e}", self.c_norm);
        }
    }

    /// Refresh every scalar and residual at the current iterate.  Runs
    /// once per outer iteration, in this order: barrier parameter (with
    /// the complementarity-imbalance hold), objectives and relative gap,
    /// primal residual, dual residual, conic residual, composite error.
    pub(crate) fn update<M>(
        &mut self,
        problem: &DirectProblem<T, M>,
        solution: &DirectSolution<T>,
        perm_reg: &PermanentRegularization<T>,
        settings: &MehrotraSettings<T>,
    ) where
        M: ConstraintMatrix<T>,
    {
        let degree: T = T::from_usize(problem.A.ncols()).unwrap();

        // barrier parameter, held at its previous value when the
        // complementarity products are badly imbalanced
        self.barrier = solution.x.dot(&solution.z) / degree;
        let comp_ratio = pos_orth::complement_ratio(&solution.x, &solution.z);
        self.barrier = if comp_ratio > settings.balance_tol {
            self.barrier_old
        } else {
            T::min(self.barrier, self.barrier_old)
        };
        self.barrier_old = self.barrier;

        // objectives and relative duality gap
        self.primal_objective = problem.c.dot(&solution.x);
        self.dual_objective = -problem.b.dot(&solution.y);
        self.relative_gap = T::abs(self.primal_objective - self.dual_objective)
            / (T::one() + T::abs(self.primal_objective));

        // r_b = A x - b
        self.residual.primal_equality.copy_from(&problem.b);
        problem
            .A
            .gemv(&mut self.residual.primal_equality, &solution.x, T::one(), -T::one());
        self.primal_equality_norm = self.residual.primal_equality.norm();
        self.relative_primal_equality_norm = self.primal_equality_norm / (T::one() + self.b_norm);
        self.residual
            .primal_equality
            .axpby(-perm_reg.delta_sq, &solution.y, T::one());

        // r_c = A^T y - z + c
        self.residual.dual_equality.copy_from(&problem.c);
        problem
            .A
            .gemv_t(&mut self.residual.dual_equality, &solution.y, T::one(), T::one());
        self.residual
            .dual_equality
            .axpby(-T::one(), &solution.z, T::one());
        self.dual_equality_norm = self.residual.dual_equality.norm();
        self.relative_dual_equality_norm = self.dual_equality_norm / (T::one() + self.c_norm);
        self.residual
            .dual_equality
            .axpby(perm_reg.gamma_sq, &solution.x, T::one());

        // r_mu = x o z
        self.residual.dual_conic.copy_from(&solution.z);
        self.residual.dual_conic.hadamard(&solution.x);
        self.dual_conic_norm = self.residual.dual_conic.norm();

        // now check the pieces
        self.dimacs_error = T::max(
            T::max(
                self.relative_primal_equality_norm,
                self.relative_dual_equality_norm,
            ),
            self.relative_gap,
        );

        if settings.print {
            println!("iter {}:", self.num_its);
            println!("  ||  x  ||_2 = {:e}", solution.x.norm());
            println!("  ||  y  ||_2 = {:e}", solution.y.norm());
            println!("  ||  z  ||_2 = {:e}", solution.z.norm());
            println!("  || r_b ||_2 = {:e}", self.primal_equality_norm);
            println!("  || r_c ||_2 = {:e}", self.dual_equality_norm);
            println!(
                "  || r_b ||_2 / (1 + || b ||_2) = {:e}",
                self.relative_primal_equality_norm
            );
            println!(
                "  || r_c ||_2 / (1 + || c ||_2) = {:e}",
                self.relative_dual_equality_norm
            );
            println!("  mu     = {:e}", self.barrier);
            println!("  primal = {:e}", self.primal_objective);
            println!("  dual   = {:e}", self.dual_objective);
            println!(
                "  |primal - dual| / (1 + |primal|) = {:e}",
                self.relative_gap
            );
            println!("  DIMACS: {:e}", self.dimacs_error);
        }
    }

    /// Residuals of a computed correction against the linearized KKT
    /// conditions.  Diagnostic only.
    pub(crate) fn print_residuals<M>(
        &self,
        problem: &DirectProblem<T, M>,
        solution: &DirectSolution<T>,
        correction: &DirectSolution<T>,
        perm_reg: &PermanentRegularization<T>,
    ) where
        M: ConstraintMatrix<T>,
    {
        let mut error = self.residual.clone();
        let mut prod = vec![T::zero(); solution.x.len()];

        // A dx - delta^2 dy should cancel r_b
        problem
            .A
            .gemv(&mut error.primal_equality, &correction.x, T::one(), T::one());
        error
            .primal_equality
            .axpby(-perm_reg.delta_sq, &correction.y, T::one());
        let dx_error_norm = error.primal_equality.norm();

        // gamma^2 dx + A^T dy - dz should cancel r_c
        problem
            .A
            .gemv_t(&mut error.dual_equality, &correction.y, T::one(), T::one());
        error
            .dual_equality
            .axpby(perm_reg.gamma_sq, &correction.x, T::one());
        error
            .dual_equality
            .axpby(-T::one(), &correction.z, T::one());
        let dy_error_norm = error.dual_equality.norm();

        // x o dz + z o dx should cancel r_mu
        prod.copy_from(&correction.z);
        prod.hadamard(&solution.x);
        error.dual_conic.axpby(T::one(), &prod, T::one());
        prod.copy_from(&correction.x);
        prod.hadamard(&solution.z);
        error.dual_conic.axpby(T::one(), &prod, T::one());
        let dz_error_norm = error.dual_conic.norm();

        println!(
            "|| dxError ||_2 / (1 + || r_b ||_2) = {:e}",
            dx_error_norm / (T::one() + self.primal_equality_norm)
        );
        println!(
            "|| dyError ||_2 / (1 + || r_c ||_2) = {:e}",
            dy_error_norm / (T::one() + self.dual_equality_norm)
        );
        println!(
            "|| dzError ||_2 / (1 + || r_h ||_2) = {:e}",
            dz_error_norm / (T::one() + self.dual_conic_norm)
        );
    }
}
