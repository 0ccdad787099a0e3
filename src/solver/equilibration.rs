#![allow(non_snake_case)]
//! Outer Ruiz equilibration of the problem data.

use crate::algebra::*;
use crate::solver::{ConstraintMatrix, DirectProblem, DirectSolution, MehrotraSettings};

/// Scalings applied to the problem before the IPM runs, retained so
/// that [`undo_equilibration`] can restore results exactly.
///
/// The equilibrated data satisfies
/// `A_eq = diag(row_scale)⁻¹ A diag(col_scale)⁻¹`,
/// `b_eq = b / (row_scale * b_scale)` and
/// `c_eq = c / (col_scale * c_scale)`.
#[derive(Debug, Clone)]
pub struct DirectEquilibration<T> {
    pub b_scale: T,
    pub c_scale: T,
    pub row_scale: Vec<T>,
    pub col_scale: Vec<T>,
}

impl<T> DirectEquilibration<T>
where
    T: FloatT,
{
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            b_scale: T::one(),
            c_scale: T::one(),
            row_scale: vec![T::one(); m],
            col_scale: vec![T::one(); n],
        }
    }
}

/// Equilibrate a copy of the problem (and of any warm-start solution),
/// returning the scalings applied.
pub fn equilibrate<T, M>(
    problem: &DirectProblem<T, M>,
    solution: &DirectSolution<T>,
    settings: &MehrotraSettings<T>,
) -> (DirectProblem<T, M>, DirectSolution<T>, DirectEquilibration<T>)
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = problem.A.size();
    let mut eq_problem = problem.clone();
    let mut eq_solution = solution.clone();
    let mut equilibration = DirectEquilibration::new(m, n);

    ruiz_equil(
        &mut eq_problem.A,
        &mut equilibration.row_scale,
        &mut equilibration.col_scale,
        settings.ruiz_max_iter,
    );

    let row_scale = &equilibration.row_scale;
    let col_scale = &equilibration.col_scale;

    diagonal_solve(&mut eq_problem.b, row_scale);
    diagonal_solve(&mut eq_problem.c, col_scale);
    if settings.primal_init {
        eq_solution.x.hadamard(col_scale);
    }
    if settings.dual_init {
        eq_solution.y.hadamard(row_scale);
        diagonal_solve(&mut eq_solution.z, col_scale);
    }

    // rescale ||b||_max and ||c||_max to roughly one (similar to PDCO)
    equilibration.b_scale = T::max(eq_problem.b.norm_inf(), T::one());
    equilibration.c_scale = T::max(eq_problem.c.norm_inf(), T::one());
    eq_problem.b.scale(T::recip(equilibration.b_scale));
    eq_problem.c.scale(T::recip(equilibration.c_scale));
    if settings.primal_init {
        eq_solution.x.scale(T::recip(equilibration.b_scale));
    }
    if settings.dual_init {
        eq_solution.y.scale(T::recip(equilibration.c_scale));
        eq_solution.z.scale(T::recip(equilibration.c_scale));
    }

    (eq_problem, eq_solution, equilibration)
}

/// Invert the equilibration transforms, writing the result onto the
/// caller's solution.
pub fn undo_equilibration<T>(
    eq_solution: &DirectSolution<T>,
    equilibration: &DirectEquilibration<T>,
    solution: &mut DirectSolution<T>,
) where
    T: FloatT,
{
    solution.x.copy_from(&eq_solution.x);
    solution.y.copy_from(&eq_solution.y);
    solution.z.copy_from(&eq_solution.z);

    solution.x.scale(equilibration.b_scale);
    solution.y.scale(equilibration.c_scale);
    solution.z.scale(equilibration.c_scale);
    diagonal_solve(&mut solution.x, &equilibration.col_scale);
    diagonal_solve(&mut solution.y, &equilibration.row_scale);
    solution.z.hadamard(&equilibration.col_scale);
}

// x ./= d
fn diagonal_solve<T: FloatT>(x: &mut [T], d: &[T]) {
    assert_eq!(x.len(), d.len());
    for (x, &d) in x.iter_mut().zip(d) {
        *x /= d;
    }
}

// Ruiz equilibration: repeatedly scale rows and columns of A by the
// inverse square roots of their infinity norms, accumulating the
// scalings.  Rows or columns that are entirely zero are left alone.
fn ruiz_equil<T, M>(A: &mut M, row_scale: &mut [T], col_scale: &mut [T], max_iter: u32)
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = A.size();
    let mut rwork = vec![T::zero(); m];
    let mut cwork = vec![T::zero(); n];

    row_scale.set(T::one());
    col_scale.set(T::one());

    for _ in 0..max_iter {
        A.row_norms(&mut rwork);
        rwork.scalarop(|x| if x == T::zero() { T::one() } else { x });

        // accumulate scale *sqrt(norm)* before rwork becomes its inverse
        for (scale, &norm) in row_scale.iter_mut().zip(rwork.iter()) {
            *scale *= T::sqrt(norm);
        }
        rwork.rsqrt();
        A.lscale(&rwork);

        A.col_norms(&mut cwork);
        cwork.scalarop(|x| if x == T::zero() { T::one() } else { x });

        for (scale, &norm) in col_scale.iter_mut().zip(cwork.iter()) {
            *scale *= T::sqrt(norm);
        }
        cwork.rsqrt();
        A.rscale(&cwork);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::MehrotraSettingsBuilder;

    fn problem_and_solution() -> (DirectProblem<f64, Matrix<f64>>, DirectSolution<f64>) {
        let A = Matrix::from(&[
            [4., 0., 100.], //
            [0., 0.25, 1.], //
        ]);
        let b = vec![8., 0.5];
        let c = vec![1., 200., 3.];
        let problem = DirectProblem::new(A, b, c);

        let mut solution = DirectSolution::new(2, 3);
        solution.x = vec![1., 2., 3.];
        solution.y = vec![-1., 1.];
        solution.z = vec![0.5, 1.5, 2.5];
        (problem, solution)
    }

    #[test]
    fn test_norms_balance() {
        let (problem, solution) = problem_and_solution();
        let settings = MehrotraSettings::default();
        let (eq_problem, _, _) = equilibrate(&problem, &solution, &settings);

        let mut rnorms = vec![0.; 2];
        let mut cnorms = vec![0.; 3];
        eq_problem.A.row_norms(&mut rnorms);
        eq_problem.A.col_norms(&mut cnorms);
        for &v in rnorms.iter().chain(cnorms.iter()) {
            assert!(v > 0.2 && v < 5.);
        }
    }

    #[test]
    fn test_round_trip() {
        let (problem, solution) = problem_and_solution();
        let settings = MehrotraSettingsBuilder::default()
            .primal_init(true)
            .dual_init(true)
            .build()
            .unwrap();

        let (_, eq_solution, equilibration) = equilibrate(&problem, &solution, &settings);

        let mut restored = DirectSolution::new(2, 3);
        undo_equilibration(&eq_solution, &equilibration, &mut restored);

        assert!(restored.x.dist(&solution.x) <= 1e-12);
        assert!(restored.y.dist(&solution.y) <= 1e-12);
        assert!(restored.z.dist(&solution.z) <= 1e-12);
    }
}
