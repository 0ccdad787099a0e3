#![allow(non_snake_case)]

use orthant::algebra::*;
use orthant::solver::*;

// x1 + x2 = -1 has no solution in the cone; the driver must report
// a runtime error rather than stall silently
#[test]
fn test_infeasible_errors() {
    let A = CscMatrix::from(&[[1., 1.]]);
    let problem = DirectProblem::new(A, vec![-1.], vec![1., 1.]);
    let mut solution = DirectSolution::new(1, 2);

    let settings = MehrotraSettingsBuilder::default()
        .max_step_ratio(0.99)
        .target_tol(1e-8)
        .min_tol(1e-6)
        .max_its(50)
        .system(KKTSystemKind::Augmented)
        .build()
        .unwrap();

    let result = mehrotra(&problem, &mut solution, &settings);
    assert!(result.is_err());
}

// same data through the dense path
#[test]
fn test_infeasible_errors_dense() {
    let A = Matrix::from(&[[1., 1.]]);
    let problem = DirectProblem::new(A, vec![-1.], vec![1., 1.]);
    let mut solution = DirectSolution::new(1, 2);

    let settings = MehrotraSettingsBuilder::default()
        .max_its(50)
        .build()
        .unwrap();

    assert!(mehrotra(&problem, &mut solution, &settings).is_err());
}
