#![allow(non_snake_case)]

use orthant::algebra::*;
use orthant::solver::*;

fn textbook_problem() -> DirectProblem<f64, CscMatrix<f64>> {
    let A = CscMatrix::from(&[
        [1., 0., 1., 0.], //
        [0., 2., 0., 1.], //
    ]);
    DirectProblem::new(A, vec![4., 12.], vec![-3., -5., 0., 0.])
}

fn test_settings() -> MehrotraSettingsBuilder<f64> {
    let mut builder = MehrotraSettingsBuilder::default();
    builder
        .max_step_ratio(0.99)
        .target_tol(1e-8)
        .min_tol(1e-6)
        .system(KKTSystemKind::Augmented);
    builder
}

// re-solving from a slightly perturbed copy of the optimum must use
// strictly fewer iterations than the cold solve did
#[test]
fn test_warm_start_round_trip() {
    let problem = textbook_problem();

    let mut solution = DirectSolution::new(2, 4);
    let settings = test_settings().build().unwrap();
    let cold = mehrotra(&problem, &mut solution, &settings).unwrap();

    // perturb each component and resubmit as a warm start
    solution.x.iter_mut().for_each(|v| *v += 1e-6);
    solution.y.iter_mut().for_each(|v| *v += 1e-6);
    solution.z.iter_mut().for_each(|v| *v += 1e-6);

    let warm_settings = test_settings()
        .primal_init(true)
        .dual_init(true)
        .build()
        .unwrap();
    let warm = mehrotra(&problem, &mut solution, &warm_settings).unwrap();

    assert!(
        warm.iterations < cold.iterations,
        "warm start took {} iterations, cold start {}",
        warm.iterations,
        cold.iterations
    );
    assert!(solution.x.dist(&[4., 6., 0., 0.]) <= 1e-5);
}
