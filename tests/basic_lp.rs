#![allow(non_snake_case)]

use orthant::algebra::*;
use orthant::solver::*;

fn test_settings() -> MehrotraSettingsBuilder<f64> {
    let mut builder = MehrotraSettingsBuilder::default();
    builder
        .max_step_ratio(0.99)
        .target_tol(1e-8)
        .min_tol(1e-6)
        .system(KKTSystemKind::Augmented)
        .mehrotra(true);
    builder
}

// min x1+x2+x3  s.t. x = (1,1,1), x >= 0.  The unique primal optimum
// is x = 1; the dual optimum saturates the bound y >= -1 with zero
// slack z.
#[test]
fn test_trivial_diagonal_dense() {
    let A = Matrix::<f64>::identity(3);
    let problem = DirectProblem::new(A, vec![1.; 3], vec![1.; 3]);
    let mut solution = DirectSolution::new(3, 3);
    let settings = test_settings().build().unwrap();

    let report = mehrotra(&problem, &mut solution, &settings).unwrap();

    assert!(report.iterations <= 20);
    assert!(solution.x.dist(&[1., 1., 1.]) <= 1e-6);
    assert!(solution.y.dist(&[-1., -1., -1.]) <= 1e-6);
    assert!(solution.z.norm() <= 1e-6);
    assert!((report.primal_objective - 3.).abs() <= 1e-6);
    assert!((report.dual_objective - 3.).abs() <= 1e-6);
}

#[test]
fn test_trivial_diagonal_sparse() {
    let A = CscMatrix::<f64>::identity(3);
    let problem = DirectProblem::new(A, vec![1.; 3], vec![1.; 3]);
    let mut solution = DirectSolution::new(3, 3);
    let settings = test_settings().build().unwrap();

    let report = mehrotra(&problem, &mut solution, &settings).unwrap();

    assert!(report.iterations <= 20);
    assert!(solution.x.dist(&[1., 1., 1.]) <= 1e-6);
    assert!((report.primal_objective - 3.).abs() <= 1e-6);
}

#[test]
fn test_trivial_diagonal_all_systems() {
    for system in [
        KKTSystemKind::Full,
        KKTSystemKind::Augmented,
        KKTSystemKind::Normal,
    ] {
        let A = CscMatrix::<f64>::identity(3);
        let problem = DirectProblem::new(A, vec![1.; 3], vec![1.; 3]);
        let mut solution = DirectSolution::new(3, 3);
        let settings = test_settings().system(system).build().unwrap();

        let report = mehrotra(&problem, &mut solution, &settings)
            .unwrap_or_else(|e| panic!("{system:?} failed: {e}"));
        assert!(
            solution.x.dist(&[1., 1., 1.]) <= 1e-6,
            "{system:?} missed the optimum"
        );
        assert!((report.primal_objective - 3.).abs() <= 1e-6);
    }
}

// one equality constraint shared by two variables: every point on the
// segment x1 + x2 = 1 is optimal, and the iteration settles on its
// analytic center
#[test]
fn test_degenerate_ray() {
    let A = CscMatrix::from(&[[1., 1.]]);
    let problem = DirectProblem::new(A, vec![1.], vec![1., 1.]);
    let mut solution = DirectSolution::new(1, 2);
    let settings = test_settings().build().unwrap();

    let report = mehrotra(&problem, &mut solution, &settings).unwrap();

    assert!(solution.x.dist(&[0.5, 0.5]) <= 1e-5);
    assert!((report.primal_objective - 1.).abs() <= 1e-6);
    assert!((solution.y[0] + 1.).abs() <= 1e-5);
    assert!(solution.z.norm() <= 1e-5);
}

// a small textbook LP with a known optimum:
//   min -3 x1 - 5 x2
//   s.t. x1 + s1 = 4,  2 x2 + s2 = 12,  all variables >= 0
#[test]
fn test_textbook_lp() {
    let A = CscMatrix::from(&[
        [1., 0., 1., 0.], //
        [0., 2., 0., 1.], //
    ]);
    let b = vec![4., 12.];
    let c = vec![-3., -5., 0., 0.];
    let problem = DirectProblem::new(A, b, c);
    let mut solution = DirectSolution::new(2, 4);
    let settings = test_settings().build().unwrap();

    let report = mehrotra(&problem, &mut solution, &settings).unwrap();

    assert!(report.iterations <= 40);
    assert!(report.dimacs_error <= 1e-7);
    assert!(solution.x.dist(&[4., 6., 0., 0.]) <= 1e-5);
    assert!((report.primal_objective + 42.).abs() <= 1e-5);
    assert!((report.dual_objective + 42.).abs() <= 1e-5);
}

// identical problem, dense storage
#[test]
fn test_textbook_lp_dense() {
    let A = Matrix::from(&[
        [1., 0., 1., 0.], //
        [0., 2., 0., 1.], //
    ]);
    let b = vec![4., 12.];
    let c = vec![-3., -5., 0., 0.];
    let problem = DirectProblem::new(A, b, c);
    let mut solution = DirectSolution::new(2, 4);
    let settings = test_settings().build().unwrap();

    let report = mehrotra(&problem, &mut solution, &settings).unwrap();
    assert!((report.primal_objective + 42.).abs() <= 1e-5);
}

// a zero column leaves x1 unconstrained except for the cone and its
// cost; the solve must still terminate, by convergence or by a clean
// min-tolerance report
#[test]
fn test_zero_column_terminates() {
    let A = CscMatrix::from(&[[0., 1.]]);
    let problem = DirectProblem::new(A, vec![1.], vec![1., 1.]);
    let mut solution = DirectSolution::new(1, 2);
    solution.x = vec![0.5, 1.];
    solution.y = vec![0.];
    solution.z = vec![1., 1.];
    let settings = test_settings()
        .primal_init(true)
        .dual_init(true)
        .build()
        .unwrap();

    match mehrotra(&problem, &mut solution, &settings) {
        Ok(report) => {
            assert!((report.primal_objective - 1.).abs() <= 1e-5);
            assert!(solution.x.dist(&[0., 1.]) <= 1e-4);
        }
        // a clean non-convergence report also counts as terminating
        Err(_) => {}
    }
}

// solutions must agree with and without the outer equilibration
#[test]
fn test_equilibration_invariance() {
    let A = CscMatrix::from(&[
        [100., 0., 1., 0.],   //
        [0., 0.02, 0., 1.],   //
    ]);
    let b = vec![400., 0.12];
    let c = vec![-3., -5., 0., 0.];

    let mut plain = DirectSolution::new(2, 4);
    let mut scaled = DirectSolution::new(2, 4);

    let problem = DirectProblem::new(A, b, c);
    let on = test_settings().outer_equil(true).build().unwrap();
    let off = test_settings().outer_equil(false).build().unwrap();

    mehrotra(&problem, &mut scaled, &on).unwrap();
    mehrotra(&problem, &mut plain, &off).unwrap();

    assert!(scaled.x.dist(&plain.x) <= 1e-4);
}

#[test]
fn test_deprecated_interface() {
    #![allow(deprecated)]

    let A = CscMatrix::<f64>::identity(2);
    let b = vec![1., 1.];
    let c = vec![1., 1.];
    let (mut x, mut y, mut z) = (vec![0.; 2], vec![0.; 2], vec![0.; 2]);
    let settings = test_settings().build().unwrap();

    let report = mehrotra_unpacked(&A, &b, &c, &mut x, &mut y, &mut z, &settings).unwrap();
    assert!(x.dist(&[1., 1.]) <= 1e-6);
    assert!((report.primal_objective - 2.).abs() <= 1e-6);
}
