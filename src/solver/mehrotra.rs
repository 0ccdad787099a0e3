#![allow(non_snake_case)]
//! The Mehrotra predictor-corrector driver.

use crate::algebra::*;
use crate::solver::kkt::{self, KKTEngine, KKTSystemKind};
use crate::solver::state::PermanentRegularization;
use crate::solver::{
    equilibrate, initial_point, pos_orth, step, undo_equilibration, ConstraintMatrix,
    DirectProblem, DirectSolution, MehrotraSettings, SolverState,
};
use crate::timers::Timers;
use thiserror::Error;

/// Failure of a [`mehrotra`] call.
///
/// Dimension mismatches between the problem and solution are treated
/// as caller errors and panic; every numerical failure mode surfaces
/// here instead.
#[derive(Error, Debug)]
pub enum MehrotraError<T: FloatT> {
    #[error("maximum number of iterations ({max_its}) exceeded without achieving minTol={min_tol:e}")]
    MaxIterations { max_its: u32, min_tol: T },
    #[error("could not achieve minimum tolerance of {min_tol:e}")]
    MinTolNotAchieved { min_tol: T },
    #[error("{x_outside} entries of x were nonpositive and {z_outside} entries of z were nonpositive")]
    NonPositiveIterate { x_outside: usize, z_outside: usize },
}

/// Summary of a converged (or min-tolerance) solve.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MehrotraReport<T> {
    /// outer iterations taken
    pub iterations: u32,
    /// composite (DIMACS) error at exit, on the equilibrated data
    pub dimacs_error: T,
    /// primal objective `cᵀx`
    pub primal_objective: T,
    /// dual objective `−bᵀy`
    pub dual_objective: T,
}

/// Solve a direct-form LP with a Mehrotra predictor-corrector
/// interior-point iteration.
///
/// The solution argument is used as a warm start when the
/// corresponding `primal_init`/`dual_init` flags are set, and carries
/// the result on return (also on the non-fatal termination paths that
/// report an error).
pub fn mehrotra<T, M>(
    problem: &DirectProblem<T, M>,
    solution: &mut DirectSolution<T>,
    settings: &MehrotraSettings<T>,
) -> Result<MehrotraReport<T>, MehrotraError<T>>
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = problem.A.size();
    assert_eq!(solution.x.len(), n, "x and A incompatible dimensions.");
    assert_eq!(solution.y.len(), m, "y and A incompatible dimensions.");
    assert_eq!(solution.z.len(), n, "z and A incompatible dimensions.");

    let report = if settings.outer_equil {
        let (eq_problem, mut eq_solution, equilibration) =
            equilibrate(problem, solution, settings);
        let report = equilibrated_mehrotra(&eq_problem, &mut eq_solution, settings);
        undo_equilibration(&eq_solution, &equilibration, solution);
        report?
    } else {
        equilibrated_mehrotra(problem, solution, settings)?
    };

    // report objectives in the caller's scaling
    let primal_objective = problem.c.dot(&solution.x);
    let dual_objective = -problem.b.dot(&solution.y);

    if settings.print {
        let gap = T::abs(primal_objective - dual_objective) / (T::one() + T::abs(primal_objective));
        println!("Exiting with:");
        println!("  ||  x  ||_2 = {:e}", solution.x.norm());
        println!("  ||  y  ||_2 = {:e}", solution.y.norm());
        println!("  ||  z  ||_2 = {:e}", solution.z.norm());
        println!("  primal = {primal_objective:e}");
        println!("  dual   = {dual_objective:e}");
        println!("  |primal - dual| / (1 + |primal|) = {gap:e}");
    }

    Ok(MehrotraReport {
        primal_objective,
        dual_objective,
        ..report
    })
}

/// Deprecated positional-argument entry point.
#[deprecated(note = "pack the data into DirectProblem/DirectSolution and call mehrotra")]
pub fn mehrotra_unpacked<T, M>(
    A: &M,
    b: &[T],
    c: &[T],
    x: &mut Vec<T>,
    y: &mut Vec<T>,
    z: &mut Vec<T>,
    settings: &MehrotraSettings<T>,
) -> Result<MehrotraReport<T>, MehrotraError<T>>
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let problem = DirectProblem::new(A.clone(), b.to_vec(), c.to_vec());
    let mut solution = DirectSolution {
        x: std::mem::take(x),
        y: std::mem::take(y),
        z: std::mem::take(z),
    };
    let result = mehrotra(&problem, &mut solution, settings);
    *x = solution.x;
    *y = solution.y;
    *z = solution.z;
    result
}

// the state machine on already-equilibrated data
fn equilibrated_mehrotra<T, M>(
    problem: &DirectProblem<T, M>,
    solution: &mut DirectSolution<T>,
    settings: &MehrotraSettings<T>,
) -> Result<MehrotraReport<T>, MehrotraError<T>>
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = problem.A.size();
    let system = settings.system;
    let mut timers = Timers::new();

    // the normal equations run unregularized
    let perm_reg = match system {
        KKTSystemKind::Normal => PermanentRegularization {
            gamma_sq: T::zero(),
            delta_sq: T::zero(),
        },
        _ => PermanentRegularization {
            gamma_sq: settings.reg0_perm * settings.reg0_perm,
            delta_sq: settings.reg1_perm * settings.reg1_perm,
        },
    };

    let two_norm_est = problem.A.norm_two_estimate(settings.basis_size);
    if settings.print {
        println!("|| A ||_2 estimate: {two_norm_est:e}");
    }

    let mut state = SolverState::new(m, n);
    state.initialize(problem, settings);

    let mut engine = problem.A.new_engine(system, settings, two_norm_est);

    // the initializer solves an augmented system, so its symbolic work
    // transfers to the loop only under the augmented formulation
    timers.time("initialization", || {
        if system == KKTSystemKind::Augmented {
            initial_point::initialize(problem, solution, Some(&mut engine), settings, two_norm_est)
        } else {
            initial_point::initialize(problem, solution, None, settings, two_norm_est)
        }
    })?;

    let mut affine = DirectSolution::<T>::new(m, n);
    let mut correction = DirectSolution::<T>::new(m, n);
    let mut d = vec![T::zero(); system.system_size(m, n)];
    let mut w = vec![T::zero(); n];
    let mut work_n = vec![T::zero(); n];

    // a failed factorization or solve is benign only once the iterate
    // is already good enough to report
    macro_rules! attempt {
        ($call:expr) => {
            if $call.is_err() {
                if state.dimacs_error <= settings.min_tol {
                    break;
                }
                return Err(MehrotraError::MinTolNotAchieved {
                    min_tol: settings.min_tol,
                });
            }
        };
    }

    for num_its in 0..=settings.max_its {
        state.num_its = num_its;

        // the iterate must stay strictly inside the cone
        let x_outside = pos_orth::num_outside(&solution.x);
        let z_outside = pos_orth::num_outside(&solution.z);
        if x_outside > 0 || z_outside > 0 {
            return Err(MehrotraError::NonPositiveIterate {
                x_outside,
                z_outside,
            });
        }

        state.update(problem, solution, &perm_reg, settings);

        // check for convergence
        if state.dimacs_error <= settings.target_tol {
            break;
        }
        if num_its == settings.max_its && !(state.dimacs_error <= settings.min_tol) {
            return Err(MehrotraError::MaxIterations {
                max_its: settings.max_its,
                min_tol: settings.min_tol,
            });
        }

        // scaling point, used to pick the inner equilibration
        pos_orth::nesterov_todd(&solution.x, &solution.z, &mut w);
        let w_max_norm = w.norm_inf();

        // factor once per iteration
        attempt!(timers.time("factor", || engine.update(
            &problem.A,
            &solution.x,
            &solution.z,
            w_max_norm
        )));

        // affine (predictor) direction
        build_rhs(system, problem, solution, &state, &perm_reg, &mut work_n, &mut d);
        attempt!(timers.time("solve", || engine.solve(&mut d)));
        expand(system, problem, solution, &state, &perm_reg, &d, &mut affine);

        if settings.check_residuals && settings.print {
            state.print_residuals(problem, solution, &affine, &perm_reg);
        }

        // centrality parameter from the affine step
        let (alpha_aff_pri, alpha_aff_dual) = step::affine_step_lengths(solution, &affine, settings);
        if settings.print {
            println!("alphaAffPri = {alpha_aff_pri:e}, alphaAffDual = {alpha_aff_dual:e}");
        }

        // correction.x and correction.z double as temporaries for the
        // affine trial point
        correction.x.waxpby(alpha_aff_pri, &affine.x, T::one(), &solution.x);
        correction.z.waxpby(alpha_aff_dual, &affine.z, T::one(), &solution.z);
        state.barrier_affine = correction.x.dot(&correction.z) / T::from_usize(n).unwrap();
        if settings.print {
            println!(
                "barrierAffine = {:e}, barrier = {:e}",
                state.barrier_affine, state.barrier
            );
        }
        state.sigma = step::centrality(
            state.barrier,
            state.barrier_affine,
            alpha_aff_pri,
            alpha_aff_dual,
            settings,
        );
        if settings.print {
            println!("sigma = {:e}", state.sigma);
        }

        // combined (corrector) direction against the same factors
        step::combined_rhs(
            &mut state.residual,
            state.sigma,
            state.barrier,
            &affine,
            &mut work_n,
            settings,
        );
        build_rhs(system, problem, solution, &state, &perm_reg, &mut work_n, &mut d);
        attempt!(timers.time("solve", || engine.solve(&mut d)));
        expand(system, problem, solution, &state, &perm_reg, &d, &mut correction);

        // advance
        let (alpha_pri, alpha_dual) = step::final_step_lengths(solution, &correction, settings);
        if settings.print {
            println!("alphaPri = {alpha_pri:e}, alphaDual = {alpha_dual:e}");
        }
        step::apply_update(solution, &correction, alpha_pri, alpha_dual);

        if alpha_pri == T::zero() && alpha_dual == T::zero() {
            if state.dimacs_error <= settings.min_tol {
                break;
            }
            return Err(MehrotraError::MinTolNotAchieved {
                min_tol: settings.min_tol,
            });
        }
    }

    if settings.time {
        timers.print();
    }

    Ok(MehrotraReport {
        iterations: state.num_its,
        dimacs_error: state.dimacs_error,
        primal_objective: state.primal_objective,
        dual_objective: state.dual_objective,
    })
}

fn build_rhs<T, M>(
    system: KKTSystemKind,
    problem: &DirectProblem<T, M>,
    solution: &DirectSolution<T>,
    state: &SolverState<T>,
    perm_reg: &PermanentRegularization<T>,
    work_n: &mut [T],
    d: &mut [T],
) where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    match system {
        KKTSystemKind::Full => kkt::kkt_rhs(&state.residual, &solution.z, d),
        KKTSystemKind::Augmented => kkt::augmented_kkt_rhs(&solution.x, &state.residual, d),
        KKTSystemKind::Normal => kkt::normal_kkt_rhs(
            &problem.A,
            perm_reg.gamma_sq,
            &solution.x,
            &solution.z,
            &state.residual,
            work_n,
            d,
        ),
    }
}

fn expand<T, M>(
    system: KKTSystemKind,
    problem: &DirectProblem<T, M>,
    solution: &DirectSolution<T>,
    state: &SolverState<T>,
    perm_reg: &PermanentRegularization<T>,
    d: &[T],
    direction: &mut DirectSolution<T>,
) where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = problem.A.size();
    match system {
        KKTSystemKind::Full => kkt::expand_solution(
            m,
            n,
            d,
            &mut direction.x,
            &mut direction.y,
            &mut direction.z,
        ),
        KKTSystemKind::Augmented => kkt::expand_augmented_solution(
            &solution.x,
            &solution.z,
            &state.residual.dual_conic,
            d,
            &mut direction.x,
            &mut direction.y,
            &mut direction.z,
        ),
        KKTSystemKind::Normal => kkt::expand_normal_solution(
            &problem.A,
            perm_reg.gamma_sq,
            &solution.x,
            &solution.z,
            &state.residual,
            d,
            &mut direction.x,
            &mut direction.y,
            &mut direction.z,
        ),
    }
}
