//! Starting-point synthesis for the IPM.
//!
//! When the caller does not supply warm starts, the primal point is the
//! minimal-norm solution of `Ax = b` and the dual pair is the least
//! squares solution of `Aᵀy + c = z`, both obtained from one augmented
//! KKT system at the unit scaling point.  The points are then shifted
//! into the interior of the cone.

use crate::algebra::*;
use crate::solver::kkt::{KKTEngine, KKTSystemKind};
use crate::solver::{
    pos_orth, ConstraintMatrix, DirectProblem, DirectSolution, MehrotraError, MehrotraSettings,
};

pub(crate) fn initialize<T, M>(
    problem: &DirectProblem<T, M>,
    solution: &mut DirectSolution<T>,
    main_engine: Option<&mut M::Engine>,
    settings: &MehrotraSettings<T>,
    two_norm_est: T,
) -> Result<(), MehrotraError<T>>
where
    T: FloatT,
    M: ConstraintMatrix<T>,
{
    let (m, n) = problem.A.size();

    // warm starts must already sit strictly inside the cone
    let x_outside = if settings.primal_init {
        pos_orth::num_outside(&solution.x)
    } else {
        0
    };
    let z_outside = if settings.dual_init {
        pos_orth::num_outside(&solution.z)
    } else {
        0
    };
    if x_outside > 0 || z_outside > 0 {
        return Err(MehrotraError::NonPositiveIterate {
            x_outside,
            z_outside,
        });
    }
    if settings.primal_init && settings.dual_init {
        return Ok(());
    }

    // a factorization or solve failure this early is always fatal
    let min_tol_failure = |_| MehrotraError::MinTolNotAchieved {
        min_tol: settings.min_tol,
    };

    // the augmented system at the unit scaling point.  The caller's
    // engine is reused when the IPM itself runs on the augmented
    // formulation, so its symbolic analysis carries over to the loop.
    let mut local_engine;
    let engine = match main_engine {
        Some(engine) => engine,
        None => {
            local_engine = problem
                .A
                .new_engine(KKTSystemKind::Augmented, settings, two_norm_est);
            &mut local_engine
        }
    };

    let ones = vec![T::one(); n];
    engine
        .update(&problem.A, &ones, &ones, T::one())
        .map_err(min_tol_failure)?;

    let mut d = vec![T::zero(); n + m];

    if !settings.primal_init {
        // minimal-norm x subject to Ax = b
        d[0..n].set(T::zero());
        d[n..].copy_from(&problem.b);
        engine.solve(&mut d).map_err(min_tol_failure)?;
        solution.x.copy_from(&d[0..n]);
    }

    if !settings.dual_init {
        // least squares (y, z): the first block solves to -z
        d[0..n].scalarop_from(|v| -v, &problem.c);
        d[n..].set(T::zero());
        engine.solve(&mut d).map_err(min_tol_failure)?;
        solution.y.copy_from(&d[n..]);
        solution.z.scalarop_from(|v| -v, &d[0..n]);
    }

    if settings.standard_shift {
        standard_shift(solution, settings);
    } else {
        let floor = T::sqrt(T::epsilon());
        if !settings.primal_init {
            solution.x.clip(floor, T::infinity());
        }
        if !settings.dual_init {
            solution.z.clip(floor, T::infinity());
        }
    }

    Ok(())
}

// Mehrotra's starting-point heuristic: push each synthesized vector
// far enough into the cone that the pair starts with balanced,
// strictly positive complementarity.
fn standard_shift<T: FloatT>(solution: &mut DirectSolution<T>, settings: &MehrotraSettings<T>) {
    let c3_2: T = (1.5).as_T();
    let half: T = (0.5).as_T();

    let delta_x = T::max(-c3_2 * solution.x.minimum(), T::zero());
    let delta_z = T::max(-c3_2 * solution.z.minimum(), T::zero());

    // inner product and sums of the base-shifted pair
    let mut dot = T::zero();
    let mut sum_x = T::zero();
    let mut sum_z = T::zero();
    for (&xi, &zi) in solution.x.iter().zip(&solution.z) {
        let xs = xi + delta_x;
        let zs = zi + delta_z;
        dot += xs * zs;
        sum_x += xs;
        sum_z += zs;
    }

    if !settings.primal_init {
        let mut shift = delta_x;
        if sum_z > T::zero() {
            shift += half * dot / sum_z;
        }
        if solution.x.minimum() + shift <= T::zero() {
            // degenerate complementarity, fall back to a unit push
            shift = delta_x + T::one();
        }
        solution.x.translate(shift);
    }

    if !settings.dual_init {
        let mut shift = delta_z;
        if sum_x > T::zero() {
            shift += half * dot / sum_x;
        }
        if solution.z.minimum() + shift <= T::zero() {
            shift = delta_z + T::one();
        }
        solution.z.translate(shift);
    }
}
