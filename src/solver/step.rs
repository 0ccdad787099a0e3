//! Step lengths, centrality, and the combined corrector right-hand side.

use crate::algebra::*;
use crate::solver::{pos_orth, DirectResidual, DirectSolution, MehrotraSettings};

/// Affine step lengths to the cone boundary for the primal and dual
/// iterates, optionally forced equal.
pub(crate) fn affine_step_lengths<T: FloatT>(
    solution: &DirectSolution<T>,
    affine: &DirectSolution<T>,
    settings: &MehrotraSettings<T>,
) -> (T, T) {
    let mut alpha_pri = pos_orth::max_step(&solution.x, &affine.x, T::one());
    let mut alpha_dual = pos_orth::max_step(&solution.z, &affine.z, T::one());
    if settings.force_same_step {
        alpha_pri = T::min(alpha_pri, alpha_dual);
        alpha_dual = alpha_pri;
    }
    (alpha_pri, alpha_dual)
}

/// The centrality parameter σ ∈ [0, 1].
///
/// The Mehrotra rule is the classical `(μ_aff/μ)³`; the step-length
/// rule drives σ jointly from the affine step lengths and the achieved
/// barrier reduction, dropping centering as soon as long affine steps
/// become available.
pub(crate) fn centrality<T: FloatT>(
    barrier: T,
    barrier_affine: T,
    alpha_aff_pri: T,
    alpha_aff_dual: T,
    settings: &MehrotraSettings<T>,
) -> T {
    let sigma = if settings.step_length_sigma {
        let alpha_min = T::min(alpha_aff_pri, alpha_aff_dual);
        T::min(T::powi(T::one() - alpha_min, 3), barrier_affine / barrier)
    } else {
        T::powi(barrier_affine / barrier, 3)
    };
    sigma.clip(T::zero(), T::one())
}

/// Turn the affine residuals into the combined (predictor+corrector)
/// right-hand side in place: scale the equality residuals by `1−σ`,
/// recenter the conic residual by `−σμ`, and (optionally) add the
/// Mehrotra second-order cross term `Δx_aff ∘ Δz_aff`.
pub(crate) fn combined_rhs<T: FloatT>(
    residual: &mut DirectResidual<T>,
    sigma: T,
    barrier: T,
    affine: &DirectSolution<T>,
    work: &mut [T],
    settings: &MehrotraSettings<T>,
) {
    residual.primal_equality.scale(T::one() - sigma);
    residual.dual_equality.scale(T::one() - sigma);
    residual.dual_conic.translate(-sigma * barrier);
    if settings.mehrotra {
        work.copy_from(&affine.z);
        work.hadamard(&affine.x);
        residual.dual_conic.axpby(T::one(), work, T::one());
    }
}

/// Final step lengths: the `max_step_ratio` fraction of the distance
/// to the boundary, capped at one.
pub(crate) fn final_step_lengths<T: FloatT>(
    solution: &DirectSolution<T>,
    correction: &DirectSolution<T>,
    settings: &MehrotraSettings<T>,
) -> (T, T) {
    let ratio = settings.max_step_ratio;
    let mut alpha_pri = pos_orth::max_step(&solution.x, &correction.x, T::recip(ratio));
    let mut alpha_dual = pos_orth::max_step(&solution.z, &correction.z, T::recip(ratio));
    alpha_pri = T::min(ratio * alpha_pri, T::one());
    alpha_dual = T::min(ratio * alpha_dual, T::one());
    if settings.force_same_step {
        alpha_pri = T::min(alpha_pri, alpha_dual);
        alpha_dual = alpha_pri;
    }
    (alpha_pri, alpha_dual)
}

/// Advance the iterate.
pub(crate) fn apply_update<T: FloatT>(
    solution: &mut DirectSolution<T>,
    correction: &DirectSolution<T>,
    alpha_pri: T,
    alpha_dual: T,
) {
    solution.x.axpby(alpha_pri, &correction.x, T::one());
    solution.y.axpby(alpha_dual, &correction.y, T::one());
    solution.z.axpby(alpha_dual, &correction.z, T::one());
}
