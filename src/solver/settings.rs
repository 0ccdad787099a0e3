use crate::algebra::*;
use crate::solver::kkt::KKTSystemKind;
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Iterative refinement controls for the KKT solves.
#[derive(Builder, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RefinementSettings<T: FloatT> {
    ///relative residual reduction at which refinement stops
    #[builder(default = "T::epsilon().powf((0.6).as_T())")]
    pub rel_tol: T,

    ///maximum number of refinement steps
    #[builder(default = "50")]
    pub max_refine_its: u32,

    ///print per-step refinement residuals
    #[builder(default = "false")]
    pub progress: bool,

    ///time the refinement loop
    #[builder(default = "false")]
    pub time: bool,
}

impl<T> Default for RefinementSettings<T>
where
    T: FloatT,
{
    fn default() -> Self {
        RefinementSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// Controls for [`mehrotra`](crate::solver::mehrotra), mirroring the
/// options recognized by the IPM driver.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MehrotraSettings<T: FloatT> {
    ///the caller's x is a valid warm start
    #[builder(default = "false")]
    pub primal_init: bool,

    ///the caller's (y, z) are a valid warm start
    #[builder(default = "false")]
    pub dual_init: bool,

    ///run Ruiz equilibration on the problem before solving
    #[builder(default = "true")]
    pub outer_equil: bool,

    ///which KKT linearization to factor
    #[builder(default = "KKTSystemKind::Augmented")]
    pub system: KKTSystemKind,

    ///include the second-order Mehrotra cross term in the corrector
    #[builder(default = "true")]
    pub mehrotra: bool,

    ///require equal primal and dual step lengths
    #[builder(default = "false")]
    pub force_same_step: bool,

    ///derive σ from the affine step lengths rather than the Mehrotra cube rule
    #[builder(default = "true")]
    pub step_length_sigma: bool,

    ///use the standard Mehrotra shift when synthesizing a starting point
    #[builder(default = "true")]
    pub standard_shift: bool,

    ///fraction of the step to the cone boundary actually taken
    #[builder(default = "(0.99).as_T()")]
    pub max_step_ratio: T,

    ///maximum number of outer iterations
    #[builder(default = "100")]
    pub max_its: u32,

    ///composite error at which the iteration stops as converged
    #[builder(default = "T::epsilon().powf((0.5).as_T())")]
    pub target_tol: T,

    ///composite error the solver must reach for failures to be fatal
    #[builder(default = "T::epsilon().powf((0.3).as_T())")]
    pub min_tol: T,

    ///permanent primal regularization γ
    #[builder(default = "T::epsilon().powf((0.35).as_T())")]
    pub reg0_perm: T,

    ///permanent dual regularization δ
    #[builder(default = "T::epsilon().powf((0.35).as_T())")]
    pub reg1_perm: T,

    ///permanent conic regularization β
    #[builder(default = "T::epsilon().powf((0.35).as_T())")]
    pub reg2_perm: T,

    ///temporary primal regularization γ
    #[builder(default = "T::epsilon().powf((0.25).as_T())")]
    pub reg0_tmp: T,

    ///temporary dual regularization δ
    #[builder(default = "T::epsilon().powf((0.25).as_T())")]
    pub reg1_tmp: T,

    ///temporary conic regularization β
    #[builder(default = "T::epsilon().powf((0.25).as_T())")]
    pub reg2_tmp: T,

    ///‖w‖_∞ at which symmetric Ruiz equilibration of the KKT matrix runs
    #[builder(default = "T::epsilon().powf((-0.25).as_T())")]
    pub ruiz_equil_tol: T,

    ///‖w‖_∞ at which symmetric diagonal equilibration of the KKT matrix runs
    #[builder(default = "T::epsilon().powf((-0.15).as_T())")]
    pub diag_equil_tol: T,

    ///iterations of symmetric Ruiz equilibration
    #[builder(default = "3")]
    pub ruiz_max_iter: u32,

    ///subspace size for the 2-norm estimate of A
    #[builder(default = "15")]
    pub basis_size: usize,

    ///refine against the unregularized KKT matrix to full precision
    #[builder(default = "true")]
    pub resolve_reg: bool,

    ///complementarity imbalance above which the barrier parameter holds
    #[builder(default = "T::epsilon().powf((-0.19).as_T())")]
    pub balance_tol: T,

    ///nested iterative refinement controls
    #[builder(default)]
    pub solve: RefinementSettings<T>,

    ///per-iteration diagnostics
    #[builder(default = "false")]
    pub print: bool,

    ///accumulate and print section timings
    #[builder(default = "false")]
    pub time: bool,

    ///check the residuals of each computed correction (requires `print`)
    #[builder(default = "false")]
    pub check_residuals: bool,
}

impl<T> Default for MehrotraSettings<T>
where
    T: FloatT,
{
    fn default() -> MehrotraSettings<T> {
        MehrotraSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// Automatic pre-build settings validation
impl<T> MehrotraSettingsBuilder<T>
where
    T: FloatT,
{
    fn validate(&self) -> Result<(), String> {
        if let Some(ratio) = self.max_step_ratio {
            if ratio <= T::zero() || ratio > T::one() {
                return Err(format!("max_step_ratio must lie in (0, 1]: {ratio:?}"));
            }
        }
        if let Some(tols) = self.target_tol.zip(self.min_tol) {
            if tols.0 > tols.1 {
                return Err("target_tol must not exceed min_tol".into());
            }
        }
        Ok(())
    }
}

#[test]
fn test_settings_validate() {
    // all standard settings
    MehrotraSettingsBuilder::<f64>::default().build().unwrap();

    // fail on a step ratio outside (0, 1]
    assert!(MehrotraSettingsBuilder::<f64>::default()
        .max_step_ratio(1.5)
        .build()
        .is_err());

    // fail on inverted tolerances
    assert!(MehrotraSettingsBuilder::<f64>::default()
        .target_tol(1e-3)
        .min_tol(1e-8)
        .build()
        .is_err());
}
