use super::{KKTEngine, KKTFailure, KKTSystemKind};
use crate::algebra::*;
use crate::solver::{MehrotraSettings, RefinementSettings};

/// Factor/solve adapter for dense problems.
///
/// Assembles the selected KKT form in full symmetric storage each
/// iteration, factors it once with an unpivoted quasidefinite LDLᵀ,
/// and serves the predictor and corrector solves from the same
/// factors, polishing each solution with iterative refinement.
pub struct DenseKKTEngine<T: FloatT> {
    kind: KKTSystemKind,
    m: usize,
    n: usize,

    // permanent regularization, zero when using the normal equations
    gamma_sq: T,
    delta_sq: T,
    beta_sq: T,

    J: Matrix<T>,
    ldl: DenseLdl<T>,
    factored: bool,

    refine: RefinementSettings<T>,

    // iterative refinement workspace: solution, residual, candidate
    work_x: Vec<T>,
    work_e: Vec<T>,
    work_p: Vec<T>,
}

impl<T> DenseKKTEngine<T>
where
    T: FloatT,
{
    pub fn new(
        A: &Matrix<T>,
        kind: KKTSystemKind,
        settings: &MehrotraSettings<T>,
        _two_norm_est: T,
    ) -> Self {
        let (m, n) = A.size();
        let size = kind.system_size(m, n);

        let (gamma_sq, delta_sq, beta_sq) = match kind {
            KKTSystemKind::Normal => (T::zero(), T::zero(), T::zero()),
            _ => (
                settings.reg0_perm * settings.reg0_perm,
                settings.reg1_perm * settings.reg1_perm,
                settings.reg2_perm * settings.reg2_perm,
            ),
        };

        Self {
            kind,
            m,
            n,
            gamma_sq,
            delta_sq,
            beta_sq,
            J: Matrix::zeros((size, size)),
            ldl: DenseLdl::new(kind.dsigns(m, n)),
            factored: false,
            refine: settings.solve.clone(),
            work_x: vec![T::zero(); size],
            work_e: vec![T::zero(); size],
            work_p: vec![T::zero(); size],
        }
    }

    fn assemble(&mut self, A: &Matrix<T>, x: &[T], z: &[T]) {
        let (m, n) = (self.m, self.n);
        let J = &mut self.J;
        J.data_mut().set(T::zero());

        match self.kind {
            KKTSystemKind::Full => {
                for i in 0..n {
                    J[(i, i)] = self.gamma_sq;
                }
                for i in 0..m {
                    J[(n + i, n + i)] = -self.delta_sq;
                }
                for j in 0..m {
                    for i in 0..n {
                        let v = A[(j, i)];
                        J[(i, n + j)] = v;
                        J[(n + j, i)] = v;
                    }
                }
                for i in 0..n {
                    J[(i, n + m + i)] = -T::one();
                    J[(n + m + i, i)] = -T::one();
                    J[(n + m + i, n + m + i)] = -(x[i] / z[i] + self.beta_sq);
                }
            }
            KKTSystemKind::Augmented => {
                for i in 0..n {
                    J[(i, i)] = z[i] / x[i] + self.gamma_sq;
                }
                for i in 0..m {
                    J[(n + i, n + i)] = -self.delta_sq;
                }
                for j in 0..m {
                    for i in 0..n {
                        let v = A[(j, i)];
                        J[(i, n + j)] = v;
                        J[(n + j, i)] = v;
                    }
                }
            }
            KKTSystemKind::Normal => {
                // J = A D A^T + delta^2 I with D = (Z/X + gamma^2 I)^{-1}
                for i in 0..m {
                    J[(i, i)] = self.delta_sq;
                }
                for k in 0..n {
                    let dk = T::recip(z[k] / x[k] + self.gamma_sq);
                    for j in 0..m {
                        let ajk = A[(j, k)];
                        if ajk == T::zero() {
                            continue;
                        }
                        let s = dk * ajk;
                        for i in 0..m {
                            J[(i, j)] += A[(i, k)] * s;
                        }
                    }
                }
            }
        }
    }

    // polish work_x against b.  Factors carry only the tiny dynamic
    // regularization, so a few corrections reach machine precision.
    fn refine_solution(&mut self, b: &[T]) {
        let x = &mut self.work_x;
        let e = &mut self.work_e;
        let p = &mut self.work_p;

        let normb = b.norm_inf();
        let mut norme = refine_error(e, b, &self.J, x);

        for _ in 0..self.refine.max_refine_its {
            if norme <= self.refine.rel_tol * (T::one() + normb) {
                break;
            }
            let lastnorme = norme;

            // correction step: J dx = e, candidate p = x + dx
            self.ldl.solve(e);
            p.waxpby(T::one(), x, T::one(), e);

            norme = refine_error(e, b, &self.J, p);
            if norme >= lastnorme {
                // no improvement, keep the current solution
                break;
            }
            std::mem::swap(x, p);

            if self.refine.progress {
                println!("refinement residual: {norme:e}");
            }
        }
    }
}

// e = b - J*xi, returning its infinity norm
fn refine_error<T: FloatT>(e: &mut [T], b: &[T], J: &Matrix<T>, xi: &[T]) -> T {
    e.copy_from(b);
    J.gemv(e, xi, -T::one(), T::one());
    e.norm_inf()
}

impl<T> KKTEngine<T> for DenseKKTEngine<T>
where
    T: FloatT,
{
    type M = Matrix<T>;

    fn update(&mut self, A: &Matrix<T>, x: &[T], z: &[T], _w_max_norm: T) -> Result<(), KKTFailure> {
        self.assemble(A, x, z);
        self.factored = false;
        self.ldl
            .factor(&self.J)
            .map_err(|_| KKTFailure::Factorization)?;
        self.factored = true;
        Ok(())
    }

    fn solve(&mut self, d: &mut [T]) -> Result<(), KKTFailure> {
        assert!(self.factored);
        assert_eq!(d.len(), self.kind.system_size(self.m, self.n));

        self.work_x.copy_from(d);
        self.ldl.solve(&mut self.work_x);
        self.refine_solution(d);

        if !self.work_x.is_finite() {
            return Err(KKTFailure::Solve);
        }
        d.copy_from(&self.work_x);
        Ok(())
    }
}
