use super::{build_reg_tmp, KKTEngine, KKTFailure, KKTSystemKind};
use crate::algebra::*;
use crate::ldl::LdlFactorisation;
use crate::solver::{MehrotraSettings, RefinementSettings};

/// Factor/solve adapter for sparse problems.
///
/// The KKT matrix is assembled in upper triangular CSC form with an
/// identical sparsity pattern every iteration, so the fill-reducing
/// ordering, elimination tree and entry maps are computed once on the
/// first iteration and only numeric factors are rebuilt afterwards.
/// The factored matrix carries a temporary diagonal regularization and
/// an inner symmetric equilibration; both are absent from the matrix
/// the iterative refinement targets, so refined solutions converge to
/// those of the unregularized system.
pub struct SparseKKTEngine<T: FloatT> {
    kind: KKTSystemKind,
    m: usize,
    n: usize,

    // permanent regularization, zero when using the normal equations
    gamma_sq: T,
    delta_sq: T,
    beta_sq: T,

    // temporary regularization, removed again by refinement
    reg_tmp: Vec<T>,

    // A^T in CSC form, cached for assembly
    At: CscMatrix<T>,

    // the KKT matrix as assembled, and the regularized/equilibrated
    // copy that actually gets factored
    j_orig: CscMatrix<T>,
    j: CscMatrix<T>,
    // nzval positions of the diagonal of j
    diag_idx: Vec<usize>,

    // inner symmetric scaling of j
    d_inner: Vec<T>,

    // ordering + symbolic analysis live in here from the first
    // iteration onwards
    ldl: Option<LdlFactorisation<T>>,

    ruiz_equil_tol: T,
    diag_equil_tol: T,
    ruiz_max_iter: u32,
    resolve_reg: bool,
    refine: RefinementSettings<T>,
    print: bool,

    // work vectors of the system size
    work_x: Vec<T>,
    work_e: Vec<T>,
    work_p: Vec<T>,
    work_b: Vec<T>,

    // assembly scratch for the normal equations product
    norm_marker: Vec<bool>,
    norm_acc: Vec<T>,
    norm_pattern: Vec<usize>,
}

impl<T> SparseKKTEngine<T>
where
    T: FloatT,
{
    pub fn new(
        A: &CscMatrix<T>,
        kind: KKTSystemKind,
        settings: &MehrotraSettings<T>,
        two_norm_est: T,
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

        let reg_tmp = build_reg_tmp(kind, m, n, settings, two_norm_est);

        Self {
            kind,
            m,
            n,
            gamma_sq,
            delta_sq,
            beta_sq,
            reg_tmp,
            At: A.transpose(),
            j_orig: CscMatrix::spalloc((size, size), 0),
            j: CscMatrix::spalloc((size, size), 0),
            diag_idx: Vec::new(),
            d_inner: vec![T::one(); size],
            ldl: None,
            ruiz_equil_tol: settings.ruiz_equil_tol,
            diag_equil_tol: settings.diag_equil_tol,
            ruiz_max_iter: settings.ruiz_max_iter,
            resolve_reg: settings.resolve_reg,
            refine: settings.solve.clone(),
            print: settings.print,
            work_x: vec![T::zero(); size],
            work_e: vec![T::zero(); size],
            work_p: vec![T::zero(); size],
            work_b: vec![T::zero(); size],
            norm_marker: vec![false; size],
            norm_acc: vec![T::zero(); size],
            norm_pattern: Vec::new(),
        }
    }

    // assemble the upper triangle of the selected system into j_orig.
    // The pattern depends only on the structure of A, so every call
    // produces the same pattern and symbolic work can be reused.
    fn assemble(&mut self, A: &CscMatrix<T>, x: &[T], z: &[T]) {
        match self.kind {
            KKTSystemKind::Full => self.assemble_full(x, z),
            KKTSystemKind::Augmented => self.assemble_augmented(x, z),
            KKTSystemKind::Normal => self.assemble_normal(A, x, z),
        }
    }

    fn assemble_full(&mut self, x: &[T], z: &[T]) {
        let (m, n) = (self.m, self.n);
        let size = 2 * n + m;
        let nnz = n + (self.At.nnz() + m) + 2 * n;

        let (mut colptr, mut rowval, mut nzval) = begin_assembly(size, nnz);
        let mut diag_idx = Vec::with_capacity(size);

        // x block: gamma^2 on the diagonal
        for i in 0..n {
            diag_idx.push(nzval.len());
            push_entry(&mut rowval, &mut nzval, i, self.gamma_sq);
            colptr.push(nzval.len());
        }
        // y block: columns of A^T above -delta^2 on the diagonal
        for j in 0..m {
            for idx in self.At.colptr[j]..self.At.colptr[j + 1] {
                push_entry(&mut rowval, &mut nzval, self.At.rowval[idx], self.At.nzval[idx]);
            }
            diag_idx.push(nzval.len());
            push_entry(&mut rowval, &mut nzval, n + j, -self.delta_sq);
            colptr.push(nzval.len());
        }
        // z block: the -I link to x and -(x/z + beta^2) on the diagonal
        for i in 0..n {
            push_entry(&mut rowval, &mut nzval, i, -T::one());
            diag_idx.push(nzval.len());
            push_entry(
                &mut rowval,
                &mut nzval,
                n + m + i,
                -(x[i] / z[i] + self.beta_sq),
            );
            colptr.push(nzval.len());
        }

        self.finish_assembly(size, colptr, rowval, nzval, diag_idx);
    }

    fn assemble_augmented(&mut self, x: &[T], z: &[T]) {
        let (m, n) = (self.m, self.n);
        let size = n + m;
        let nnz = n + self.At.nnz() + m;

        let (mut colptr, mut rowval, mut nzval) = begin_assembly(size, nnz);
        let mut diag_idx = Vec::with_capacity(size);

        // x block: X^{-1}Z + gamma^2 on the diagonal
        for i in 0..n {
            diag_idx.push(nzval.len());
            push_entry(&mut rowval, &mut nzval, i, z[i] / x[i] + self.gamma_sq);
            colptr.push(nzval.len());
        }
        // y block: columns of A^T above -delta^2 on the diagonal
        for j in 0..m {
            for idx in self.At.colptr[j]..self.At.colptr[j + 1] {
                push_entry(&mut rowval, &mut nzval, self.At.rowval[idx], self.At.nzval[idx]);
            }
            diag_idx.push(nzval.len());
            push_entry(&mut rowval, &mut nzval, n + j, -self.delta_sq);
            colptr.push(nzval.len());
        }

        self.finish_assembly(size, colptr, rowval, nzval, diag_idx);
    }

    // triu of A D A^T + delta^2 I with D = (Z/X + gamma^2)^{-1},
    // built column by column with a dense accumulator
    fn assemble_normal(&mut self, A: &CscMatrix<T>, x: &[T], z: &[T]) {
        let m = self.m;

        let (mut colptr, mut rowval, mut nzval) = begin_assembly(m, 0);
        let mut diag_idx = Vec::with_capacity(m);

        let marker = &mut self.norm_marker;
        let acc = &mut self.norm_acc;
        let pattern = &mut self.norm_pattern;

        for j in 0..m {
            pattern.clear();

            // always an explicit diagonal
            marker[j] = true;
            pattern.push(j);
            acc[j] = self.delta_sq;

            for idx_k in self.At.colptr[j]..self.At.colptr[j + 1] {
                let k = self.At.rowval[idx_k];
                let dk = T::recip(z[k] / x[k] + self.gamma_sq);
                let s = dk * self.At.nzval[idx_k];
                for idx_i in A.colptr[k]..A.colptr[k + 1] {
                    let i = A.rowval[idx_i];
                    if i > j {
                        continue;
                    }
                    if !marker[i] {
                        marker[i] = true;
                        pattern.push(i);
                        acc[i] = T::zero();
                    }
                    acc[i] += A.nzval[idx_i] * s;
                }
            }

            pattern.sort_unstable();
            for &i in pattern.iter() {
                if i == j {
                    diag_idx.push(nzval.len());
                }
                push_entry(&mut rowval, &mut nzval, i, acc[i]);
                marker[i] = false;
            }
            colptr.push(nzval.len());
        }

        self.finish_assembly(m, colptr, rowval, nzval, diag_idx);
    }

    fn finish_assembly(
        &mut self,
        size: usize,
        colptr: Vec<usize>,
        rowval: Vec<usize>,
        nzval: Vec<T>,
        diag_idx: Vec<usize>,
    ) {
        if self.ldl.is_none() {
            self.j_orig = CscMatrix::new(size, size, colptr, rowval, nzval);
            self.j = self.j_orig.clone();
            self.diag_idx = diag_idx;
            debug_assert!(self.j_orig.check_format().is_ok());
        } else {
            // pattern is unchanged after the first iteration
            debug_assert!(colptr == self.j_orig.colptr && rowval == self.j_orig.rowval);
            self.j_orig.nzval = nzval;
        }
    }

    // select the inner symmetric scaling of j by the magnitude of the
    // Nesterov-Todd scaling point, then apply it in place
    fn equilibrate_inner(&mut self, w_max_norm: T) {
        let size = self.j.nrows();
        self.d_inner.set(T::one());

        if self.kind == KKTSystemKind::Normal {
            return;
        }

        if w_max_norm >= self.ruiz_equil_tol {
            if self.print {
                println!("running symmetric Ruiz equilibration");
            }
            symmetric_ruiz_equil(&mut self.j, &mut self.d_inner, self.ruiz_max_iter);
        } else if w_max_norm >= self.diag_equil_tol {
            if self.print {
                println!("running symmetric diagonal equilibration");
            }
            // scale by the inverse square roots of the diagonal magnitudes
            for i in 0..size {
                let d = self.j.nzval[self.diag_idx[i]].abs();
                self.d_inner[i] = if d > T::zero() {
                    T::recip(T::sqrt(d))
                } else {
                    T::one()
                };
            }
            let d_inner = self.d_inner.clone();
            self.j.lrscale(&d_inner, &d_inner);
        }
    }

    // solve the factored (regularized, equilibrated) system in place
    fn solve_factored(&mut self, v: &mut [T]) {
        v.hadamard(&self.d_inner);
        self.ldl.as_mut().unwrap().solve(v);
        v.hadamard(&self.d_inner);
    }

    // Iterative refinement of work_x against the matrix the caller
    // actually wants solved: j_orig without the temporary
    // regularization.  The factors of the regularized system act as
    // the preconditioner.
    fn refine_solution(&mut self) {
        let rel_tol = if self.resolve_reg {
            T::epsilon()
        } else {
            self.refine.rel_tol
        };
        let normb = self.work_b.norm_inf();

        let mut norme = self.refine_error();
        for _ in 0..self.refine.max_refine_its {
            if norme <= rel_tol * (T::one() + normb) {
                break;
            }
            let lastnorme = norme;

            // correction step against the factored system
            let mut e = std::mem::take(&mut self.work_e);
            self.solve_factored(&mut e);
            self.work_p.waxpby(T::one(), &self.work_x, T::one(), &e);
            self.work_e = e;

            std::mem::swap(&mut self.work_x, &mut self.work_p);
            norme = self.refine_error();

            if norme >= lastnorme {
                // no improvement; fall back to the previous iterate
                std::mem::swap(&mut self.work_x, &mut self.work_p);
                break;
            }
            if self.refine.progress {
                println!("refinement residual: {norme:e}");
            }
        }
    }

    // work_e = b - JOrig * work_x, returning its infinity norm
    fn refine_error(&mut self) -> T {
        self.work_e.copy_from(&self.work_b);
        self.j_orig.symv(&mut self.work_e, &self.work_x, -T::one(), T::one());
        self.work_e.norm_inf()
    }
}

fn begin_assembly<T: FloatT>(size: usize, nnz_hint: usize) -> (Vec<usize>, Vec<usize>, Vec<T>) {
    let mut colptr = Vec::with_capacity(size + 1);
    colptr.push(0);
    (colptr, Vec::with_capacity(nnz_hint), Vec::with_capacity(nnz_hint))
}

fn push_entry<T: FloatT>(rowval: &mut Vec<usize>, nzval: &mut Vec<T>, row: usize, v: T) {
    rowval.push(row);
    nzval.push(v);
}

// Symmetric Ruiz equilibration of a triu matrix: iteratively scale
// both sides by the inverse square roots of the symmetric row/column
// infinity norms, accumulating the applied scaling into `d`.
fn symmetric_ruiz_equil<T: FloatT>(J: &mut CscMatrix<T>, d: &mut [T], max_iter: u32) {
    let size = J.nrows();
    let mut norms = vec![T::zero(); size];

    for _ in 0..max_iter {
        // symmetric row/col norms of the triu data
        norms.set(T::zero());
        for col in 0..size {
            for idx in J.colptr[col]..J.colptr[col + 1] {
                let row = J.rowval[idx];
                let v = J.nzval[idx].abs();
                norms[row] = T::max(norms[row], v);
                norms[col] = T::max(norms[col], v);
            }
        }
        norms.scalarop(|x| if x == T::zero() { T::one() } else { x });
        norms.rsqrt();

        J.lrscale(&norms, &norms);
        d.hadamard(&norms);
    }
}

impl<T> KKTEngine<T> for SparseKKTEngine<T>
where
    T: FloatT,
{
    type M = CscMatrix<T>;

    fn update(
        &mut self,
        A: &CscMatrix<T>,
        x: &[T],
        z: &[T],
        w_max_norm: T,
    ) -> Result<(), KKTFailure> {
        self.assemble(A, x, z);

        // regularized copy for factorization
        self.j.nzval.copy_from(&self.j_orig.nzval);
        for (i, &idx) in self.diag_idx.iter().enumerate() {
            self.j.nzval[idx] += self.reg_tmp[i];
        }

        self.equilibrate_inner(w_max_norm);

        match self.ldl.as_mut() {
            // ordering and symbolic analysis happen exactly once
            None => {
                let dsigns = self.kind.dsigns(self.m, self.n);
                let ldl = LdlFactorisation::new(&self.j, &dsigns)
                    .map_err(|_| KKTFailure::Factorization)?;
                self.ldl = Some(ldl);
            }
            Some(ldl) => {
                ldl.refactor(&self.j).map_err(|_| KKTFailure::Factorization)?;
            }
        }
        Ok(())
    }

    fn solve(&mut self, d: &mut [T]) -> Result<(), KKTFailure> {
        assert!(self.ldl.is_some());
        assert_eq!(d.len(), self.kind.system_size(self.m, self.n));

        self.work_b.copy_from(d);
        self.work_x.copy_from(d);
        {
            let mut x = std::mem::take(&mut self.work_x);
            self.solve_factored(&mut x);
            self.work_x = x;
        }

        let start = self.refine.time.then(std::time::Instant::now);
        self.refine_solution();
        if let Some(start) = start {
            println!("refinement time: {:?}", start.elapsed());
        }

        if !self.work_x.is_finite() {
            return Err(KKTFailure::Solve);
        }
        d.copy_from(&self.work_x);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ConstraintMatrix, MehrotraSettingsBuilder};

    fn testmat() -> CscMatrix<f64> {
        CscMatrix::from(&[
            [1., 0., 2.], //
            [0., 3., 1.], //
        ])
    }

    #[test]
    fn test_symbolic_reuse_across_updates() {
        let A = testmat();
        let settings = MehrotraSettingsBuilder::<f64>::default().build().unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Augmented, &settings, 3.);

        let x = vec![1., 1., 1.];
        let z = vec![1., 1., 1.];
        engine.update(&A, &x, &z, 1.).unwrap();
        let pattern = (engine.j_orig.colptr.clone(), engine.j_orig.rowval.clone());

        let x = vec![0.5, 2., 1.5];
        let z = vec![2., 0.25, 1.];
        engine.update(&A, &x, &z, 1.).unwrap();
        assert_eq!(pattern.0, engine.j_orig.colptr);
        assert_eq!(pattern.1, engine.j_orig.rowval);
    }

    #[test]
    fn test_regularization_refined_away() {
        // solve an augmented system and verify the result against the
        // unregularized equations despite nonzero reg_tmp
        let A = testmat();
        let settings = MehrotraSettingsBuilder::<f64>::default()
            .reg0_perm(0.)
            .reg1_perm(0.)
            .build()
            .unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Augmented, &settings, 3.);
        let x = vec![0.5, 2., 1.5];
        let z = vec![2., 0.25, 1.];
        engine.update(&A, &x, &z, 1.).unwrap();

        // J * x_ref with J = [[X^{-1}Z, A^T], [A, 0]]
        let x_ref = vec![1., -1., 2., 0.5, -0.5];
        let mut b = vec![0.; 5];
        for i in 0..3 {
            b[i] = z[i] / x[i] * x_ref[i];
        }
        ConstraintMatrix::gemv_t(&A, &mut b[0..3], &x_ref[3..5], 1., 1.);
        ConstraintMatrix::gemv(&A, &mut b[3..5], &x_ref[0..3], 1., 0.);

        let mut d = b;
        engine.solve(&mut d).unwrap();
        assert!(d.dist(&x_ref) <= 1e-9);
    }

    #[test]
    fn test_normal_product() {
        // A D A^T against a dense reference
        let A = testmat();
        let settings = MehrotraSettingsBuilder::<f64>::default()
            .system(KKTSystemKind::Normal)
            .build()
            .unwrap();

        let mut engine = A.new_engine(KKTSystemKind::Normal, &settings, 3.);
        let x = vec![1., 2., 4.];
        let z = vec![1., 1., 1.];
        engine.update(&A, &x, &z, 1.).unwrap();

        // D = diag(x./z) = diag(1, 2, 4)
        // A D A^T = [[1+16, 8], [8, 18+4]] = [[17, 8], [8, 22]]
        let J = engine.j_orig.to_dense();
        assert!((J[(0, 0)] - 17.).abs() <= 1e-12);
        assert!((J[(0, 1)] - 8.).abs() <= 1e-12);
        assert!((J[(1, 1)] - 22.).abs() <= 1e-12);
    }
}
