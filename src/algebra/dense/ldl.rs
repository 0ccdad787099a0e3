use crate::algebra::*;

// Unpivoted LDLᵀ factorization for dense symmetric quasidefinite
// matrices, with dynamic regularization keyed to the expected sign
// of each diagonal entry.  The KKT matrices produced by the solver
// carry a known (+/-) block sign structure, which makes this
// factorization well defined without numerical pivoting provided
// that near-zero pivots are pushed away from zero with the correct
// sign.

pub struct DenseLdl<T> {
    n: usize,
    // unit lower triangular factor, strictly lower part used
    L: Matrix<T>,
    d: Vec<T>,
    dinv: Vec<T>,
    // expected signs of D
    dsigns: Vec<i8>,
    regularize_eps: T,
    regularize_delta: T,
}

impl<T> DenseLdl<T>
where
    T: FloatT,
{
    pub fn new(dsigns: Vec<i8>) -> Self {
        let n = dsigns.len();
        Self {
            n,
            L: Matrix::zeros((n, n)),
            d: vec![T::zero(); n],
            dinv: vec![T::zero(); n],
            dsigns,
            regularize_eps: (1e-12).as_T(),
            regularize_delta: (1e-7).as_T(),
        }
    }

    /// Factor the symmetric matrix `J`, reading its full storage.
    pub fn factor(&mut self, J: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        assert!(J.is_square() && J.nrows() == self.n);
        let n = self.n;

        // left-looking: column k of L and d[k] from columns 0..k
        for k in 0..n {
            let mut dk = J[(k, k)];
            for j in 0..k {
                dk -= self.L[(k, j)] * self.L[(k, j)] * self.d[j];
            }

            let sign = T::from_i8(self.dsigns[k]).unwrap();
            if dk * sign < self.regularize_eps {
                dk = self.regularize_delta * sign;
            }
            if dk == T::zero() {
                return Err(DenseFactorizationError::ZeroPivot);
            }
            self.d[k] = dk;
            self.dinv[k] = T::recip(dk);

            for i in (k + 1)..n {
                let mut v = J[(i, k)];
                for j in 0..k {
                    v -= self.L[(i, j)] * self.L[(k, j)] * self.d[j];
                }
                self.L[(i, k)] = v * self.dinv[k];
            }
        }
        Ok(())
    }

    /// Solve `J x = b` in place using the current factors.
    pub fn solve(&self, b: &mut [T]) {
        assert_eq!(b.len(), self.n);
        let n = self.n;

        // (L+I) x = b
        for j in 0..n {
            let bj = b[j];
            for i in (j + 1)..n {
                b[i] -= self.L[(i, j)] * bj;
            }
        }
        // D x = b
        for (b, dinv) in b.iter_mut().zip(&self.dinv) {
            *b *= *dinv;
        }
        // (L+I)ᵀ x = b
        for j in (0..n).rev() {
            let mut s = T::zero();
            for i in (j + 1)..n {
                s += self.L[(i, j)] * b[i];
            }
            b[j] -= s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quasidefinite_solve() {
        // [[ 2, 0, 1],
        //  [ 0, 3, 1],
        //  [ 1, 1,-2]]  is quasidefinite with signs (+,+,-)
        let J = Matrix::from(&[
            [2., 0., 1.],  //
            [0., 3., 1.],  //
            [1., 1., -2.], //
        ]);
        let mut ldl = DenseLdl::new(vec![1, 1, -1]);
        ldl.factor(&J).unwrap();

        let x_ref = vec![1., -2., 3.];
        let mut b = vec![0.; 3];
        J.gemv(&mut b, &x_ref, 1., 0.);
        ldl.solve(&mut b);
        assert!(b.dist(&x_ref) <= 1e-12);
    }

    #[test]
    fn test_zero_diagonal_block_regularized() {
        // zero (1,1) entry on a + pivot is pushed off zero and
        // the factorization still completes
        let J = Matrix::from(&[
            [0., 1.],  //
            [1., -1.], //
        ]);
        let mut ldl = DenseLdl::new(vec![1, -1]);
        assert!(ldl.factor(&J).is_ok());
    }
}
