use crate::algebra::*;

/// LU factorization with complete (row and column) pivoting.
///
/// Overwrites the rectangular matrix `A` with its unit-lower-triangular
/// factor below the diagonal and its upper-triangular factor on and above
/// it, so that `P A Qᵀ = L U` for the returned row and column permutations
/// `(p, q)`.  Complete pivoting bounds every multiplier by one in absolute
/// value.
///
/// Fails with [`DenseFactorizationError::SingularMatrix`] if a zero pivot
/// is encountered, i.e. if the trailing block is exactly zero.
pub fn lu_full_pivot<T>(A: &mut Matrix<T>) -> Result<(Vec<usize>, Vec<usize>), DenseFactorizationError>
where
    T: FloatT,
{
    let m = A.nrows();
    let n = A.ncols();
    let min_dim = usize::min(m, n);

    // inverse permutations for P and Qᵀ, updated alongside the data swaps
    let mut p_inv: Vec<usize> = (0..m).collect();
    let mut q_inv: Vec<usize> = (0..n).collect();

    for k in 0..min_dim {
        // find the index and value of the pivot candidate over
        // the bottom-right (m-k) x (n-k) block
        let (i_piv, j_piv) = max_abs_in_block(A, k);

        A.swap_rows(k, i_piv);
        p_inv.swap(k, i_piv);

        A.swap_cols(k, j_piv);
        q_inv.swap(k, j_piv);

        let alpha = A[(k, k)];
        if alpha == T::zero() {
            return Err(DenseFactorizationError::SingularMatrix);
        }

        // scale the subdiagonal column, then rank-1 update the
        // trailing block
        let alpha_inv = T::recip(alpha);
        for i in (k + 1)..m {
            A[(i, k)] *= alpha_inv;
        }
        for j in (k + 1)..n {
            let akj = A[(k, j)];
            if akj == T::zero() {
                continue;
            }
            for i in (k + 1)..m {
                let aik = A[(i, k)];
                A[(i, j)] -= aik * akj;
            }
        }
    }

    Ok((invert_permutation(&p_inv), invert_permutation(&q_inv)))
}

/// Invert a permutation vector.  An exact involution:
/// `invert_permutation(&invert_permutation(p)) == p`.
pub fn invert_permutation(p: &[usize]) -> Vec<usize> {
    let mut pinv = vec![0; p.len()];
    for (i, &j) in p.iter().enumerate() {
        debug_assert!(j < p.len());
        pinv[j] = i;
    }
    pinv
}

fn max_abs_in_block<T: FloatT>(A: &Matrix<T>, k: usize) -> (usize, usize) {
    let mut best = -T::one();
    let (mut i_piv, mut j_piv) = (k, k);
    for j in k..A.ncols() {
        for i in k..A.nrows() {
            let v = A[(i, j)].abs();
            if v > best {
                best = v;
                i_piv = i;
                j_piv = j;
            }
        }
    }
    (i_piv, j_piv)
}

#[cfg(test)]
mod tests {
    use super::*;

    // max entry of P*A*Qᵀ - L*U from the packed factors
    fn reconstruct(f: &Matrix<f64>, p: &[usize], q: &[usize], orig: &Matrix<f64>) -> f64 {
        let (m, n) = orig.size();
        let k = usize::min(m, n);
        let pinv = invert_permutation(p);
        let qinv = invert_permutation(q);

        let mut err: f64 = 0.;
        for i in 0..m {
            for j in 0..n {
                //(LU)_{ij} = sum_r L(i,r) U(r,j)
                let mut lu = 0.;
                for r in 0..k {
                    let l = match i.cmp(&r) {
                        std::cmp::Ordering::Greater => f[(i, r)],
                        std::cmp::Ordering::Equal => 1.,
                        std::cmp::Ordering::Less => 0.,
                    };
                    let u = if r <= j { f[(r, j)] } else { 0. };
                    lu += l * u;
                }
                err = f64::max(err, (lu - orig[(pinv[i], qinv[j])]).abs());
            }
        }
        err
    }

    #[test]
    fn test_lu_full_small() {
        let orig = Matrix::<f64>::from(&[
            [2., 1., 1.],  //
            [4., -6., 0.], //
            [-2., 7., 2.], //
        ]);
        let mut A = orig.clone();
        let (p, q) = lu_full_pivot(&mut A).unwrap();

        // multipliers bounded by one under complete pivoting
        for j in 0..3 {
            for i in (j + 1)..3 {
                assert!(A[(i, j)].abs() <= 1. + 1e-14);
            }
        }
        assert!(reconstruct(&A, &p, &q, &orig) <= 1e-13);
    }

    #[test]
    fn test_lu_singular_second_pivot() {
        // rank one: the second pivot search finds an exactly zero block
        let mut A = Matrix::from(&[
            [1., 2.], //
            [2., 4.], //
        ]);
        let result = lu_full_pivot(&mut A);
        assert!(matches!(
            result,
            Err(DenseFactorizationError::SingularMatrix)
        ));
    }

    #[test]
    fn test_invert_permutation_involution() {
        let p = vec![3, 0, 4, 1, 2];
        assert_eq!(invert_permutation(&invert_permutation(&p)), p);
    }
}
