#![allow(non_snake_case)]
//! Sparse LDLᵀ factorisation for symmetric quasidefinite matrices.
//!
//! The matrix is reordered with a fill-reducing AMD permutation and
//! analysed symbolically once; subsequent numeric refactorisations reuse
//! the ordering, elimination tree and column counts and only rewrite
//! values.  Diagonal entries whose sign disagrees with the expected
//! quasidefinite signature are regularized during factorisation.

use crate::algebra::*;
use std::cmp::{max, min};
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`LdlFactorisation`] operations
#[derive(Error, Debug)]
pub enum LdlError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
}

const UNKNOWN: usize = usize::MAX;

/// Performs LDLᵀ factorisation of a symmetric quasidefinite matrix
/// supplied in upper triangular CSC form.
pub struct LdlFactorisation<T = f64> {
    // fill reducing permutation and its inverse
    pub perm: Vec<usize>,
    #[allow(dead_code)] //unused because solve inverse-permutes in place.  Keep anyway.
    iperm: Vec<usize>,
    // lower triangular factor
    L: CscMatrix<T>,
    // D and its inverse for A = LDL^T
    d: Vec<T>,
    dinv: Vec<T>,

    // permuted matrix targeted by the factorisation and the map
    // from input entries to its entries.  Rewriting values through
    // this map is what makes numeric-only refactorisation possible.
    triuA: CscMatrix<T>,
    a_to_pap: Vec<usize>,

    // symbolic analysis, computed once
    etree: Vec<usize>,
    Lnz: Vec<usize>,

    // scratch
    iwork: Vec<usize>,
    bwork: Vec<bool>,
    fwork: Vec<T>,

    // expected signs of D, in permuted order
    dsigns: Vec<i8>,
    regularize_eps: T,
    regularize_delta: T,
}

impl<T> LdlFactorisation<T>
where
    T: FloatT,
{
    /// Symbolic analysis and first numeric factorisation of `A`
    /// (upper triangle only), with expected diagonal signs `dsigns`.
    pub fn new(A: &CscMatrix<T>, dsigns: &[i8]) -> Result<Self, LdlError> {
        let n = A.nrows();
        check_structure(A)?;

        let (perm, iperm) = amd_ordering(A);
        let (triuA, a_to_pap) = permute_symmetric(A, &iperm);

        // permute the expected sign pattern to match
        let mut dsigns_perm = vec![1_i8; n];
        permute(&mut dsigns_perm, dsigns, &perm);

        let mut etree = vec![0; n];
        let mut Lnz = vec![0; n];
        let mut iwork = vec![0; 3 * n];
        let bwork = vec![false; n];
        let fwork = vec![T::zero(); n];

        etree_and_col_counts(n, &triuA.colptr, &triuA.rowval, &mut iwork, &mut Lnz, &mut etree);

        let sumLnz = Lnz.iter().sum();
        let L = CscMatrix::spalloc((n, n), sumLnz);

        let mut ldl = Self {
            perm,
            iperm,
            L,
            d: vec![T::zero(); n],
            dinv: vec![T::zero(); n],
            triuA,
            a_to_pap,
            etree,
            Lnz,
            iwork,
            bwork,
            fwork,
            dsigns: dsigns_perm,
            regularize_eps: (1e-12).as_T(),
            regularize_delta: (1e-7).as_T(),
        };
        ldl.factor()?;
        Ok(ldl)
    }

    /// Numeric refactorisation with new values.  `A` must have the
    /// sparsity pattern passed at construction.
    pub fn refactor(&mut self, A: &CscMatrix<T>) -> Result<(), LdlError> {
        assert_eq!(A.nnz(), self.a_to_pap.len());
        for (idx, &v) in A.nzval.iter().enumerate() {
            self.triuA.nzval[self.a_to_pap[idx]] = v;
        }
        self.factor()
    }

    /// Solves Ax = b using the current factors, in place.
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.d.len());

        // permute b
        let tmp = &mut self.fwork;
        permute(tmp, b, &self.perm);

        lsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, tmp);
        zip(tmp.iter_mut(), &self.dinv).for_each(|(t, d)| *t *= *d);
        ltsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, tmp);

        // inverse permutation puts the unpermuted solution in b
        ipermute(b, tmp, &self.perm);
    }

    fn factor(&mut self) -> Result<(), LdlError> {
        let A = &self.triuA;
        let n = A.n;
        let (Lp, Li, Lx) = (&mut self.L.colptr, &mut self.L.rowval, &mut self.L.nzval);
        let (d, dinv) = (&mut self.d, &mut self.dinv);

        let y_markers = &mut self.bwork;
        let (y_idx, iwork) = self.iwork.split_at_mut(n);
        let (elim_buffer, next_colspace) = iwork.split_at_mut(n);
        let y_vals = &mut self.fwork;

        // set Lp to cumsum(Lnz), starting from zero
        Lp[0] = 0;
        let mut acc = 0;
        for (Lp, Lnz) in zip(&mut Lp[1..], &self.Lnz) {
            *Lp = acc + Lnz;
            acc = *Lp;
        }

        y_markers.fill(false);
        y_vals.fill(T::zero());
        d.fill(T::zero());
        next_colspace.copy_from_slice(&Lp[0..n]);

        let (reg_eps, reg_delta) = (self.regularize_eps, self.regularize_delta);
        let regularize = move |dk: &mut T, sign: T| {
            if *dk * sign < reg_eps {
                *dk = reg_delta * sign;
            }
        };

        // first element of D
        d[0] = if A.colptr[1] > A.colptr[0] && A.rowval[A.colptr[0]] == 0 {
            A.nzval[A.colptr[0]]
        } else {
            T::zero()
        };
        regularize(&mut d[0], T::from_i8(self.dsigns[0]).unwrap());
        if d[0] == T::zero() {
            return Err(LdlError::ZeroPivot);
        }
        dinv[0] = T::recip(d[0]);

        // for each k we solve y = L(0:k-1, 0:k-1) \ b with b the strictly
        // upper part of column k of A.  The solution is the kth row of L,
        // with an implied 1 at the diagonal.
        for k in 1..n {
            let mut nnz_y = 0;

            // determine where nonzeros go in the kth row of L by
            // walking the elimination tree
            for i in A.colptr[k]..A.colptr[k + 1] {
                let bidx = A.rowval[i];
                if bidx == k {
                    d[k] = A.nzval[i];
                    continue;
                }

                y_vals[bidx] = A.nzval[i];

                if !y_markers[bidx] {
                    y_markers[bidx] = true;
                    elim_buffer[0] = bidx;
                    let mut nnz_e = 1;

                    let mut next_idx = self.etree[bidx];
                    while next_idx != UNKNOWN && next_idx < k {
                        if y_markers[next_idx] {
                            break;
                        }
                        y_markers[next_idx] = true;
                        elim_buffer[nnz_e] = next_idx;
                        next_idx = self.etree[next_idx];
                        nnz_e += 1;
                    }

                    // unload the elimination path in reverse order
                    while nnz_e != 0 {
                        nnz_e -= 1;
                        y_idx[nnz_y] = elim_buffer[nnz_e];
                        nnz_y += 1;
                    }
                }
            }

            // now compute the values in the kth row of L
            for i in (0..nnz_y).rev() {
                let cidx = y_idx[i];
                let tmp_idx = next_colspace[cidx];

                let y_vals_cidx = y_vals[cidx];
                for j in Lp[cidx]..tmp_idx {
                    y_vals[Li[j]] -= Lx[j] * y_vals_cidx;
                }

                Lx[tmp_idx] = y_vals_cidx * dinv[cidx];
                d[k] -= y_vals_cidx * Lx[tmp_idx];

                Li[tmp_idx] = k;
                next_colspace[cidx] += 1;

                y_vals[cidx] = T::zero();
                y_markers[cidx] = false;
            }

            regularize(&mut d[k], T::from_i8(self.dsigns[k]).unwrap());
            if d[k] == T::zero() {
                return Err(LdlError::ZeroPivot);
            }
            dinv[k] = T::recip(d[k]);
        }

        Ok(())
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), LdlError> {
    if !A.is_square() {
        return Err(LdlError::IncompatibleDimension);
    }
    if !A.is_triu() {
        return Err(LdlError::NotUpperTriangular);
    }
    // every column must carry at least one entry
    if !A.colptr.windows(2).all(|c| c[0] < c[1]) {
        return Err(LdlError::EmptyColumn);
    }
    Ok(())
}

// compute the elimination tree and per-column nonzero counts for
// a quasidefinite matrix in compressed sparse column form
fn etree_and_col_counts(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    work: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) {
    work[..n].fill(0);
    Lnz.fill(0);
    etree.fill(UNKNOWN);

    for j in 0..n {
        work[j] = j;
        for istart in Ai.iter().take(Ap[j + 1]).skip(Ap[j]) {
            let mut i = *istart;
            while work[i] != j {
                if etree[i] == UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

// Solves (L+I)x = b, with x replacing b
fn lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        for (&Lij, &Lxj) in zip(&Li[Lp[i]..Lp[i + 1]], &Lx[Lp[i]..Lp[i + 1]]) {
            x[Lij] -= Lxj * xi;
        }
    }
}

// Solves (L+I)'x = b, with x replacing b
fn ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let mut s = T::zero();
        for (&Lij, &Lxj) in zip(&Li[Lp[i]..Lp[i + 1]], &Lx[Lp[i]..Lp[i + 1]]) {
            s += Lxj * x[Lij];
        }
        x[i] -= s;
    }
}

// x = b[p], no allocation
fn permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, x).for_each(|(p, x)| *x = b[*p]);
}

// x[p] = b, no allocation
fn ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, b).for_each(|(p, b)| x[*p] = *b);
}

// computes an AMD permutation for A using default parameters
fn amd_ordering<T: FloatT>(A: &CscMatrix<T>) -> (Vec<usize>, Vec<usize>) {
    let control = amd::Control::default();
    let (perm, iperm, _info) = amd::order(A.nrows(), &A.colptr, &A.rowval, &control).unwrap();
    (perm, iperm)
}

// Given a sparse symmetric matrix `A` (upper triangular entries only),
// return the permuted matrix (also upper triangular) for the inverse
// permutation `iperm`, along with the entry mapping from A into it.
// Follows the book: Timothy Davis - Direct Methods for Sparse Linear Systems.
fn permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.ncols();
    let mut P = CscMatrix::<T>::spalloc((n, n), A.nnz());
    let mut a_to_pap = vec![0; A.nnz()];

    // 1. count the entries each column of P will receive
    let mut num_entries = vec![0; n];
    for colA in 0..n {
        let colP = iperm[colA];
        for &rowA in A.rowval.iter().take(A.colptr[colA + 1]).skip(A.colptr[colA]) {
            let rowP = iperm[rowA];
            if rowA <= colA {
                num_entries[max(rowP, colP)] += 1;
            }
        }
    }

    // 2. cumulative sum into the column pointer
    P.colptr[0] = 0;
    let mut acc = 0;
    for (Pckp1, ne) in zip(&mut P.colptr[1..], &num_entries) {
        *Pckp1 = acc + ne;
        acc = *Pckp1;
    }
    num_entries.copy_from_slice(&P.colptr[0..n]);
    let mut row_starts = num_entries;

    // 3. place entries (columns come out unordered, which the
    // factorisation tolerates)
    for colA in 0..n {
        let colP = iperm[colA];
        for idx in A.colptr[colA]..A.colptr[colA + 1] {
            let rowA = A.rowval[idx];
            if rowA <= colA {
                let rowP = iperm[rowA];
                let col_idx = max(colP, rowP);
                let dest = row_starts[col_idx];

                P.rowval[dest] = min(colP, rowP);
                P.nzval[dest] = A.nzval[idx];
                a_to_pap[idx] = dest;
                row_starts[col_idx] += 1;
            }
        }
    }

    (P, a_to_pap)
}
