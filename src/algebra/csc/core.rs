use crate::algebra::*;

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  0.  6.]
///     [0.  4.  7.]
/// ```
///
/// ```no_run
/// use orthant::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 2, 4, 7],                 //colptr
///    vec![0, 1, 0, 2, 0, 1, 2],        //rowval
///    vec![1., 2., 3., 4., 5., 6., 7.], //nzval
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// This field should have length `n+1`. The last entry corresponds
    /// to the number of nonzeros and should agree with the lengths of
    /// the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.  This constructor does __not__ ensure that row indices are
    /// all in bounds or that data is arranged such that entries within
    /// each column appear in order of increasing row index.  Responsibility
    /// for ensuring these conditions hold is left to the caller.
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for an m x n matrix with `nnz` elements
    pub fn spalloc(size: (usize, usize), nnz: usize) -> Self {
        let (m, n) = size;
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];

        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// transpose view
    pub fn t(&self) -> Adjoint<'_, Self> {
        Adjoint { src: self }
    }

    /// allocating transpose
    pub fn transpose(&self) -> Self {
        let mut At = CscMatrix::spalloc((self.n, self.m), self.nnz());

        //count entries per row of self = column of At
        let mut counts = vec![0usize; self.m];
        for &r in self.rowval.iter() {
            counts[r] += 1;
        }
        At.colptr[0] = 0;
        for i in 0..self.m {
            At.colptr[i + 1] = At.colptr[i] + counts[i];
        }

        let mut next = At.colptr[0..self.m].to_vec();
        for col in 0..self.n {
            for idx in self.colptr[col]..self.colptr[col + 1] {
                let row = self.rowval[idx];
                let dest = next[row];
                At.rowval[dest] = col;
                At.nzval[dest] = self.nzval[idx];
                next[row] += 1;
            }
        }
        At
    }

    /// true if all entries are on or above the diagonal
    pub fn is_triu(&self) -> bool {
        for col in 0..self.n {
            for idx in self.colptr[col]..self.colptr[col + 1] {
                if self.rowval[idx] > col {
                    return false;
                }
            }
        }
        true
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for rowval monotonicity within each column
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            if self.rowval[rng].windows(2).any(|c| c[0] >= c[1]) {
                return Err(SparseFormatError::BadRowOrdering);
            }
        }
        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        Ok(())
    }

    /// Dense representation, mainly for testing.
    pub fn to_dense(&self) -> Matrix<T> {
        let mut A = Matrix::zeros((self.m, self.n));
        for col in 0..self.n {
            for idx in self.colptr[col]..self.colptr[col + 1] {
                A[(self.rowval[idx], col)] = self.nzval[idx];
            }
        }
        A
    }
}

impl<T> ShapedMatrix for CscMatrix<T>
where
    T: FloatT,
{
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn shape(&self) -> MatrixShape {
        MatrixShape::N
    }
}

// handy construction from dense nested arrays for tests and
// small examples, e.g. CscMatrix::from(&[[1., 0.], [0., 2.]])
impl<'a, I, J, T> From<I> for CscMatrix<T>
where
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = &'a T>,
    T: FloatT,
{
    fn from(rows: I) -> CscMatrix<T> {
        let rows: Vec<Vec<T>> = rows
            .into_iter()
            .map(|r| r.into_iter().copied().collect())
            .collect();

        let m = rows.len();
        let n = rows.iter().map(|r| r.len()).next().unwrap_or(0);
        assert!(rows.iter().all(|r| r.len() == n));

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();

        colptr.push(0);
        for col in 0..n {
            for (row, r) in rows.iter().enumerate() {
                if r[col] != T::zero() {
                    rowval.push(row);
                    nzval.push(r[col]);
                }
            }
            colptr.push(rowval.len());
        }

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dense_and_transpose() {
        let A = CscMatrix::from(&[
            [1., 0., 3.], //
            [0., 2., 0.], //
        ]);
        assert_eq!(A.nnz(), 3);
        assert!(A.check_format().is_ok());

        let At = A.transpose();
        assert!(At.check_format().is_ok());
        assert_eq!(At.to_dense(), Matrix::from(&[[1., 0.], [0., 2.], [3., 0.]]));
    }

    #[test]
    fn test_is_triu() {
        let A = CscMatrix::from(&[
            [1., 5.], //
            [0., 2.], //
        ]);
        assert!(A.is_triu());
        assert!(!A.transpose().is_triu());
    }
}
