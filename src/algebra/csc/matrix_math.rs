use crate::algebra::*;

impl<T> MatrixVectorMultiply<T> for CscMatrix<T>
where
    T: FloatT,
{
    // y = a*A*x + b*y
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.m);

        y.scale(b);

        for (col, &xj) in x.iter().enumerate() {
            let axj = a * xj;
            for idx in self.colptr[col]..self.colptr[col + 1] {
                y[self.rowval[idx]] += self.nzval[idx] * axj;
            }
        }
    }
}

impl<T> MatrixVectorMultiply<T> for Adjoint<'_, CscMatrix<T>>
where
    T: FloatT,
{
    // y = a*A'*x + b*y
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let A = self.src;
        assert_eq!(x.len(), A.m);
        assert_eq!(y.len(), A.n);

        for (col, yj) in y.iter_mut().enumerate() {
            let mut dot = T::zero();
            for idx in A.colptr[col]..A.colptr[col + 1] {
                dot += A.nzval[idx] * x[A.rowval[idx]];
            }
            *yj = a * dot + b * (*yj);
        }
    }
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// Symmetric matrix-vector multiply `y = a*Sym(self)*x + b*y` where
    /// `self` holds the upper triangle only.
    pub fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        debug_assert!(self.is_triu());
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.n);

        y.scale(b);

        for col in 0..self.n {
            for idx in self.colptr[col]..self.colptr[col + 1] {
                let row = self.rowval[idx];
                let v = self.nzval[idx];
                y[row] += a * v * x[col];
                if row != col {
                    y[col] += a * v * x[row];
                }
            }
        }
    }
}

impl<T> MatrixMath<T> for CscMatrix<T>
where
    T: FloatT,
{
    fn col_norms(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);
        for (col, norm) in norms.iter_mut().enumerate() {
            let mut v = T::zero();
            for idx in self.colptr[col]..self.colptr[col + 1] {
                v = T::max(v, self.nzval[idx].abs());
            }
            *norm = v;
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.m);
        norms.set(T::zero());
        for (&row, &v) in self.rowval.iter().zip(self.nzval.iter()) {
            norms[row] = T::max(norms[row], v.abs());
        }
    }
}

impl<T> MatrixMathMut<T> for CscMatrix<T>
where
    T: FloatT,
{
    fn scale(&mut self, c: T) {
        self.nzval.scale(c);
    }

    fn lscale(&mut self, l: &[T]) {
        assert_eq!(l.len(), self.m);
        for (&row, v) in self.rowval.iter().zip(self.nzval.iter_mut()) {
            *v *= l[row];
        }
    }

    fn rscale(&mut self, r: &[T]) {
        assert_eq!(r.len(), self.n);
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            self.nzval[rng].scale(r[col]);
        }
    }

    fn lrscale(&mut self, l: &[T], r: &[T]) {
        assert_eq!(l.len(), self.m);
        assert_eq!(r.len(), self.n);
        for col in 0..self.n {
            for idx in self.colptr[col]..self.colptr[col + 1] {
                self.nzval[idx] *= l[self.rowval[idx]] * r[col];
            }
        }
    }
}
