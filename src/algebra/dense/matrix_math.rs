use crate::algebra::*;

impl<T> MatrixVectorMultiply<T> for Matrix<T>
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
            for (yi, &v) in y.iter_mut().zip(self.col_slice(col)) {
                *yi += v * axj;
            }
        }
    }
}

impl<T> MatrixVectorMultiply<T> for Adjoint<'_, Matrix<T>>
where
    T: FloatT,
{
    // y = a*A'*x + b*y
    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        let A = self.src;
        assert_eq!(x.len(), A.m);
        assert_eq!(y.len(), A.n);

        for (col, yj) in y.iter_mut().enumerate() {
            let dot = A.col_slice(col).dot(x);
            *yj = a * dot + b * (*yj);
        }
    }
}

impl<T> MatrixMath<T> for Matrix<T>
where
    T: FloatT,
{
    fn col_norms(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);
        for (col, norm) in norms.iter_mut().enumerate() {
            *norm = self.col_slice(col).norm_inf();
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.m);
        norms.set(T::zero());
        for col in 0..self.n {
            for (norm, &v) in norms.iter_mut().zip(self.col_slice(col)) {
                *norm = T::max(*norm, v.abs());
            }
        }
    }
}

impl<T> MatrixMathMut<T> for Matrix<T>
where
    T: FloatT,
{
    fn scale(&mut self, c: T) {
        self.data.scale(c);
    }

    fn lscale(&mut self, l: &[T]) {
        assert_eq!(l.len(), self.m);
        for col in 0..self.n {
            self.col_slice_mut(col).hadamard(l);
        }
    }

    fn rscale(&mut self, r: &[T]) {
        assert_eq!(r.len(), self.n);
        for (col, &rv) in r.iter().enumerate() {
            self.col_slice_mut(col).scale(rv);
        }
    }

    fn lrscale(&mut self, l: &[T], r: &[T]) {
        self.lscale(l);
        self.rscale(r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemv() {
        let A = Matrix::from(&[
            [1., 2., 3.], //
            [4., 5., 6.], //
        ]);
        let x = vec![1., -1., 2.];
        let mut y = vec![1., 1.];
        A.gemv(&mut y, &x, 2., 1.);
        assert_eq!(y, vec![11., 31.]);

        let xt = vec![1., -1.];
        let mut yt = vec![0., 0., 0.];
        A.t().gemv(&mut yt, &xt, 1., 0.);
        assert_eq!(yt, vec![-3., -3., -3.]);
    }

    #[test]
    fn test_norms_and_scaling() {
        let mut A = Matrix::from(&[
            [1., -4.], //
            [-2., 3.], //
        ]);
        let mut rnorms = vec![0.; 2];
        let mut cnorms = vec![0.; 2];
        A.row_norms(&mut rnorms);
        A.col_norms(&mut cnorms);
        assert_eq!(rnorms, vec![4., 3.]);
        assert_eq!(cnorms, vec![2., 4.]);

        A.lrscale(&[2., 1.], &[1., 0.5]);
        assert_eq!(A, Matrix::from(&[[2., -4.], [-2., 1.5]]));
    }
}
