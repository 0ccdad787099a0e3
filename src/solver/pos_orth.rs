//! Kernels on the non-negative orthant.

use crate::algebra::*;
use std::iter::zip;

/// Number of components of `x` outside the open cone, i.e. `x[i] <= 0`.
pub fn num_outside<T: FloatT>(x: &[T]) -> usize {
    x.iter().filter(|&&v| v <= T::zero()).count()
}

/// Largest `t` in `(0, upper_bound]` with `x + t*dx >= 0` componentwise.
///
/// `x` must be strictly positive.
pub fn max_step<T: FloatT>(x: &[T], dx: &[T], upper_bound: T) -> T {
    assert_eq!(x.len(), dx.len());
    let mut step = upper_bound;
    for (&xi, &dxi) in zip(x, dx) {
        if dxi < T::zero() {
            step = T::min(step, -xi / dxi);
        }
    }
    step
}

/// Maximum complementarity ratio `max_j (x_j z_j) / μ` with
/// `μ = (xᵀz)/n`.  Values well above one indicate imbalance.
pub fn complement_ratio<T: FloatT>(x: &[T], z: &[T]) -> T {
    assert_eq!(x.len(), z.len());
    let dot = x.dot(z);
    if dot <= T::zero() {
        return T::one();
    }
    let mu = dot / T::from_usize(x.len()).unwrap();

    let mut max_prod = T::zero();
    for (&xi, &zi) in zip(x, z) {
        max_prod = T::max(max_prod, xi * zi);
    }
    max_prod / mu
}

/// Nesterov-Todd scaling point of the orthant: `w_i = sqrt(x_i / z_i)`,
/// the point satisfying `X w = Z w⁻¹`.
pub fn nesterov_todd<T: FloatT>(x: &[T], z: &[T], w: &mut [T]) {
    assert_eq!(x.len(), z.len());
    assert_eq!(x.len(), w.len());
    for (w, (&xi, &zi)) in zip(w, zip(x, z)) {
        *w = T::sqrt(xi / zi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_outside() {
        assert_eq!(num_outside(&[1., 2., 3.]), 0);
        assert_eq!(num_outside(&[1., 0., -3.]), 2);
    }

    #[test]
    fn test_max_step() {
        let x = vec![1., 2.];
        // blocked by the first component at t = 0.5
        assert_eq!(max_step(&x, &[-2., 1.], 1.), 0.5);
        // unblocked directions return the bound
        assert_eq!(max_step(&x, &[1., 0.], 1.), 1.);
        assert_eq!(max_step(&x, &[1., 0.], 10.), 10.);
    }

    #[test]
    fn test_complement_ratio() {
        // perfectly balanced
        let x = vec![2., 2.];
        let z = vec![0.5, 0.5];
        assert_eq!(complement_ratio(&x, &z), 1.);

        // one product dominates: max = 4, mu = 2.5
        let z = vec![2., 0.5];
        assert_eq!(complement_ratio(&x, &z), 4. / 2.5);
    }

    #[test]
    fn test_nesterov_todd() {
        let x: Vec<f64> = vec![4., 1.];
        let z: Vec<f64> = vec![1., 4.];
        let mut w: Vec<f64> = vec![0.; 2];
        nesterov_todd(&x, &z, &mut w);
        assert_eq!(w, vec![2., 0.5]);
        // X w == Z w⁻¹ at the scaling point
        for i in 0..2 {
            assert!((x[i] * w[i] - z[i] / w[i]).abs() <= 1e-14);
        }
    }
}
