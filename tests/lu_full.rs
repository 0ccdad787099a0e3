#![allow(non_snake_case)]

use orthant::algebra::*;

// deterministic values in [-1, 1) from a xorshift generator, so the
// test needs no rand dependency
struct XorShift(u64);

impl XorShift {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1u64 << 52) as f64 - 1.
    }
}

fn random_matrix(m: usize, n: usize, seed: u64) -> Matrix<f64> {
    let mut rng = XorShift(seed);
    let data: Vec<f64> = (0..m * n).map(|_| rng.next_f64()).collect();
    Matrix::new((m, n), data)
}

fn frobenius(A: &Matrix<f64>) -> f64 {
    A.data().iter().map(|v| v * v).sum::<f64>().sqrt()
}

// rebuild P A Qᵀ - L U and return its max entry
fn factor_residual(factors: &Matrix<f64>, p: &[usize], q: &[usize], orig: &Matrix<f64>) -> f64 {
    let (m, n) = orig.size();
    let k = usize::min(m, n);
    let pinv = invert_permutation(p);
    let qinv = invert_permutation(q);

    let mut err: f64 = 0.;
    for i in 0..m {
        for j in 0..n {
            let mut lu = 0.;
            for r in 0..k {
                let l = match i.cmp(&r) {
                    std::cmp::Ordering::Greater => factors[(i, r)],
                    std::cmp::Ordering::Equal => 1.,
                    std::cmp::Ordering::Less => 0.,
                };
                let u = if r <= j { factors[(r, j)] } else { 0. };
                lu += l * u;
            }
            err = err.max((lu - orig[(pinv[i], qinv[j])]).abs());
        }
    }
    err
}

#[test]
fn test_lu_full_rectangular() {
    let orig = random_matrix(20, 15, 0x2545F4914F6CDD1D);
    let mut A = orig.clone();

    let (p, q) = lu_full_pivot(&mut A).unwrap();

    // complete pivoting keeps every multiplier at most one
    for j in 0..15 {
        for i in (j + 1)..20 {
            assert!(A[(i, j)].abs() <= 1. + 1e-14);
        }
    }

    let residual = factor_residual(&A, &p, &q, &orig);
    assert!(residual <= 10. * f64::EPSILON * frobenius(&orig));
}

#[test]
fn test_lu_singular_on_second_pivot() {
    // rank-one 2x2: the first elimination step zeroes the trailing
    // block exactly, so the second pivot search fails
    let mut A = Matrix::from(&[
        [1., 2.], //
        [2., 4.], //
    ]);
    assert!(matches!(
        lu_full_pivot(&mut A),
        Err(DenseFactorizationError::SingularMatrix)
    ));
}

#[test]
fn test_permutation_involution() {
    let p = vec![4, 2, 0, 3, 1, 5];
    assert_eq!(invert_permutation(&invert_permutation(&p)), p);

    // forward of inverse composes to the identity
    let pinv = invert_permutation(&p);
    for i in 0..p.len() {
        assert_eq!(p[pinv[i]], i);
    }
}
