//! Column-major kernels written directly from the BLAS definitions.

use crate::{
    element::Element,
    layout::{packed_index, Diag, Order, Side, Transpose, Uplo},
};

/// Position of logical element `i` of an `n` element vector with stride `inc`.
fn at(i: usize, n: usize, inc: isize) -> usize {
    let step = inc.unsigned_abs();
    if inc > 0 {
        i * step
    } else {
        (n - 1 - i) * step
    }
}

fn in_triangle(uplo: Uplo, i: usize, j: usize) -> bool {
    match uplo {
        Uplo::Upper => i <= j,
        Uplo::Lower => i >= j,
    }
}

/// `A := alpha x x^H + A` on one triangle of a full matrix
pub fn syr<T: Element>(
    uplo: Uplo,
    n: usize,
    alpha: T::Real,
    x: &[T],
    incx: isize,
    a: &mut [T],
    lda: usize,
) {
    if n == 0 || alpha == T::real(0.) {
        return;
    }
    for j in 0..n {
        let temp = x[at(j, n, incx)].conj().scale(alpha);
        for i in (0..n).filter(|&i| in_triangle(uplo, i, j)) {
            a[i + j * lda] += x[at(i, n, incx)] * temp;
        }
        let d = j + j * lda;
        a[d] = T::from_real(a[d].re());
    }
}

/// `A := alpha x x^H + A` on a packed matrix
pub fn spr<T: Element>(uplo: Uplo, n: usize, alpha: T::Real, x: &[T], incx: isize, ap: &mut [T]) {
    if n == 0 || alpha == T::real(0.) {
        return;
    }
    for j in 0..n {
        let temp = x[at(j, n, incx)].conj().scale(alpha);
        for i in (0..n).filter(|&i| in_triangle(uplo, i, j)) {
            ap[packed_index(Order::ColumnMajor, uplo, n, i, j)] += x[at(i, n, incx)] * temp;
        }
        let d = packed_index(Order::ColumnMajor, uplo, n, j, j);
        ap[d] = T::from_real(ap[d].re());
    }
}

/// Element `(i, j)` of the Hermitian matrix stored in `ap`
fn hermitian<T: Element>(uplo: Uplo, n: usize, ap: &[T], i: usize, j: usize) -> T {
    if i == j {
        T::from_real(ap[packed_index(Order::ColumnMajor, uplo, n, i, i)].re())
    } else if in_triangle(uplo, i, j) {
        ap[packed_index(Order::ColumnMajor, uplo, n, i, j)]
    } else {
        ap[packed_index(Order::ColumnMajor, uplo, n, j, i)].conj()
    }
}

/// `y := alpha A x + beta y` with `A` packed Hermitian
#[allow(clippy::too_many_arguments)]
pub fn spmv<T: Element>(
    uplo: Uplo,
    n: usize,
    alpha: T,
    ap: &[T],
    x: &[T],
    incx: isize,
    beta: T,
    y: &mut [T],
    incy: isize,
) {
    if n == 0 || (alpha == T::zero() && beta == T::one()) {
        return;
    }
    for i in 0..n {
        let mut acc = T::zero();
        for j in 0..n {
            acc += hermitian(uplo, n, ap, i, j) * x[at(j, n, incx)];
        }
        let yi = at(i, n, incy);
        // beta == 0 must not read y, which may hold garbage
        y[yi] = if beta == T::zero() {
            alpha * acc
        } else {
            beta * y[yi] + alpha * acc
        };
    }
}

/// Solves the triangular system `get x = b` in place.
fn solve<T: Element>(get: impl Fn(usize, usize) -> T, upper: bool, size: usize, x: &mut [T]) {
    if upper {
        for i in (0..size).rev() {
            let mut s = x[i];
            for j in i + 1..size {
                s -= get(i, j) * x[j];
            }
            x[i] = s / get(i, i);
        }
    } else {
        for i in 0..size {
            let mut s = x[i];
            for j in 0..i {
                s -= get(i, j) * x[j];
            }
            x[i] = s / get(i, i);
        }
    }
}

/// `B := alpha op(A)^-1 B` or `B := alpha B op(A)^-1`
#[allow(clippy::too_many_arguments)]
pub fn trsm<T: Element>(
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) {
    if m == 0 || n == 0 {
        return;
    }

    let stored = |i: usize, j: usize| {
        if i == j && diag == Diag::Unit {
            T::one()
        } else if in_triangle(uplo, i, j) {
            a[i + j * lda]
        } else {
            T::zero()
        }
    };
    let op = |i: usize, j: usize| match trans {
        Transpose::NoTrans => stored(i, j),
        Transpose::Trans => stored(j, i),
        Transpose::ConjTrans => stored(j, i).conj(),
    };
    let upper = (uplo == Uplo::Upper) == (trans == Transpose::NoTrans);

    match side {
        Side::Left => {
            let mut col = vec![T::zero(); m];
            for k in 0..n {
                for (i, c) in col.iter_mut().enumerate() {
                    *c = alpha * b[i + k * ldb];
                }
                solve(op, upper, m, &mut col);
                for (i, c) in col.iter().enumerate() {
                    b[i + k * ldb] = *c;
                }
            }
        }
        Side::Right => {
            // x^T op(A) = b^T is op(A)^T x = b
            let mut row = vec![T::zero(); n];
            for r in 0..m {
                for (j, c) in row.iter_mut().enumerate() {
                    *c = alpha * b[r + j * ldb];
                }
                solve(|i, j| op(j, i), !upper, n, &mut row);
                for (j, c) in row.iter().enumerate() {
                    b[r + j * ldb] = *c;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    use super::*;

    /// Dense column-major copy of a packed Hermitian matrix
    fn unpack(uplo: Uplo, n: usize, ap: &[Complex64]) -> Vec<Complex64> {
        let mut a = vec![Complex64::new(0., 0.); n * n];
        for j in 0..n {
            for i in 0..n {
                a[i + j * n] = hermitian(uplo, n, ap, i, j);
            }
        }
        a
    }

    #[test]
    fn spr_matches_dense_update() {
        let x = [1f64, 2., 3.];
        // upper packed of [[1 2 4] [2 3 5] [4 5 6]]
        let mut ap = [1., 2., 3., 4., 5., 6.];
        spr(Uplo::Upper, 3, 2., &x, 1, &mut ap);

        let expected = [
            1. + 2. * 1.,
            2. + 2. * 2.,
            3. + 2. * 4.,
            4. + 2. * 3.,
            5. + 2. * 6.,
            6. + 2. * 9.,
        ];
        assert_eq!(ap, expected);
    }

    #[test]
    fn hpr_keeps_a_real_diagonal() {
        let x = [Complex64::new(1., 1.), Complex64::new(0., 2.)];
        let mut ap = [Complex64::new(1., 0.5); 3];
        spr(Uplo::Lower, 2, 1., &x, 1, &mut ap);

        // x x^H = [[2, 2 - 2i], [2 + 2i, 4]]
        assert_eq!(ap[0], Complex64::new(3., 0.));
        assert_eq!(ap[1], Complex64::new(3., 2.5));
        assert_eq!(ap[2], Complex64::new(5., 0.));
    }

    #[test]
    fn negative_increment_walks_backwards() {
        let mut forward = [0f32; 3];
        let mut backward = [0f32; 3];
        spr(Uplo::Upper, 2, 1., &[1., 9., 2.], 2, &mut forward);
        spr(Uplo::Upper, 2, 1., &[2., 9., 1.], -2, &mut backward);
        assert_eq!(forward, backward);
        assert_eq!(forward, [1., 2., 4.]);
    }

    #[test]
    fn syr_touches_one_triangle() {
        let x = [1f64, 2.];
        let mut a = [0.; 6]; // lda = 3
        syr(Uplo::Lower, 2, 1., &x, 1, &mut a, 3);
        assert_eq!(a, [1., 2., 0., 0., 4., 0.]);
    }

    #[test]
    fn hpmv_matches_dense_product() {
        let n = 3;
        let ap = [
            Complex64::new(2., 0.),
            Complex64::new(1., -1.),
            Complex64::new(3., 0.),
            Complex64::new(0., 2.),
            Complex64::new(-1., 1.),
            Complex64::new(1., 0.),
        ];
        let x = [
            Complex64::new(1., 0.),
            Complex64::new(0., 1.),
            Complex64::new(2., -1.),
        ];
        let mut y = [Complex64::new(1., 1.); 3];
        let alpha = Complex64::new(0.5, 0.);
        let beta = Complex64::new(2., 0.);

        let a = unpack(Uplo::Upper, n, &ap);
        let mut expected = [Complex64::new(0., 0.); 3];
        for i in 0..n {
            let mut acc = Complex64::new(0., 0.);
            for j in 0..n {
                acc += a[i + j * n] * x[j];
            }
            expected[i] = alpha * acc + beta * y[i];
        }

        spmv(Uplo::Upper, n, alpha, &ap, &x, 1, beta, &mut y, 1);
        for (got, want) in y.iter().zip(expected) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn spmv_zero_beta_ignores_y() {
        let ap = [1f64, 0., 1.];
        let mut y = [f64::NAN; 2];
        spmv(Uplo::Lower, 2, 1., &ap, &[3., 4.], 1, 0., &mut y, 1);
        assert_eq!(y, [3., 4.]);
    }

    #[test]
    fn trsm_left_and_right() {
        // A = [[2 1] [0 4]] column-major upper
        let a = [2f64, 0., 1., 4.];

        // left: A X = B, B = A * [[1 2] [3 4]] = [[5 8] [12 16]]
        let mut b = [5., 12., 8., 16.];
        trsm(
            Side::Left,
            Uplo::Upper,
            Transpose::NoTrans,
            Diag::NonUnit,
            2,
            2,
            1.,
            &a,
            2,
            &mut b,
            2,
        );
        assert_eq!(b, [1., 3., 2., 4.]);

        // right: X A = 2 B, X = [[1 2]] -> X A = [[2 9]]
        let mut b = [1., 4.5];
        trsm(
            Side::Right,
            Uplo::Upper,
            Transpose::NoTrans,
            Diag::NonUnit,
            1,
            2,
            2.,
            &a,
            2,
            &mut b,
            1,
        );
        assert_eq!(b, [1., 2.]);

        // transposed with a unit diagonal: A^T = [[1 0] [1 1]]
        let mut b = [1., 3.];
        trsm(Side::Left, Uplo::Upper, Transpose::Trans, Diag::Unit, 2, 1, 1., &a, 2, &mut b, 2);
        assert_eq!(b, [1., 2.]);
    }
}
