//! Host reference implementations the device results are compared against.
//!
//! [`Reference`] is column-major only. The free functions accept either order and map
//! row-major calls onto it with [`SymmetricLayout`] and [`TriangularLayout`].

use std::borrow::Cow;

use crate::{
    element::Element,
    layout::{Diag, Order, Side, SymmetricLayout, Transpose, TriangularLayout, Uplo},
};

#[cfg(feature = "blas-sys")]
#[allow(clippy::module_inception)]
mod blas_sys;

pub mod kernels;

/// Column-major host routines. Slices start at the operand, past any offset.
#[allow(clippy::too_many_arguments)]
pub trait Reference: Element {
    fn syr(
        uplo: Uplo,
        n: usize,
        alpha: Self::Real,
        x: &[Self],
        incx: isize,
        a: &mut [Self],
        lda: usize,
    );

    fn spr(uplo: Uplo, n: usize, alpha: Self::Real, x: &[Self], incx: isize, ap: &mut [Self]);

    fn spmv(
        uplo: Uplo,
        n: usize,
        alpha: Self,
        ap: &[Self],
        x: &[Self],
        incx: isize,
        beta: Self,
        y: &mut [Self],
        incy: isize,
    );

    fn trsm(
        side: Side,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: Self,
        a: &[Self],
        lda: usize,
        b: &mut [Self],
        ldb: usize,
    );
}

#[cfg(not(feature = "blas-sys"))]
impl<T: Element> Reference for T {
    fn syr(uplo: Uplo, n: usize, alpha: T::Real, x: &[T], incx: isize, a: &mut [T], lda: usize) {
        kernels::syr(uplo, n, alpha, x, incx, a, lda);
    }

    fn spr(uplo: Uplo, n: usize, alpha: T::Real, x: &[T], incx: isize, ap: &mut [T]) {
        kernels::spr(uplo, n, alpha, x, incx, ap);
    }

    fn spmv(
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
        kernels::spmv(uplo, n, alpha, ap, x, incx, beta, y, incy);
    }

    fn trsm(
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
        kernels::trsm(side, uplo, trans, diag, m, n, alpha, a, lda, b, ldb);
    }
}

fn conjugated<T: Element>(x: &[T], conjugate: bool) -> Cow<'_, [T]> {
    if conjugate {
        Cow::Owned(x.iter().map(|v| v.conj()).collect())
    } else {
        Cow::Borrowed(x)
    }
}

fn conjugate_in_place<T: Element>(x: &mut [T]) {
    for v in x {
        *v = v.conj();
    }
}

/// Whether a row-major Hermitian call has to go through conjugated vectors
fn needs_conjugate<T: Element>(layout: SymmetricLayout) -> bool {
    layout.conjugate && T::KIND.is_complex()
}

/// `A := alpha x x^H + A` with `A` full symmetric or Hermitian, stored in `order`.
#[allow(clippy::too_many_arguments)]
pub fn syr<T: Reference>(
    order: Order,
    uplo: Uplo,
    n: usize,
    alpha: T::Real,
    x: &[T],
    incx: isize,
    a: &mut [T],
    lda: usize,
) {
    let layout = SymmetricLayout::column_major(order, uplo);
    let x = conjugated(x, needs_conjugate::<T>(layout));
    T::syr(layout.uplo, n, alpha, &x, incx, a, lda);
}

/// `A := alpha x x^H + A` with `A` packed, stored in `order`.
pub fn spr<T: Reference>(
    order: Order,
    uplo: Uplo,
    n: usize,
    alpha: T::Real,
    x: &[T],
    incx: isize,
    ap: &mut [T],
) {
    let layout = SymmetricLayout::column_major(order, uplo);
    let x = conjugated(x, needs_conjugate::<T>(layout));
    T::spr(layout.uplo, n, alpha, &x, incx, ap);
}

/// `y := alpha A x + beta y` with `A` packed, stored in `order`.
#[allow(clippy::too_many_arguments)]
pub fn spmv<T: Reference>(
    order: Order,
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
    let layout = SymmetricLayout::column_major(order, uplo);
    if !needs_conjugate::<T>(layout) {
        return T::spmv(layout.uplo, n, alpha, ap, x, incx, beta, y, incy);
    }

    // conj(y) := conj(alpha) conj(A) conj(x) + conj(beta) conj(y)
    let x = conjugated(x, true);
    conjugate_in_place(y);
    T::spmv(layout.uplo, n, alpha.conj(), ap, &x, incx, beta.conj(), y, incy);
    conjugate_in_place(y);
}

/// Solves `op(A) X = alpha B` or `X op(A) = alpha B`, overwriting `B`, both stored in `order`.
#[allow(clippy::too_many_arguments)]
pub fn trsm<T: Reference>(
    order: Order,
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
    let tri = TriangularLayout::column_major(order, side, uplo, m, n);
    T::trsm(tri.side, tri.uplo, trans, diag, tri.m, tri.n, alpha, a, lda, b, ldb);
}
