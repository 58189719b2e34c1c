//! Device dispatch of the benchmarked routines.
//!
//! Each routine is a trait implemented for every [`Element`] on every device that provides
//! it. Calls validate buffer sizes, wait on the given events, enqueue the routine on the
//! context's queue and return its completion event without blocking on it.

use blasbench_sys::{Device, DeviceBuffer, DeviceResult, ExecutionContext};

use crate::{
    descriptor::{Descriptor, MatrixShape, VectorShape},
    element::Element,
    layout::{Diag, Order, Side, Transpose, Uplo},
};

mod host;

#[cfg(feature = "cublas")]
pub mod cublas;

/// Symmetric or Hermitian rank-1 update of a full matrix, `A := alpha x x^H + A`.
///
/// `syr` for real elements, `her` for complex ones.
pub trait Syr<D: Device>: Element {
    #[allow(clippy::too_many_arguments)]
    fn syr(
        ctx: &ExecutionContext<D>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: Self::Real,
        x: &DeviceBuffer<'_, Self, D>,
        offx: usize,
        incx: isize,
        a: &mut DeviceBuffer<'_, Self, D>,
        offa: usize,
        lda: usize,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event>;
}

/// Symmetric or Hermitian rank-1 update of a packed matrix, `AP := alpha x x^H + AP`.
///
/// `spr` for real elements, `hpr` for complex ones.
pub trait Spr<D: Device>: Element {
    #[allow(clippy::too_many_arguments)]
    fn spr(
        ctx: &ExecutionContext<D>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: Self::Real,
        x: &DeviceBuffer<'_, Self, D>,
        offx: usize,
        incx: isize,
        ap: &mut DeviceBuffer<'_, Self, D>,
        offa: usize,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event>;
}

/// Packed symmetric or Hermitian matrix-vector product, `y := alpha AP x + beta y`.
///
/// `spmv` for real elements, `hpmv` for complex ones.
pub trait Spmv<D: Device>: Element {
    #[allow(clippy::too_many_arguments)]
    fn spmv(
        ctx: &ExecutionContext<D>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: Self,
        ap: &DeviceBuffer<'_, Self, D>,
        offa: usize,
        x: &DeviceBuffer<'_, Self, D>,
        offx: usize,
        incx: isize,
        beta: Self,
        y: &mut DeviceBuffer<'_, Self, D>,
        offy: usize,
        incy: isize,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event>;
}

/// Triangular solve with multiple right hand sides, overwriting `B` with `X` where
/// `op(A) X = alpha B` (left) or `X op(A) = alpha B` (right). `B` is `m x n`.
pub trait Trsm<D: Device>: Element {
    #[allow(clippy::too_many_arguments)]
    fn trsm(
        ctx: &ExecutionContext<D>,
        order: Order,
        side: Side,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: Self,
        a: &DeviceBuffer<'_, Self, D>,
        offa: usize,
        lda: usize,
        b: &mut DeviceBuffer<'_, Self, D>,
        offb: usize,
        ldb: usize,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event>;
}

/// Checks that `buf` can hold an `n` element vector with stride `inc` past `offset`.
pub(crate) fn check_vector<T: Element, D: Device>(
    name: &'static str,
    buf: &DeviceBuffer<'_, T, D>,
    n: usize,
    inc: isize,
    offset: usize,
) -> DeviceResult<Descriptor> {
    let desc = VectorShape::new(n, inc).with_offset(offset).describe()?;
    buf.require(name, desc.required())?;
    Ok(desc)
}

/// Checks a full matrix operand, resolving a zero leading dimension to its minimum.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_full<T: Element, D: Device>(
    name: &'static str,
    buf: &DeviceBuffer<'_, T, D>,
    order: Order,
    rows: usize,
    cols: usize,
    ld: usize,
    offset: usize,
) -> DeviceResult<Descriptor> {
    let desc = MatrixShape::full(rows, cols, order)
        .with_ld(ld)
        .with_offset(offset)
        .describe()?;
    buf.require(name, desc.required())?;
    Ok(desc)
}

pub(crate) fn check_packed<T: Element, D: Device>(
    name: &'static str,
    buf: &DeviceBuffer<'_, T, D>,
    order: Order,
    uplo: Uplo,
    n: usize,
    offset: usize,
) -> DeviceResult<Descriptor> {
    let desc = MatrixShape::packed(n, order, uplo)
        .with_offset(offset)
        .describe()?;
    buf.require(name, desc.required())?;
    Ok(desc)
}

/// Order of the triangular matrix of a solve with `B` of `m x n`
pub(crate) fn trsm_k(side: Side, m: usize, n: usize) -> usize {
    match side {
        Side::Left => m,
        Side::Right => n,
    }
}
