use blasbench_sys::{
    device::cuda::{Cuda, Event},
    error::ToDeviceResult,
    DeviceBuffer, DeviceError, DeviceResult, ExecutionContext,
};
use num_complex::{Complex32, Complex64};
use rcublas_sys::{cublasDiagType_t, cublasFillMode_t, cublasOperation_t, cublasSideMode_t};

use super::{check_full, check_packed, check_vector, trsm_k, Spmv, Spr, Syr, Trsm};
use crate::{
    element::Element,
    layout::{Diag, Order, Side, SymmetricLayout, Transpose, TriangularLayout, Uplo},
};

impl From<Uplo> for cublasFillMode_t {
    fn from(uplo: Uplo) -> Self {
        match uplo {
            Uplo::Upper => cublasFillMode_t::CUBLAS_FILL_MODE_UPPER,
            Uplo::Lower => cublasFillMode_t::CUBLAS_FILL_MODE_LOWER,
        }
    }
}

impl From<Side> for cublasSideMode_t {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => cublasSideMode_t::CUBLAS_SIDE_LEFT,
            Side::Right => cublasSideMode_t::CUBLAS_SIDE_RIGHT,
        }
    }
}

impl From<Transpose> for cublasOperation_t {
    fn from(op: Transpose) -> Self {
        match op {
            Transpose::NoTrans => cublasOperation_t::CUBLAS_OP_N,
            Transpose::Trans => cublasOperation_t::CUBLAS_OP_T,
            Transpose::ConjTrans => cublasOperation_t::CUBLAS_OP_HERMITAN,
        }
    }
}

impl From<Diag> for cublasDiagType_t {
    fn from(diag: Diag) -> Self {
        match diag {
            Diag::NonUnit => cublasDiagType_t::CUBLAS_DIAG_NON_UNIT,
            Diag::Unit => cublasDiagType_t::CUBLAS_DIAG_UNIT,
        }
    }
}

/// Column-major triangle for a symmetric or Hermitian cuBLAS call.
///
/// cuBLAS cannot conjugate vectors on the fly, so row-major complex calls are refused.
fn symmetric_uplo<T: Element>(order: Order, uplo: Uplo) -> DeviceResult<cublasFillMode_t> {
    let layout = SymmetricLayout::column_major(order, uplo);
    if layout.conjugate && T::KIND.is_complex() {
        return Err(DeviceError::Unsupported(
            "row-major Hermitian routines on cuBLAS",
        ));
    }
    Ok(layout.uplo.into())
}

fn enqueue_after(ctx: &ExecutionContext<Cuda>, wait: &[&Event]) -> DeviceResult<()> {
    wait.iter().try_for_each(|e| ctx.queue().wait_event(e))
}

fn int(v: usize) -> DeviceResult<i32> {
    i32::try_from(v)
        .map_err(|_| DeviceError::InvalidArgument(format!("{v} does not fit in an i32")))
}

fn inc(v: isize) -> DeviceResult<i32> {
    i32::try_from(v).map_err(|_| {
        DeviceError::InvalidArgument(format!("increment {v} does not fit in an i32"))
    })
}

macro_rules! impl_cublas {
    ($elem:ty =>
        syr: $syr:path,
        spr: $spr:path,
        spmv: $spmv:path,
        trsm: $trsm:path,
    ) => {
        impl Syr<Cuda> for $elem {
            fn syr(
                ctx: &ExecutionContext<Cuda>,
                order: Order,
                uplo: Uplo,
                n: usize,
                alpha: Self::Real,
                x: &DeviceBuffer<'_, Self, Cuda>,
                offx: usize,
                incx: isize,
                a: &mut DeviceBuffer<'_, Self, Cuda>,
                offa: usize,
                lda: usize,
                wait: &[&Event],
            ) -> DeviceResult<Event> {
                check_vector("X", x, n, incx, offx)?;
                let ad = check_full("A", a, order, n, n, lda, offa)?;
                let fill = symmetric_uplo::<Self>(order, uplo)?;
                enqueue_after(ctx, wait)?;

                unsafe {
                    ($syr(
                        ctx.queue().cublas(),
                        fill,
                        int(n)?,
                        &alpha,
                        x.mem().as_ptr::<Self>(offx).cast(),
                        inc(incx)?,
                        a.output_mem("A")?.as_ptr::<Self>(offa).cast(),
                        int(ad.ld.max(1))?,
                    ) as i32)
                        .to_device_result(stringify!($syr))?;
                }
                ctx.queue().record()
            }
        }

        impl Spr<Cuda> for $elem {
            fn spr(
                ctx: &ExecutionContext<Cuda>,
                order: Order,
                uplo: Uplo,
                n: usize,
                alpha: Self::Real,
                x: &DeviceBuffer<'_, Self, Cuda>,
                offx: usize,
                incx: isize,
                ap: &mut DeviceBuffer<'_, Self, Cuda>,
                offa: usize,
                wait: &[&Event],
            ) -> DeviceResult<Event> {
                check_vector("X", x, n, incx, offx)?;
                check_packed("AP", ap, order, uplo, n, offa)?;
                let fill = symmetric_uplo::<Self>(order, uplo)?;
                enqueue_after(ctx, wait)?;

                unsafe {
                    ($spr(
                        ctx.queue().cublas(),
                        fill,
                        int(n)?,
                        &alpha,
                        x.mem().as_ptr::<Self>(offx).cast(),
                        inc(incx)?,
                        ap.output_mem("AP")?.as_ptr::<Self>(offa).cast(),
                    ) as i32)
                        .to_device_result(stringify!($spr))?;
                }
                ctx.queue().record()
            }
        }

        impl Spmv<Cuda> for $elem {
            fn spmv(
                ctx: &ExecutionContext<Cuda>,
                order: Order,
                uplo: Uplo,
                n: usize,
                alpha: Self,
                ap: &DeviceBuffer<'_, Self, Cuda>,
                offa: usize,
                x: &DeviceBuffer<'_, Self, Cuda>,
                offx: usize,
                incx: isize,
                beta: Self,
                y: &mut DeviceBuffer<'_, Self, Cuda>,
                offy: usize,
                incy: isize,
                wait: &[&Event],
            ) -> DeviceResult<Event> {
                check_packed("AP", ap, order, uplo, n, offa)?;
                check_vector("X", x, n, incx, offx)?;
                check_vector("Y", y, n, incy, offy)?;
                let fill = symmetric_uplo::<Self>(order, uplo)?;
                enqueue_after(ctx, wait)?;

                unsafe {
                    ($spmv(
                        ctx.queue().cublas(),
                        fill,
                        int(n)?,
                        (&alpha as *const Self).cast(),
                        ap.mem().as_ptr::<Self>(offa).cast(),
                        x.mem().as_ptr::<Self>(offx).cast(),
                        inc(incx)?,
                        (&beta as *const Self).cast(),
                        y.output_mem("Y")?.as_ptr::<Self>(offy).cast(),
                        inc(incy)?,
                    ) as i32)
                        .to_device_result(stringify!($spmv))?;
                }
                ctx.queue().record()
            }
        }

        impl Trsm<Cuda> for $elem {
            fn trsm(
                ctx: &ExecutionContext<Cuda>,
                order: Order,
                side: Side,
                uplo: Uplo,
                trans: Transpose,
                diag: Diag,
                m: usize,
                n: usize,
                alpha: Self,
                a: &DeviceBuffer<'_, Self, Cuda>,
                offa: usize,
                lda: usize,
                b: &mut DeviceBuffer<'_, Self, Cuda>,
                offb: usize,
                ldb: usize,
                wait: &[&Event],
            ) -> DeviceResult<Event> {
                let k = trsm_k(side, m, n);
                let ad = check_full("A", a, order, k, k, lda, offa)?;
                let bd = check_full("B", b, order, m, n, ldb, offb)?;
                let tri = TriangularLayout::column_major(order, side, uplo, m, n);
                enqueue_after(ctx, wait)?;

                unsafe {
                    ($trsm(
                        ctx.queue().cublas(),
                        tri.side.into(),
                        tri.uplo.into(),
                        trans.into(),
                        diag.into(),
                        int(tri.m)?,
                        int(tri.n)?,
                        (&alpha as *const Self).cast(),
                        a.mem().as_ptr::<Self>(offa).cast(),
                        int(ad.ld.max(1))?,
                        b.output_mem("B")?.as_ptr::<Self>(offb).cast(),
                        int(bd.ld.max(1))?,
                    ) as i32)
                        .to_device_result(stringify!($trsm))?;
                }
                ctx.queue().record()
            }
        }
    };
}

impl_cublas!(f32 =>
    syr: rcublas_sys::cublasSsyr_v2,
    spr: rcublas_sys::cublasSspr_v2,
    spmv: rcublas_sys::cublasSspmv_v2,
    trsm: rcublas_sys::cublasStrsm_v2,
);

impl_cublas!(f64 =>
    syr: rcublas_sys::cublasDsyr_v2,
    spr: rcublas_sys::cublasDspr_v2,
    spmv: rcublas_sys::cublasDspmv_v2,
    trsm: rcublas_sys::cublasDtrsm_v2,
);

impl_cublas!(Complex32 =>
    syr: rcublas_sys::cublasCher_v2,
    spr: rcublas_sys::cublasChpr_v2,
    spmv: rcublas_sys::cublasChpmv_v2,
    trsm: rcublas_sys::cublasCtrsm_v2,
);

impl_cublas!(Complex64 =>
    syr: rcublas_sys::cublasZher_v2,
    spr: rcublas_sys::cublasZhpr_v2,
    spmv: rcublas_sys::cublasZhpmv_v2,
    trsm: rcublas_sys::cublasZtrsm_v2,
);
