use blasbench_sys::{
    device::host::{Host, HostEvent},
    DeviceBuffer, DeviceResult, ExecutionContext,
};

use super::{check_full, check_packed, check_vector, trsm_k, Spmv, Spr, Syr, Trsm};
use crate::{
    layout::{Diag, Order, Side, Transpose, Uplo},
    reference,
};

// The host device runs the reference routines directly on the allocations. Every command
// completes before its event is handed out.

impl<T: reference::Reference> Syr<Host> for T {
    fn syr(
        ctx: &ExecutionContext<Host>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: T::Real,
        x: &DeviceBuffer<'_, T, Host>,
        offx: usize,
        incx: isize,
        a: &mut DeviceBuffer<'_, T, Host>,
        offa: usize,
        lda: usize,
        wait: &[&HostEvent],
    ) -> DeviceResult<HostEvent> {
        check_vector("X", x, n, incx, offx)?;
        let ad = check_full("A", a, order, n, n, lda, offa)?;
        ctx.wait(wait)?;

        let xs = x.mem().load::<T>();
        let mem = a.output_mem("A")?;
        let mut av = mem.load::<T>();
        reference::syr(order, uplo, n, alpha, &xs[offx..], incx, &mut av[offa..], ad.ld);
        mem.store(&av);

        Ok(ctx.device().complete(ctx.queue()))
    }
}

impl<T: reference::Reference> Spr<Host> for T {
    fn spr(
        ctx: &ExecutionContext<Host>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: T::Real,
        x: &DeviceBuffer<'_, T, Host>,
        offx: usize,
        incx: isize,
        ap: &mut DeviceBuffer<'_, T, Host>,
        offa: usize,
        wait: &[&HostEvent],
    ) -> DeviceResult<HostEvent> {
        check_vector("X", x, n, incx, offx)?;
        check_packed("AP", ap, order, uplo, n, offa)?;
        ctx.wait(wait)?;

        let xs = x.mem().load::<T>();
        let mem = ap.output_mem("AP")?;
        let mut av = mem.load::<T>();
        reference::spr(order, uplo, n, alpha, &xs[offx..], incx, &mut av[offa..]);
        mem.store(&av);

        Ok(ctx.device().complete(ctx.queue()))
    }
}

impl<T: reference::Reference> Spmv<Host> for T {
    fn spmv(
        ctx: &ExecutionContext<Host>,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: T,
        ap: &DeviceBuffer<'_, T, Host>,
        offa: usize,
        x: &DeviceBuffer<'_, T, Host>,
        offx: usize,
        incx: isize,
        beta: T,
        y: &mut DeviceBuffer<'_, T, Host>,
        offy: usize,
        incy: isize,
        wait: &[&HostEvent],
    ) -> DeviceResult<HostEvent> {
        check_packed("AP", ap, order, uplo, n, offa)?;
        check_vector("X", x, n, incx, offx)?;
        check_vector("Y", y, n, incy, offy)?;
        ctx.wait(wait)?;

        let av = ap.mem().load::<T>();
        let xs = x.mem().load::<T>();
        let mem = y.output_mem("Y")?;
        let mut ys = mem.load::<T>();
        reference::spmv(
            order,
            uplo,
            n,
            alpha,
            &av[offa..],
            &xs[offx..],
            incx,
            beta,
            &mut ys[offy..],
            incy,
        );
        mem.store(&ys);

        Ok(ctx.device().complete(ctx.queue()))
    }
}

impl<T: reference::Reference> Trsm<Host> for T {
    fn trsm(
        ctx: &ExecutionContext<Host>,
        order: Order,
        side: Side,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: T,
        a: &DeviceBuffer<'_, T, Host>,
        offa: usize,
        lda: usize,
        b: &mut DeviceBuffer<'_, T, Host>,
        offb: usize,
        ldb: usize,
        wait: &[&HostEvent],
    ) -> DeviceResult<HostEvent> {
        let k = trsm_k(side, m, n);
        let ad = check_full("A", a, order, k, k, lda, offa)?;
        let bd = check_full("B", b, order, m, n, ldb, offb)?;
        ctx.wait(wait)?;

        let av = a.mem().load::<T>();
        let mem = b.output_mem("B")?;
        let mut bv = mem.load::<T>();
        reference::trsm(
            order,
            side,
            uplo,
            trans,
            diag,
            m,
            n,
            alpha,
            &av[offa..],
            ad.ld,
            &mut bv[offb..],
            bd.ld,
        );
        mem.store(&bv);

        Ok(ctx.device().complete(ctx.queue()))
    }
}

#[cfg(test)]
mod tests {
    use blasbench_sys::{AccessMode, DeviceError};
    use num_complex::Complex32;

    use super::*;

    #[test]
    fn events_follow_issue_order() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let x = DeviceBuffer::from_host(&ctx, AccessMode::ReadOnly, &[1f32, 2.]).unwrap();
        let mut ap = DeviceBuffer::from_host(&ctx, AccessMode::ReadWrite, &[0f32; 3]).unwrap();

        let first = f32::spr(
            &ctx,
            Order::ColumnMajor,
            Uplo::Upper,
            2,
            1.,
            &x,
            0,
            1,
            &mut ap,
            0,
            &[],
        )
        .unwrap();
        let second = f32::spr(
            &ctx,
            Order::ColumnMajor,
            Uplo::Upper,
            2,
            1.,
            &x,
            0,
            1,
            &mut ap,
            0,
            &[&first],
        )
        .unwrap();
        assert!(second.id() > first.id());
        assert_eq!(ap.to_host().unwrap(), [2., 4., 8.]);
    }

    #[test]
    fn offsets_are_respected() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let x = DeviceBuffer::from_host(&ctx, AccessMode::ReadOnly, &[9f64, 9., 1., 2.]).unwrap();
        let mut ap =
            DeviceBuffer::from_host(&ctx, AccessMode::ReadWrite, &[7f64, 0., 0., 0.]).unwrap();

        f64::spr(&ctx, Order::RowMajor, Uplo::Lower, 2, 1., &x, 2, 1, &mut ap, 1, &[]).unwrap();
        // row-major lower: (0,0) (1,0) (1,1)
        assert_eq!(ap.to_host().unwrap(), [7., 1., 2., 4.]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let one = Complex32::new(1., 0.);
        let x = DeviceBuffer::from_host(&ctx, AccessMode::ReadOnly, &[one; 3]).unwrap();
        let mut ap = DeviceBuffer::new(&ctx, AccessMode::ReadWrite, 5).unwrap();

        let err = Complex32::spr(
            &ctx,
            Order::ColumnMajor,
            Uplo::Upper,
            3,
            1.,
            &x,
            0,
            1,
            &mut ap,
            0,
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DeviceError::BufferTooSmall {
                operand: "AP",
                required: 6,
                actual: 5
            }
        );

        let err = Complex32::spr(
            &ctx,
            Order::ColumnMajor,
            Uplo::Upper,
            2,
            1.,
            &x,
            0,
            0,
            &mut ap,
            0,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
    }

    #[test]
    fn read_only_output_is_rejected() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let a = DeviceBuffer::from_host(&ctx, AccessMode::ReadOnly, &[1f32]).unwrap();
        let mut b = DeviceBuffer::from_host(&ctx, AccessMode::ReadOnly, &[1f32]).unwrap();
        let err = f32::trsm(
            &ctx,
            Order::ColumnMajor,
            Side::Left,
            Uplo::Upper,
            Transpose::NoTrans,
            Diag::NonUnit,
            1,
            1,
            1.,
            &a,
            0,
            1,
            &mut b,
            0,
            1,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, DeviceError::ReadOnlyBuffer("B"));
    }
}
