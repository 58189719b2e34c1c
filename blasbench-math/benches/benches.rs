use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex32;

use blasbench_math::{
    descriptor::{MatrixShape, VectorShape},
    host::HostBufferGenerator,
    layout::{Order, Uplo},
    routine::{Routine, SpmvProblem, SprProblem},
    sys::{device::host::Host, Device, ExecutionContext},
};

/// One reset and one call per iteration, as the harness measures it
fn bench_routine<D: Device, R: Routine<D>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    id: BenchmarkId,
    ctx: &ExecutionContext<D>,
    routine: &R,
) {
    let mut ops = routine.upload(ctx).unwrap();
    group.bench_function(id, |b| {
        b.iter(|| {
            routine.reset(&mut ops).unwrap();
            let done = routine.enqueue(ctx, &mut ops, &[]).unwrap();
            ctx.wait(&[&done]).unwrap();
        });
    });
    black_box(routine.download(&ops).unwrap());
}

pub fn spr(c: &mut Criterion) {
    let mut group = c.benchmark_group("spr");
    let ctx = ExecutionContext::new(Host::new()).unwrap();

    for n in [64, 256, 1024] {
        let mut gen = HostBufferGenerator::for_dimension(n);
        for order in [Order::ColumnMajor, Order::RowMajor] {
            let sspr = SprProblem::<f32>::random(
                &mut gen,
                MatrixShape::packed(n, order, Uplo::Upper),
                VectorShape::new(n, 1),
                10.,
            )
            .unwrap();
            bench_routine(
                &mut group,
                BenchmarkId::new(format!("sspr/{order:?}"), n),
                &ctx,
                &sspr,
            );
        }
    }

    group.finish();
}

pub fn spmv(c: &mut Criterion) {
    let mut group = c.benchmark_group("spmv");
    let ctx = ExecutionContext::new(Host::new()).unwrap();

    for n in [64, 256, 1024] {
        let mut gen = HostBufferGenerator::for_dimension(n);
        let chpmv = SpmvProblem::<Complex32>::random(
            &mut gen,
            MatrixShape::packed(n, Order::ColumnMajor, Uplo::Lower),
            VectorShape::new(n, 1),
            VectorShape::new(n, 1),
            Complex32::new(1., 0.),
            Complex32::new(0.5, 0.),
        )
        .unwrap();
        bench_routine(&mut group, BenchmarkId::new("chpmv", n), &ctx, &chpmv);

        let dspmv = SpmvProblem::<f64>::random(
            &mut gen,
            MatrixShape::packed(n, Order::RowMajor, Uplo::Upper),
            VectorShape::new(n, 2),
            VectorShape::new(n, -1),
            2.,
            0.,
        )
        .unwrap();
        bench_routine(&mut group, BenchmarkId::new("dspmv", n), &ctx, &dspmv);
    }

    #[cfg(feature = "cublas")]
    {
        use blasbench_math::sys::device::cuda::Cuda;

        let ctx = ExecutionContext::new(Cuda::new(0).unwrap()).unwrap();
        for n in [256, 1024, 4096] {
            let chpmv = SpmvProblem::<Complex32>::random(
                &mut HostBufferGenerator::for_dimension(n),
                MatrixShape::packed(n, Order::ColumnMajor, Uplo::Lower),
                VectorShape::new(n, 1),
                VectorShape::new(n, 1),
                Complex32::new(1., 0.),
                Complex32::new(0.5, 0.),
            )
            .unwrap();
            bench_routine(&mut group, BenchmarkId::new("cublas/chpmv", n), &ctx, &chpmv);
        }
    }

    group.finish();
}

criterion_group!(benches, spr, spmv);
criterion_main!(benches);
