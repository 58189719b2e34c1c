//! Throughput of packed Hermitian and symmetric matrix-vector products over a range of sizes.
//!
//! `cargo run --release --example perf_hpmv [max_n]`

use blasbench_math::{
    blas::Spmv,
    descriptor::{MatrixShape, VectorShape},
    element::Element,
    harness::{Harness, HarnessConfig, Outcome, Tally},
    host::HostBufferGenerator,
    layout::{Order, Uplo},
    reference::Reference,
    routine::SpmvProblem,
    sys::{device::host::Host, Device, ExecutionContext},
};
use num_complex::{Complex32, Complex64};

fn sweep<T, D>(ctx: &ExecutionContext<D>, harness: &Harness, max_n: usize, tally: &mut Tally)
where
    T: Element + Spmv<D> + Reference,
    D: Device,
{
    let mut n = 16;
    while n <= max_n {
        let outcome = harness.run_case(ctx, || {
            SpmvProblem::<T>::random(
                &mut HostBufferGenerator::for_dimension(n),
                MatrixShape::packed(n, Order::ColumnMajor, Uplo::Lower),
                VectorShape::new(n, 1),
                VectorShape::new(n, 1),
                T::one(),
                T::one(),
            )
        });
        if let Outcome::Success(report) = &outcome {
            println!(
                "{:>6} {:>6} {:>12.3?} {:>8.3} GFLOPS",
                report.routine,
                n,
                report.sample.average(),
                report.sample.throughput()
            );
        }
        tally.record(&outcome);
        n *= 2;
    }
}

fn main() {
    env_logger::init();

    let max_n = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1024);

    let ctx = match ExecutionContext::new(Host::new()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let harness = Harness::new(HarnessConfig::default().with_warmup(2).with_iterations(10));

    let mut tally = Tally::default();
    sweep::<f32, _>(&ctx, &harness, max_n, &mut tally);
    sweep::<f64, _>(&ctx, &harness, max_n, &mut tally);
    sweep::<Complex32, _>(&ctx, &harness, max_n, &mut tally);
    sweep::<Complex64, _>(&ctx, &harness, max_n, &mut tally);

    println!(
        "{} cases: {} passed, {} skipped, {} failed",
        tally.total(),
        tally.success,
        tally.skip,
        tally.failure
    );
    if !tally.passed() {
        std::process::exit(1);
    }
}
