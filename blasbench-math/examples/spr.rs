//! Packed symmetric rank-1 update, `N = 5`, upper triangle, `alpha = 10`.
//!
//! `RUST_LOG=info cargo run --example spr`

use blasbench_math::{
    descriptor::{MatrixShape, VectorShape},
    harness::{Harness, Outcome, Tally},
    host::HostBufferGenerator,
    layout::{Order, Uplo},
    routine::SprProblem,
    sys::{device::host::Host, Device, ExecutionContext},
};

fn run<D: Device>(device: D, tally: &mut Tally)
where
    f32: blasbench_math::blas::Spr<D>,
{
    let n = 5;
    let harness = Harness::default();
    let ctx = match ExecutionContext::new(device) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("could not create a context: {err}");
            tally.failure += 1;
            return;
        }
    };

    for order in [Order::ColumnMajor, Order::RowMajor] {
        let outcome = harness.run_case(&ctx, || {
            SprProblem::<f32>::random(
                &mut HostBufferGenerator::for_dimension(n),
                MatrixShape::packed(n, order, Uplo::Upper),
                VectorShape::new(n, 1),
                10.,
            )
        });
        match &outcome {
            Outcome::Success(report) => println!(
                "{} {order:?} on {}: {:?}, error {:e}",
                report.routine,
                report.device,
                report.sample.average(),
                report.max_error.unwrap_or_default(),
            ),
            Outcome::Skip(why) => println!("skipped: {why}"),
            Outcome::Failure(err) => println!("failed: {err}"),
        }
        tally.record(&outcome);
    }
}

fn main() {
    env_logger::init();

    let mut tally = Tally::default();
    run(Host::new(), &mut tally);

    #[cfg(feature = "cublas")]
    match blasbench_math::sys::device::cuda::Cuda::new(0) {
        Ok(cuda) => run(cuda, &mut tally),
        Err(err) => eprintln!("no cuda device: {err}"),
    }

    println!(
        "{} passed, {} skipped, {} failed",
        tally.success, tally.skip, tally.failure
    );
    if !tally.passed() {
        std::process::exit(1);
    }
}
