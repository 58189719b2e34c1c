//! Solves `A X = 10 B` on the lower right blocks of a row-major `4x4` upper triangular `A`
//! and a `4x5` `B`, addressed through offsets and leading dimensions.

use blasbench_math::{
    descriptor::MatrixShape,
    harness::{Harness, HarnessConfig, Outcome},
    layout::{Order, Side, Uplo},
    routine::{Routine, TrsmProblem},
    sys::{device::host::Host, ExecutionContext},
};
use num_complex::Complex32;

fn main() {
    env_logger::init();

    let (m, n, off) = (4, 5, 1);
    let a: Vec<Complex32> = (0..m)
        .flat_map(|i| (0..m).map(move |j| (i, j)))
        .map(|(i, j)| {
            let v = if i <= j { 10 * (i + 1) + j + 1 } else { 0 };
            Complex32::new(v as f32, 0.)
        })
        .collect();
    let b: Vec<Complex32> = (1..=m)
        .flat_map(|i| (1..=n).map(move |j| Complex32::new((10 * i + j) as f32, 0.)))
        .collect();

    let problem = match TrsmProblem::from_buffers(
        Side::Left,
        MatrixShape::full(m - off, m - off, Order::RowMajor)
            .with_uplo(Uplo::Upper)
            .with_ld(m)
            .with_offset(m + off),
        a,
        MatrixShape::full(m - off, n - off, Order::RowMajor)
            .with_ld(n)
            .with_offset(n + off),
        b,
        Complex32::new(10., 0.),
    ) {
        Ok(problem) => problem,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let x = Routine::<Host>::reference(&problem);
    for row in x.chunks(n) {
        let row: Vec<String> = row.iter().map(|v| format!("{:8.3}", v.re)).collect();
        println!("{}", row.join(" "));
    }

    let ctx = match ExecutionContext::new(Host::new()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let harness = Harness::new(HarnessConfig::default().with_warmup(0).with_iterations(1));
    match harness.run(&ctx, &problem) {
        Outcome::Success(report) => println!("{report:?}"),
        Outcome::Skip(why) => println!("skipped: {why}"),
        Outcome::Failure(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
