//! Warm-up, timing, and verification of one routine call on one device.

use std::time::{Duration, Instant};

use blasbench_sys::{Device, ExecutionContext};
use log::{info, warn};

use crate::{
    element::Element,
    error::{Error, Result, ValidationError},
    gate::{Insufficient, ResourceGate},
    routine::Routine,
};

/// What a measured iteration covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Operands stay on the device, only the routine itself is timed
    #[default]
    Direct,
    /// Every iteration writes all operands, runs, and reads the output back
    RoundTrip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessConfig {
    pub warmup: usize,
    pub iterations: usize,
    pub mode: Mode,
    /// Whether to run the host reference and compare against it
    pub reference: bool,
    /// Maximum relative error. `None` picks one from the element precision.
    pub tolerance: Option<f64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup: 1,
            iterations: 20,
            mode: Mode::Direct,
            reference: true,
            tolerance: None,
        }
    }
}

impl HarnessConfig {
    #[must_use]
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Clamped to at least one.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: bool) -> Self {
        self.reference = reference;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// The configured tolerance, or the default for elements of type `T`.
    pub fn tolerance_for<T: Element>(&self) -> f64 {
        self.tolerance.unwrap_or(if T::KIND.is_double() {
            1e-10
        } else {
            1e-4
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub iterations: usize,
    pub total: Duration,
    /// Operation count of a single call
    pub operations: f64,
}

impl TimingSample {
    pub fn average(&self) -> Duration {
        self.total.div_f64(self.iterations.max(1) as f64)
    }

    /// Operations per nanosecond, which reads as GFLOPS. Zero if nothing was measured.
    pub fn throughput(&self) -> f64 {
        let ns = self.average().as_secs_f64() * 1e9;
        if ns > 0. {
            self.operations / ns
        } else {
            0.
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub routine: String,
    pub device: String,
    pub sample: TimingSample,
    pub reference_time: Option<Duration>,
    pub max_error: Option<f64>,
    /// The device took longer on average than the host reference did
    pub device_slower: bool,
}

#[derive(Debug)]
pub enum Outcome {
    Success(Report),
    Skip(Insufficient),
    Failure(Error),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Success(report) => Some(report),
            _ => None,
        }
    }
}

/// Outcome counts over a batch of test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub success: usize,
    pub skip: usize,
    pub failure: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success(_) => self.success += 1,
            Outcome::Skip(_) => self.skip += 1,
            Outcome::Failure(_) => self.failure += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.skip + self.failure
    }

    pub fn passed(&self) -> bool {
        self.failure == 0
    }
}

impl<'a> Extend<&'a Outcome> for Tally {
    fn extend<I: IntoIterator<Item = &'a Outcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

/// Largest elementwise difference, relative to the largest reference magnitude.
///
/// Falls back to the absolute difference when the reference is all zeros. Buffers of
/// different lengths never match.
pub fn max_relative_error<T: Element>(device: &[T], reference: &[T]) -> f64 {
    if device.len() != reference.len() {
        return f64::INFINITY;
    }
    let (diff, norm) = device
        .iter()
        .zip(reference)
        .fold((0f64, 0f64), |(diff, norm), (&d, &r)| {
            (diff.max((d - r).magnitude()), norm.max(r.magnitude()))
        });
    if norm > 0. {
        diff / norm
    } else {
        diff
    }
}

#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Builds a routine and runs it. A routine that fails to build is a failed case.
    pub fn run_case<D, R>(
        &self,
        ctx: &ExecutionContext<D>,
        build: impl FnOnce() -> Result<R, ValidationError>,
    ) -> Outcome
    where
        D: Device,
        R: Routine<D>,
    {
        match build() {
            Ok(routine) => self.run(ctx, &routine),
            Err(err) => {
                warn!("invalid test case: {err}");
                Outcome::Failure(err.into())
            }
        }
    }

    /// Gates, uploads, warms up, times and verifies one routine.
    ///
    /// Device memory is released before this returns, whatever the outcome.
    pub fn run<D, R>(&self, ctx: &ExecutionContext<D>, routine: &R) -> Outcome
    where
        D: Device,
        R: Routine<D>,
    {
        let name = routine.name();
        let gate = match ResourceGate::for_context(ctx) {
            Ok(gate) => gate,
            Err(err) => return Outcome::Failure(err.into()),
        };
        if let Err(why) = gate.check::<R::Elem>(&routine.descriptors()) {
            warn!("{name}: skipped, {why}");
            return Outcome::Skip(why);
        }

        match self.measure(ctx, routine) {
            Ok(report) => {
                info!(
                    "{name} on {}: {:?} average over {} iterations, {:.3} GFLOPS",
                    report.device,
                    report.sample.average(),
                    report.sample.iterations,
                    report.sample.throughput(),
                );
                if let Some(err) = report.max_error {
                    info!("{name}: max relative error {err:e}");
                }
                Outcome::Success(report)
            }
            Err(err) => {
                warn!("{name}: failed, {err}");
                Outcome::Failure(err)
            }
        }
    }

    fn measure<D, R>(&self, ctx: &ExecutionContext<D>, routine: &R) -> Result<Report>
    where
        D: Device,
        R: Routine<D>,
    {
        let name = routine.name();
        let iterations = self.config.iterations.max(1);
        let mut ops = routine.upload(ctx)?;

        for _ in 0..self.config.warmup {
            self.iteration(ctx, routine, &mut ops)?;
        }

        let total = if self.config.mode == Mode::Direct && routine.idempotent() {
            Self::span(ctx, routine, &mut ops, iterations)?
        } else {
            let mut total = Duration::ZERO;
            for _ in 0..iterations {
                total += self.iteration(ctx, routine, &mut ops)?;
            }
            total
        };
        let sample = TimingSample {
            iterations,
            total,
            operations: routine.operation_count(),
        };

        // every iteration started from the snapshot, so the output is that of a single call
        let (reference_time, max_error) = if self.config.reference {
            let output = routine.download(&ops)?;
            let start = Instant::now();
            let expected = routine.reference();
            let reference_time = start.elapsed();

            let max_error = max_relative_error(&output, &expected);
            let tolerance = self.config.tolerance_for::<R::Elem>();
            if max_error.is_nan() || max_error > tolerance {
                return Err(Error::Mismatch {
                    max_error,
                    tolerance,
                });
            }
            (Some(reference_time), Some(max_error))
        } else {
            (None, None)
        };

        let device_slower = reference_time.is_some_and(|host| sample.average() > host);
        if let (true, Some(host)) = (device_slower, reference_time) {
            warn!(
                "{name}: device is slower than the host reference ({:?} > {host:?})",
                sample.average()
            );
        }

        Ok(Report {
            routine: name,
            device: ctx.device().info().name.clone(),
            sample,
            reference_time,
            max_error,
            device_slower,
        })
    }

    /// One call, timed from enqueue to completion. The reset before it is not timed.
    fn iteration<D, R>(
        &self,
        ctx: &ExecutionContext<D>,
        routine: &R,
        ops: &mut R::Operands<'_>,
    ) -> Result<Duration>
    where
        D: Device,
        R: Routine<D>,
    {
        match self.config.mode {
            Mode::Direct => {
                if !routine.idempotent() {
                    routine.reset(ops)?;
                }
                let start = Instant::now();
                let done = routine.enqueue(ctx, ops, &[])?;
                ctx.wait(&[&done])?;
                Ok(start.elapsed())
            }
            Mode::RoundTrip => {
                let start = Instant::now();
                routine.round_trip(ctx, ops)?;
                Ok(start.elapsed())
            }
        }
    }

    /// `iterations` back to back calls, timed from the first enqueue to the queue draining.
    fn span<D, R>(
        ctx: &ExecutionContext<D>,
        routine: &R,
        ops: &mut R::Operands<'_>,
        iterations: usize,
    ) -> Result<Duration>
    where
        D: Device,
        R: Routine<D>,
    {
        let start = Instant::now();
        let mut last = routine.enqueue(ctx, ops, &[])?;
        for _ in 1..iterations {
            last = routine.enqueue(ctx, ops, &[&last])?;
        }
        ctx.wait(&[&last])?;
        ctx.finish()?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use approx::assert_relative_eq;
    use blasbench_sys::{device::host::Host, DeviceResult};
    use num_complex::{Complex32, Complex64};

    use super::*;
    use crate::{
        descriptor::{Descriptor, MatrixShape, VectorShape},
        host::HostBufferGenerator,
        layout::{Order, Uplo},
        routine::{SpmvProblem, SprProblem, SyrProblem},
    };

    fn spr(n: usize) -> SprProblem<f32> {
        SprProblem::random(
            &mut HostBufferGenerator::for_dimension(n),
            MatrixShape::packed(n, Order::ColumnMajor, Uplo::Upper),
            VectorShape::new(n, 1),
            10.,
        )
        .unwrap()
    }

    #[test]
    fn packed_upper_matches_reference() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let outcome = Harness::default().run(&ctx, &spr(5));
        let report = outcome.report().unwrap();
        assert_eq!(report.routine, "sspr");
        assert_eq!(report.device, "host");
        assert!(report.max_error.unwrap() < 1e-5);
        assert!(report.reference_time.is_some());
        assert_eq!(ctx.device().used(), 0);
    }

    #[test]
    fn every_reset_iteration_equals_a_fresh_reference() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let problem = spr(9);
        let expected = Routine::<Host>::reference(&problem);
        let mut ops = problem.upload(&ctx).unwrap();
        for _ in 0..5 {
            problem.reset(&mut ops).unwrap();
            let done = problem.enqueue(&ctx, &mut ops, &[]).unwrap();
            ctx.wait(&[&done]).unwrap();
            assert_eq!(problem.download(&ops).unwrap(), expected);
        }

        // without a reset the update accumulates
        let done = problem.enqueue(&ctx, &mut ops, &[]).unwrap();
        ctx.wait(&[&done]).unwrap();
        assert_ne!(problem.download(&ops).unwrap(), expected);
    }

    #[test]
    fn warmups_are_not_measured() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let harness = Harness::new(HarnessConfig::default().with_warmup(3).with_iterations(20));
        let outcome = harness.run(&ctx, &spr(16));
        let sample = outcome.report().unwrap().sample;

        assert_eq!(sample.iterations, 20);
        assert_eq!(ctx.queue().issued(), 23);
        let average = sample.average().as_secs_f64();
        assert!(average.is_finite() && average >= 0.);
        assert!(sample.throughput() >= 0.);
        assert_eq!(sample.operations, 272.);
    }

    #[test]
    fn idempotent_routines_run_back_to_back() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let problem = SpmvProblem::<Complex32>::random(
            &mut HostBufferGenerator::for_dimension(8),
            MatrixShape::packed(8, Order::RowMajor, Uplo::Lower),
            VectorShape::new(8, 1),
            VectorShape::new(8, -1),
            Complex32::new(2., -1.),
            Complex32::new(0., 0.),
        )
        .unwrap();
        let harness = Harness::new(HarnessConfig::default().with_iterations(4));
        let outcome = harness.run(&ctx, &problem);
        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(ctx.queue().issued(), 5);
    }

    #[test]
    fn round_trip_mode() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let problem = SyrProblem::<Complex64>::random(
            &mut HostBufferGenerator::for_dimension(6),
            MatrixShape::full(6, 6, Order::ColumnMajor).with_ld(7),
            VectorShape::new(6, 2),
            0.25,
        )
        .unwrap();
        let harness = Harness::new(
            HarnessConfig::default()
                .with_mode(Mode::RoundTrip)
                .with_iterations(3),
        );
        let report = harness.run(&ctx, &problem);
        assert_eq!(report.report().unwrap().max_error, Some(0.));
    }

    #[test]
    fn small_devices_skip() {
        let ctx = ExecutionContext::new(Host::with_limits(64, 1 << 20)).unwrap();
        let outcome = Harness::default().run(&ctx, &spr(10));
        assert!(matches!(
            outcome,
            Outcome::Skip(Insufficient::AllocTooLarge { bytes: 220, .. })
        ));
        assert_eq!(ctx.queue().issued(), 0);
    }

    #[test]
    fn double_precision_skips_without_support() {
        let ctx = ExecutionContext::new(Host::new().without_double_precision()).unwrap();
        let problem = SprProblem::<f64>::random(
            &mut HostBufferGenerator::for_dimension(4),
            MatrixShape::packed(4, Order::RowMajor, Uplo::Lower),
            VectorShape::new(4, 1),
            1.,
        )
        .unwrap();
        let outcome = Harness::default().run(&ctx, &problem);
        assert!(matches!(outcome, Outcome::Skip(Insufficient::NoDoublePrecision)));
    }

    #[test]
    fn invalid_cases_fail_and_are_tallied() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let harness = Harness::new(HarnessConfig::default().with_iterations(2));
        let outcomes = [
            harness.run_case(&ctx, || {
                SprProblem::<f32>::random(
                    &mut HostBufferGenerator::default(),
                    MatrixShape::packed(3, Order::ColumnMajor, Uplo::Upper),
                    VectorShape::new(3, 0),
                    1.,
                )
            }),
            harness.run_case(&ctx, || Ok(spr(3))),
            harness.run(
                &ExecutionContext::new(Host::with_limits(4, 4)).unwrap(),
                &spr(3),
            ),
        ];
        assert!(matches!(
            outcomes[0],
            Outcome::Failure(Error::Validation(ValidationError::ZeroIncrement))
        ));

        let mut tally = Tally::default();
        tally.extend(&outcomes);
        assert_eq!(
            tally,
            Tally {
                success: 1,
                skip: 1,
                failure: 1
            }
        );
        assert_eq!(tally.total(), 3);
        assert!(!tally.passed());
    }

    /// Wraps a routine, optionally dropping its resets and slowing either side down.
    struct Altered<R> {
        inner: R,
        reset: bool,
        device_delay: Duration,
        host_delay: Duration,
    }

    impl<R> Altered<R> {
        fn new(inner: R) -> Self {
            Self {
                inner,
                reset: true,
                device_delay: Duration::ZERO,
                host_delay: Duration::ZERO,
            }
        }
    }

    impl<D: Device, R: Routine<D>> Routine<D> for Altered<R> {
        type Elem = R::Elem;
        type Operands<'a> = R::Operands<'a> where Self: 'a, D: 'a;

        fn name(&self) -> String {
            self.inner.name()
        }

        fn descriptors(&self) -> Vec<Descriptor> {
            self.inner.descriptors()
        }

        fn operation_count(&self) -> f64 {
            self.inner.operation_count()
        }

        fn idempotent(&self) -> bool {
            self.inner.idempotent()
        }

        fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<Self::Operands<'a>> {
            self.inner.upload(ctx)
        }

        fn reset(&self, ops: &mut Self::Operands<'_>) -> DeviceResult<()> {
            if self.reset {
                self.inner.reset(ops)
            } else {
                Ok(())
            }
        }

        fn rewrite(&self, ops: &mut Self::Operands<'_>) -> DeviceResult<()> {
            if self.reset {
                self.inner.rewrite(ops)
            } else {
                Ok(())
            }
        }

        fn enqueue(
            &self,
            ctx: &ExecutionContext<D>,
            ops: &mut Self::Operands<'_>,
            wait: &[&D::Event],
        ) -> DeviceResult<D::Event> {
            thread::sleep(self.device_delay);
            self.inner.enqueue(ctx, ops, wait)
        }

        fn download(&self, ops: &Self::Operands<'_>) -> DeviceResult<Vec<R::Elem>> {
            self.inner.download(ops)
        }

        fn reference(&self) -> Vec<R::Elem> {
            thread::sleep(self.host_delay);
            self.inner.reference()
        }
    }

    #[test]
    fn accumulated_output_is_a_mismatch() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let routine = Altered {
            reset: false,
            ..Altered::new(spr(5))
        };
        let outcome = Harness::default().run(&ctx, &routine);
        match outcome {
            Outcome::Failure(Error::Mismatch {
                max_error,
                tolerance,
            }) => {
                assert_eq!(tolerance, 1e-4);
                assert!(max_error > tolerance);
            }
            other => panic!("expected a mismatch, got {other:?}"),
        }
        assert_eq!(ctx.device().used(), 0);

        let outcome = Harness::new(HarnessConfig::default().with_mode(Mode::RoundTrip))
            .run(&ctx, &routine);
        assert!(matches!(outcome, Outcome::Failure(Error::Mismatch { .. })));

        // nothing to compare against, so nothing fails
        let outcome = Harness::new(HarnessConfig::default().with_reference(false))
            .run(&ctx, &routine);
        let report = outcome.report().unwrap();
        assert_eq!((report.max_error, report.reference_time), (None, None));
        assert!(!report.device_slower);
    }

    #[test]
    fn slow_devices_are_flagged() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let harness = Harness::new(HarnessConfig::default().with_warmup(0).with_iterations(3));

        let slow_device = Altered {
            device_delay: Duration::from_millis(20),
            ..Altered::new(spr(2))
        };
        let report = harness.run(&ctx, &slow_device);
        let report = report.report().unwrap();
        assert!(report.device_slower);
        assert!(report.sample.average() >= Duration::from_millis(19));
        assert!(report.reference_time.unwrap() < report.sample.average());

        let slow_host = Altered {
            host_delay: Duration::from_millis(20),
            ..Altered::new(spr(2))
        };
        let report = harness.run(&ctx, &slow_host);
        assert!(!report.report().unwrap().device_slower);
    }

    #[test]
    fn overflowing_shapes_fail_without_panicking() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let outcome = Harness::default().run_case(&ctx, || {
            SyrProblem::<f64>::random(
                &mut HostBufferGenerator::default(),
                MatrixShape::full(3, 3, Order::ColumnMajor).with_ld(1 << 63),
                VectorShape::new(3, 1),
                1.,
            )
        });
        assert!(matches!(
            outcome,
            Outcome::Failure(Error::Validation(ValidationError::ExtentOverflow))
        ));
        assert_eq!(ctx.device().used(), 0);
    }

    #[test]
    fn average_over_many_iterations() {
        let sample = TimingSample {
            iterations: 1 << 32,
            total: Duration::from_secs(1 << 32),
            operations: 1e9,
        };
        assert_eq!(sample.average(), Duration::from_secs(1));
        assert_relative_eq!(sample.throughput(), 1.);
    }

    #[test]
    fn relative_error() {
        assert_eq!(max_relative_error(&[1f32, 2.], &[1., 2.]), 0.);
        assert_relative_eq!(max_relative_error(&[1f64, 2.5], &[1., 2.]), 0.25);
        assert_eq!(max_relative_error(&[0.5f64], &[0.]), 0.5);
        assert_eq!(max_relative_error(&[1f32], &[1., 2.]), f64::INFINITY);
        assert_relative_eq!(
            max_relative_error(&[Complex32::new(0., 1.)], &[Complex32::new(0., 2.)]),
            0.5
        );
    }

    #[test]
    fn default_tolerance_follows_precision() {
        let config = HarnessConfig::default();
        assert_eq!(config.tolerance_for::<f32>(), 1e-4);
        assert_eq!(config.tolerance_for::<Complex64>(), 1e-10);
        assert_eq!(config.with_tolerance(0.5).tolerance_for::<f64>(), 0.5);
        assert_eq!(config.with_iterations(0).iterations, 1);
    }
}
