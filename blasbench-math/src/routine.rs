//! Benchmark workloads: the host operands of one routine call and how to run it.

use blasbench_sys::{Device, DeviceResult, ExecutionContext};

use crate::{descriptor::Descriptor, element::Element, error::ValidationError};

mod spmv;
mod spr;
mod syr;
mod trsm;

pub use spmv::{SpmvOperands, SpmvProblem};
pub use spr::{SprOperands, SprProblem};
pub use syr::{SyrOperands, SyrProblem};
pub use trsm::{TrsmOperands, TrsmProblem};

/// A routine call with fixed shapes, scalars and host operands, runnable on devices `D`.
///
/// The host operands are never modified: they are the snapshot every device reset and the
/// host reference start from.
pub trait Routine<D: Device> {
    type Elem: Element;

    /// Device copies of the operands, alive for one test instance
    type Operands<'a>
    where
        Self: 'a,
        D: 'a;

    /// BLAS name, such as `chpr` or `dtrsm`
    fn name(&self) -> String;

    /// Every operand buffer, for the resource gate
    fn descriptors(&self) -> Vec<Descriptor>;

    /// Characteristic operation count of one call
    fn operation_count(&self) -> f64;

    /// Whether the output is independent of its prior contents, so repeated calls need no
    /// reset in between.
    fn idempotent(&self) -> bool {
        false
    }

    /// Allocates and uploads every operand.
    fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<Self::Operands<'a>>;

    /// Restores the read-write operands from the snapshot.
    fn reset(&self, ops: &mut Self::Operands<'_>) -> DeviceResult<()>;

    /// Restores every operand from the snapshot.
    fn rewrite(&self, ops: &mut Self::Operands<'_>) -> DeviceResult<()>;

    /// Issues the routine after `wait` without blocking on it.
    fn enqueue(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut Self::Operands<'_>,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event>;

    /// The whole output buffer, offset region included.
    fn download(&self, ops: &Self::Operands<'_>) -> DeviceResult<Vec<Self::Elem>>;

    /// The expected output buffer, computed on the host from the snapshot.
    fn reference(&self) -> Vec<Self::Elem>;

    /// One call with transfers included: write every operand, run, read the output back.
    fn round_trip(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut Self::Operands<'_>,
    ) -> DeviceResult<Vec<Self::Elem>> {
        self.rewrite(ops)?;
        let done = self.enqueue(ctx, ops, &[])?;
        ctx.wait(&[&done])?;
        self.download(ops)
    }
}

pub(crate) fn ensure(
    cond: bool,
    msg: impl FnOnce() -> String,
) -> Result<(), ValidationError> {
    if cond {
        Ok(())
    } else {
        Err(ValidationError::InconsistentShape(msg()))
    }
}

/// `s`/`d` routines are symmetric, `c`/`z` ones Hermitian
pub(crate) fn routine_name<T: Element>(real: &str, complex: &str) -> String {
    let family = if T::KIND.is_complex() { complex } else { real };
    format!("{}{family}", T::KIND.prefix())
}
