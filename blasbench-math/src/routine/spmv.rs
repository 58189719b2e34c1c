use blasbench_sys::{AccessMode, Device, DeviceResult, ExecutionContext};

use super::{ensure, routine_name, Routine};
use crate::{
    blas::Spmv,
    descriptor::{Descriptor, MatrixShape, Storage, VectorShape},
    element::Element,
    error::ValidationError,
    host::{HostBuffer, HostBufferGenerator},
    operand::Operand,
    reference::{self, Reference},
};

/// `y := alpha AP x + beta y` with `AP` packed symmetric or Hermitian.
#[derive(Debug, Clone)]
pub struct SpmvProblem<T: Element> {
    ap_shape: MatrixShape,
    x_shape: VectorShape,
    y_shape: VectorShape,
    alpha: T,
    beta: T,
    ap: HostBuffer<T>,
    x: HostBuffer<T>,
    y: HostBuffer<T>,
}

type Descriptors = (Descriptor, Descriptor, Descriptor);

fn validate(
    ap: &MatrixShape,
    x: &VectorShape,
    y: &VectorShape,
) -> Result<Descriptors, ValidationError> {
    ensure(ap.storage == Storage::Packed, || {
        format!("packed product on {:?} storage", ap.storage)
    })?;
    let ap_desc = ap.describe()?;
    ensure(x.n == ap.rows && y.n == ap.rows, || {
        format!(
            "x and y have {} and {} elements for a {}x{} matrix",
            x.n, y.n, ap.rows, ap.cols
        )
    })?;
    Ok((ap_desc, x.describe()?, y.describe()?))
}

impl<T: Element> SpmvProblem<T> {
    /// Pseudorandom operands. The diagonal of `AP` is real, as Hermitian matrices require.
    pub fn random(
        gen: &mut HostBufferGenerator,
        ap: MatrixShape,
        x: VectorShape,
        y: VectorShape,
        alpha: T,
        beta: T,
    ) -> Result<Self, ValidationError> {
        let (ap_desc, x_desc, y_desc) = validate(&ap, &x, &y)?;
        let mut ap_buf = gen.random(ap_desc);
        ap_buf.make_packed_diagonal_real(ap.order, ap.uplo, ap.rows);
        let x_buf = gen.random(x_desc);
        Ok(Self {
            ap_shape: ap,
            x_shape: x,
            y_shape: y,
            alpha,
            beta,
            ap: ap_buf,
            x: x_buf,
            y: gen.random(y_desc),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_literal(
        ap: MatrixShape,
        ap_values: &[T],
        x: VectorShape,
        x_values: &[T],
        y: VectorShape,
        y_values: &[T],
        alpha: T,
        beta: T,
    ) -> Result<Self, ValidationError> {
        let (ap_desc, x_desc, y_desc) = validate(&ap, &x, &y)?;
        Ok(Self {
            ap_shape: ap,
            x_shape: x,
            y_shape: y,
            alpha,
            beta,
            ap: HostBuffer::from_literal(ap_desc, ap_values)?,
            x: HostBuffer::from_literal(x_desc, x_values)?,
            y: HostBuffer::from_literal(y_desc, y_values)?,
        })
    }

    pub fn n(&self) -> usize {
        self.ap_shape.rows
    }

    pub fn ap(&self) -> &HostBuffer<T> {
        &self.ap
    }

    pub fn x(&self) -> &HostBuffer<T> {
        &self.x
    }

    pub fn y(&self) -> &HostBuffer<T> {
        &self.y
    }
}

pub struct SpmvOperands<'a, T, D: Device> {
    pub ap: Operand<'a, T, D>,
    pub x: Operand<'a, T, D>,
    pub y: Operand<'a, T, D>,
}

impl<T, D> Routine<D> for SpmvProblem<T>
where
    T: Spmv<D> + Reference,
    D: Device,
{
    type Elem = T;
    type Operands<'a> = SpmvOperands<'a, T, D> where Self: 'a, D: 'a;

    fn name(&self) -> String {
        routine_name::<T>("spmv", "hpmv")
    }

    fn descriptors(&self) -> Vec<Descriptor> {
        vec![
            *self.ap.descriptor(),
            *self.x.descriptor(),
            *self.y.descriptor(),
        ]
    }

    fn operation_count(&self) -> f64 {
        let n = self.n() as f64;
        2. * n * n
    }

    fn idempotent(&self) -> bool {
        self.beta == T::zero()
    }

    fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<SpmvOperands<'a, T, D>> {
        Ok(SpmvOperands {
            ap: Operand::upload(ctx, "AP", AccessMode::ReadOnly, &self.ap)?,
            x: Operand::upload(ctx, "X", AccessMode::ReadOnly, &self.x)?,
            y: Operand::upload(ctx, "Y", AccessMode::ReadWrite, &self.y)?,
        })
    }

    fn reset(&self, ops: &mut SpmvOperands<'_, T, D>) -> DeviceResult<()> {
        ops.y.reset()
    }

    fn rewrite(&self, ops: &mut SpmvOperands<'_, T, D>) -> DeviceResult<()> {
        ops.ap.reset()?;
        ops.x.reset()?;
        ops.y.reset()
    }

    fn enqueue(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut SpmvOperands<'_, T, D>,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event> {
        let SpmvOperands { ap, x, y } = ops;
        let y_offset = y.offset();
        <T as Spmv<D>>::spmv(
            ctx,
            self.ap_shape.order,
            self.ap_shape.uplo,
            self.n(),
            self.alpha,
            ap.buffer(),
            ap.offset(),
            x.buffer(),
            x.offset(),
            self.x_shape.inc,
            self.beta,
            y.buffer_mut(),
            y_offset,
            self.y_shape.inc,
            wait,
        )
    }

    fn download(&self, ops: &SpmvOperands<'_, T, D>) -> DeviceResult<Vec<T>> {
        ops.y.download()
    }

    fn reference(&self) -> Vec<T> {
        let mut out = self.y.clone();
        reference::spmv(
            self.ap_shape.order,
            self.ap_shape.uplo,
            self.n(),
            self.alpha,
            self.ap.operand(),
            self.x.operand(),
            self.x_shape.inc,
            self.beta,
            out.operand_mut(),
            self.y_shape.inc,
        );
        out.into_vec()
    }
}
