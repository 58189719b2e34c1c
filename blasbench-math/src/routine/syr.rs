use blasbench_sys::{AccessMode, Device, DeviceResult, ExecutionContext};

use super::{ensure, routine_name, Routine};
use crate::{
    blas::Syr,
    descriptor::{Descriptor, MatrixShape, Storage, VectorShape},
    element::Element,
    error::ValidationError,
    host::{HostBuffer, HostBufferGenerator},
    operand::Operand,
    reference::{self, Reference},
};

/// `A := alpha x x^H + A` on one triangle of a full matrix.
#[derive(Debug, Clone)]
pub struct SyrProblem<T: Element> {
    a_shape: MatrixShape,
    x_shape: VectorShape,
    alpha: T::Real,
    a: HostBuffer<T>,
    x: HostBuffer<T>,
}

fn validate(a: &MatrixShape, x: &VectorShape) -> Result<(Descriptor, Descriptor), ValidationError> {
    ensure(a.storage == Storage::Full, || {
        format!("rank-1 update on {:?} storage", a.storage)
    })?;
    ensure(a.rows == a.cols, || {
        format!("symmetric matrix must be square, got {}x{}", a.rows, a.cols)
    })?;
    ensure(x.n == a.rows, || {
        format!("x has {} elements for a {}x{} matrix", x.n, a.rows, a.cols)
    })?;
    Ok((a.describe()?, x.describe()?))
}

impl<T: Element> SyrProblem<T> {
    /// Pseudorandom operands. The unreferenced triangle of `A` is zero and its diagonal real.
    pub fn random(
        gen: &mut HostBufferGenerator,
        a: MatrixShape,
        x: VectorShape,
        alpha: T::Real,
    ) -> Result<Self, ValidationError> {
        let (a_desc, x_desc) = validate(&a, &x)?;
        let mut a_buf = gen.random(a_desc);
        a_buf.zero_unreferenced(a.order, a.uplo, a.rows);
        a_buf.make_diagonal_real(a.order, a.rows);
        Ok(Self {
            a_shape: a,
            x_shape: x,
            alpha,
            a: a_buf,
            x: gen.random(x_desc),
        })
    }

    pub fn from_literal(
        a: MatrixShape,
        a_values: &[T],
        x: VectorShape,
        x_values: &[T],
        alpha: T::Real,
    ) -> Result<Self, ValidationError> {
        let (a_desc, x_desc) = validate(&a, &x)?;
        Ok(Self {
            a_shape: a,
            x_shape: x,
            alpha,
            a: HostBuffer::from_literal(a_desc, a_values)?,
            x: HostBuffer::from_literal(x_desc, x_values)?,
        })
    }

    pub fn n(&self) -> usize {
        self.a_shape.rows
    }

    pub fn a(&self) -> &HostBuffer<T> {
        &self.a
    }

    pub fn x(&self) -> &HostBuffer<T> {
        &self.x
    }
}

pub struct SyrOperands<'a, T, D: Device> {
    pub a: Operand<'a, T, D>,
    pub x: Operand<'a, T, D>,
}

impl<T, D> Routine<D> for SyrProblem<T>
where
    T: Syr<D> + Reference,
    D: Device,
{
    type Elem = T;
    type Operands<'a> = SyrOperands<'a, T, D> where Self: 'a, D: 'a;

    fn name(&self) -> String {
        routine_name::<T>("syr", "her")
    }

    fn descriptors(&self) -> Vec<Descriptor> {
        vec![*self.a.descriptor(), *self.x.descriptor()]
    }

    fn operation_count(&self) -> f64 {
        let n = self.n() as f64;
        n * n
    }

    fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<SyrOperands<'a, T, D>> {
        Ok(SyrOperands {
            a: Operand::upload(ctx, "A", AccessMode::ReadWrite, &self.a)?,
            x: Operand::upload(ctx, "X", AccessMode::ReadOnly, &self.x)?,
        })
    }

    fn reset(&self, ops: &mut SyrOperands<'_, T, D>) -> DeviceResult<()> {
        ops.a.reset()
    }

    fn rewrite(&self, ops: &mut SyrOperands<'_, T, D>) -> DeviceResult<()> {
        ops.a.reset()?;
        ops.x.reset()
    }

    fn enqueue(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut SyrOperands<'_, T, D>,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event> {
        let SyrOperands { a, x } = ops;
        let a_offset = a.offset();
        let a_ld = a.ld();
        <T as Syr<D>>::syr(
            ctx,
            self.a_shape.order,
            self.a_shape.uplo,
            self.n(),
            self.alpha,
            x.buffer(),
            x.offset(),
            self.x_shape.inc,
            a.buffer_mut(),
            a_offset,
            a_ld,
            wait,
        )
    }

    fn download(&self, ops: &SyrOperands<'_, T, D>) -> DeviceResult<Vec<T>> {
        ops.a.download()
    }

    fn reference(&self) -> Vec<T> {
        let mut out = self.a.clone();
        let lda = out.descriptor().ld;
        reference::syr(
            self.a_shape.order,
            self.a_shape.uplo,
            self.n(),
            self.alpha,
            self.x.operand(),
            self.x_shape.inc,
            out.operand_mut(),
            lda,
        );
        out.into_vec()
    }
}
