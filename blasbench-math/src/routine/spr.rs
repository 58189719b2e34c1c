use blasbench_sys::{AccessMode, Device, DeviceResult, ExecutionContext};

use super::{ensure, routine_name, Routine};
use crate::{
    blas::Spr,
    descriptor::{Descriptor, MatrixShape, Storage, VectorShape},
    element::Element,
    error::ValidationError,
    host::{HostBuffer, HostBufferGenerator},
    operand::Operand,
    reference::{self, Reference},
};

/// `AP := alpha x x^H + AP`, the packed rank-1 update.
#[derive(Debug, Clone)]
pub struct SprProblem<T: Element> {
    ap_shape: MatrixShape,
    x_shape: VectorShape,
    alpha: T::Real,
    ap: HostBuffer<T>,
    x: HostBuffer<T>,
}

fn validate(
    ap: &MatrixShape,
    x: &VectorShape,
) -> Result<(Descriptor, Descriptor), ValidationError> {
    ensure(ap.storage == Storage::Packed, || {
        format!("packed update on {:?} storage", ap.storage)
    })?;
    let ap_desc = ap.describe()?;
    let x_desc = x.describe()?;
    ensure(x.n == ap.rows, || {
        format!("x has {} elements for a {}x{} matrix", x.n, ap.rows, ap.cols)
    })?;
    Ok((ap_desc, x_desc))
}

impl<T: Element> SprProblem<T> {
    /// Pseudorandom operands. The diagonal of `AP` is real, as Hermitian matrices require.
    pub fn random(
        gen: &mut HostBufferGenerator,
        ap: MatrixShape,
        x: VectorShape,
        alpha: T::Real,
    ) -> Result<Self, ValidationError> {
        let (ap_desc, x_desc) = validate(&ap, &x)?;
        let mut ap_buf = gen.random(ap_desc);
        ap_buf.make_packed_diagonal_real(ap.order, ap.uplo, ap.rows);
        Ok(Self {
            ap_shape: ap,
            x_shape: x,
            alpha,
            ap: ap_buf,
            x: gen.random(x_desc),
        })
    }

    pub fn from_literal(
        ap: MatrixShape,
        ap_values: &[T],
        x: VectorShape,
        x_values: &[T],
        alpha: T::Real,
    ) -> Result<Self, ValidationError> {
        let (ap_desc, x_desc) = validate(&ap, &x)?;
        Ok(Self {
            ap_shape: ap,
            x_shape: x,
            alpha,
            ap: HostBuffer::from_literal(ap_desc, ap_values)?,
            x: HostBuffer::from_literal(x_desc, x_values)?,
        })
    }

    pub fn n(&self) -> usize {
        self.ap_shape.rows
    }

    pub fn alpha(&self) -> T::Real {
        self.alpha
    }

    pub fn ap(&self) -> &HostBuffer<T> {
        &self.ap
    }

    pub fn x(&self) -> &HostBuffer<T> {
        &self.x
    }
}

pub struct SprOperands<'a, T, D: Device> {
    pub ap: Operand<'a, T, D>,
    pub x: Operand<'a, T, D>,
}

impl<T, D> Routine<D> for SprProblem<T>
where
    T: Spr<D> + Reference,
    D: Device,
{
    type Elem = T;
    type Operands<'a> = SprOperands<'a, T, D> where Self: 'a, D: 'a;

    fn name(&self) -> String {
        routine_name::<T>("spr", "hpr")
    }

    fn descriptors(&self) -> Vec<Descriptor> {
        vec![*self.ap.descriptor(), *self.x.descriptor()]
    }

    fn operation_count(&self) -> f64 {
        let n = self.n() as f64;
        n * (n + 1.)
    }

    fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<SprOperands<'a, T, D>> {
        Ok(SprOperands {
            ap: Operand::upload(ctx, "AP", AccessMode::ReadWrite, &self.ap)?,
            x: Operand::upload(ctx, "X", AccessMode::ReadOnly, &self.x)?,
        })
    }

    fn reset(&self, ops: &mut SprOperands<'_, T, D>) -> DeviceResult<()> {
        ops.ap.reset()
    }

    fn rewrite(&self, ops: &mut SprOperands<'_, T, D>) -> DeviceResult<()> {
        ops.ap.reset()?;
        ops.x.reset()
    }

    fn enqueue(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut SprOperands<'_, T, D>,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event> {
        let SprOperands { ap, x } = ops;
        let ap_offset = ap.offset();
        <T as Spr<D>>::spr(
            ctx,
            self.ap_shape.order,
            self.ap_shape.uplo,
            self.n(),
            self.alpha,
            x.buffer(),
            x.offset(),
            self.x_shape.inc,
            ap.buffer_mut(),
            ap_offset,
            wait,
        )
    }

    fn download(&self, ops: &SprOperands<'_, T, D>) -> DeviceResult<Vec<T>> {
        ops.ap.download()
    }

    fn reference(&self) -> Vec<T> {
        let mut out = self.ap.clone();
        reference::spr(
            self.ap_shape.order,
            self.ap_shape.uplo,
            self.n(),
            self.alpha,
            self.x.operand(),
            self.x_shape.inc,
            out.operand_mut(),
        );
        out.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use blasbench_sys::device::host::Host;
    use num_complex::Complex32;

    use super::*;
    use crate::layout::{Order, Uplo};

    #[test]
    fn literal_row_major_upper() {
        // [[1 2] [2 3]] packed row-major upper with one leading element
        let ap = MatrixShape::packed(2, Order::RowMajor, Uplo::Upper).with_offset(1);
        let x = VectorShape::new(2, 1);
        let problem = SprProblem::from_literal(ap, &[1f32, 2., 3.], x, &[1., -1.], 2.).unwrap();

        assert_eq!(Routine::<Host>::name(&problem), "sspr");
        assert_eq!(Routine::<Host>::operation_count(&problem), 6.);
        assert_eq!(Routine::<Host>::reference(&problem), [0., 3., 0., 5.]);
    }

    #[test]
    fn round_trip_matches_reference() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let mut gen = HostBufferGenerator::for_dimension(7);
        let problem = SprProblem::<Complex32>::random(
            &mut gen,
            MatrixShape::packed(7, Order::ColumnMajor, Uplo::Lower).with_offset(3),
            VectorShape::new(7, -2).with_offset(1),
            0.5,
        )
        .unwrap();
        assert_eq!(Routine::<Host>::name(&problem), "chpr");

        let mut ops = problem.upload(&ctx).unwrap();
        assert_eq!(
            problem.round_trip(&ctx, &mut ops).unwrap(),
            Routine::<Host>::reference(&problem)
        );
    }

    #[test]
    fn mismatched_vector() {
        let err = SprProblem::<f64>::random(
            &mut HostBufferGenerator::default(),
            MatrixShape::packed(4, Order::ColumnMajor, Uplo::Upper),
            VectorShape::new(3, 1),
            1.,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InconsistentShape(_)));

        let err = SprProblem::<f64>::random(
            &mut HostBufferGenerator::default(),
            MatrixShape::full(4, 4, Order::ColumnMajor),
            VectorShape::new(4, 1),
            1.,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InconsistentShape(_)));
    }
}
