use blasbench_sys::{AccessMode, Device, DeviceResult, ExecutionContext};

use super::{ensure, routine_name, Routine};
use crate::{
    blas::Trsm,
    descriptor::{Descriptor, MatrixShape, Storage},
    element::Element,
    error::ValidationError,
    host::{HostBuffer, HostBufferGenerator},
    layout::{full_index, Diag, Side, Transpose},
    operand::Operand,
    reference::{self, Reference},
};

/// Triangular solve with multiple right hand sides.
///
/// `B` is `m x n`. `A` is `m x m` when solving from the left, `n x n` from the right; its
/// shape carries the triangle, transpose and diagonal flags.
#[derive(Debug, Clone)]
pub struct TrsmProblem<T: Element> {
    side: Side,
    a_shape: MatrixShape,
    b_shape: MatrixShape,
    alpha: T,
    a: HostBuffer<T>,
    b: HostBuffer<T>,
}

fn validate(
    side: Side,
    a: &MatrixShape,
    b: &MatrixShape,
) -> Result<(Descriptor, Descriptor), ValidationError> {
    ensure(a.storage == Storage::Full && b.storage == Storage::Full, || {
        format!("triangular solve on {:?} and {:?} storage", a.storage, b.storage)
    })?;
    ensure(a.order == b.order, || {
        format!("A is {:?} but B is {:?}", a.order, b.order)
    })?;
    ensure(b.trans == Transpose::NoTrans, || "B cannot be transposed".to_owned())?;
    let k = match side {
        Side::Left => b.rows,
        Side::Right => b.cols,
    };
    ensure(a.rows == k && a.cols == k, || {
        format!(
            "A is {}x{} for a {side:?} solve with a {}x{} B",
            a.rows, a.cols, b.rows, b.cols
        )
    })?;
    Ok((a.describe()?, b.describe()?))
}

/// Makes the random triangle of `A` safe to solve with.
///
/// A non-unit diagonal is lifted until every row is strictly diagonally dominant. With a unit
/// diagonal the off-diagonal part is shrunk instead.
fn condition<T: Element>(a: &mut HostBuffer<T>, shape: &MatrixShape, scale: f64) {
    let k = shape.rows;
    let ld = a.descriptor().ld;
    let bound = T::RANDOM_BOUND / scale;
    let (shrink, lift) = match shape.diag {
        Diag::NonUnit => (1., 2. * k as f64 * bound),
        Diag::Unit => (1. / (4. * k as f64 * bound), 0.),
    };
    let (shrink, lift) = (T::real(shrink), T::from_real(T::real(lift)));

    a.zero_unreferenced(shape.order, shape.uplo, k);
    let data = a.operand_mut();
    for i in 0..k {
        for j in 0..k {
            let v = &mut data[full_index(shape.order, ld, i, j)];
            if i == j {
                *v += lift;
            } else {
                *v = v.scale(shrink);
            }
        }
    }
}

impl<T: Element> TrsmProblem<T> {
    pub fn random(
        gen: &mut HostBufferGenerator,
        side: Side,
        a: MatrixShape,
        b: MatrixShape,
        alpha: T,
    ) -> Result<Self, ValidationError> {
        let (a_desc, b_desc) = validate(side, &a, &b)?;
        let mut a_buf = gen.random(a_desc);
        condition(&mut a_buf, &a, gen.scale());
        Ok(Self {
            side,
            a_shape: a,
            b_shape: b,
            alpha,
            a: a_buf,
            b: gen.random(b_desc),
        })
    }

    /// Operands from caller values for `A` and `B`, excluding the offset regions.
    pub fn from_literal(
        side: Side,
        a: MatrixShape,
        a_values: &[T],
        b: MatrixShape,
        b_values: &[T],
        alpha: T,
    ) -> Result<Self, ValidationError> {
        let (a_desc, b_desc) = validate(side, &a, &b)?;
        Ok(Self {
            side,
            a_shape: a,
            b_shape: b,
            alpha,
            a: HostBuffer::from_literal(a_desc, a_values)?,
            b: HostBuffer::from_literal(b_desc, b_values)?,
        })
    }

    /// Operands from whole buffers, where the offsets address blocks of larger matrices.
    pub fn from_buffers(
        side: Side,
        a: MatrixShape,
        a_values: Vec<T>,
        b: MatrixShape,
        b_values: Vec<T>,
        alpha: T,
    ) -> Result<Self, ValidationError> {
        let (a_desc, b_desc) = validate(side, &a, &b)?;
        Ok(Self {
            side,
            a_shape: a,
            b_shape: b,
            alpha,
            a: HostBuffer::from_buffer(a_desc, a_values)?,
            b: HostBuffer::from_buffer(b_desc, b_values)?,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// `(m, n)` of `B`
    pub fn dims(&self) -> (usize, usize) {
        (self.b_shape.rows, self.b_shape.cols)
    }

    pub fn a(&self) -> &HostBuffer<T> {
        &self.a
    }

    pub fn b(&self) -> &HostBuffer<T> {
        &self.b
    }
}

pub struct TrsmOperands<'a, T, D: Device> {
    pub a: Operand<'a, T, D>,
    pub b: Operand<'a, T, D>,
}

impl<T, D> Routine<D> for TrsmProblem<T>
where
    T: Trsm<D> + Reference,
    D: Device,
{
    type Elem = T;
    type Operands<'a> = TrsmOperands<'a, T, D> where Self: 'a, D: 'a;

    fn name(&self) -> String {
        routine_name::<T>("trsm", "trsm")
    }

    fn descriptors(&self) -> Vec<Descriptor> {
        vec![*self.a.descriptor(), *self.b.descriptor()]
    }

    fn operation_count(&self) -> f64 {
        let (m, n) = self.dims();
        (m * n * self.a_shape.rows) as f64
    }

    fn upload<'a>(&'a self, ctx: &'a ExecutionContext<D>) -> DeviceResult<TrsmOperands<'a, T, D>> {
        Ok(TrsmOperands {
            a: Operand::upload(ctx, "A", AccessMode::ReadOnly, &self.a)?,
            b: Operand::upload(ctx, "B", AccessMode::ReadWrite, &self.b)?,
        })
    }

    fn reset(&self, ops: &mut TrsmOperands<'_, T, D>) -> DeviceResult<()> {
        ops.b.reset()
    }

    fn rewrite(&self, ops: &mut TrsmOperands<'_, T, D>) -> DeviceResult<()> {
        ops.a.reset()?;
        ops.b.reset()
    }

    fn enqueue(
        &self,
        ctx: &ExecutionContext<D>,
        ops: &mut TrsmOperands<'_, T, D>,
        wait: &[&D::Event],
    ) -> DeviceResult<D::Event> {
        let TrsmOperands { a, b } = ops;
        let b_offset = b.offset();
        let b_ld = b.ld();
        let (m, n) = self.dims();
        <T as Trsm<D>>::trsm(
            ctx,
            self.a_shape.order,
            self.side,
            self.a_shape.uplo,
            self.a_shape.trans,
            self.a_shape.diag,
            m,
            n,
            self.alpha,
            a.buffer(),
            a.offset(),
            a.ld(),
            b.buffer_mut(),
            b_offset,
            b_ld,
            wait,
        )
    }

    fn download(&self, ops: &TrsmOperands<'_, T, D>) -> DeviceResult<Vec<T>> {
        ops.b.download()
    }

    fn reference(&self) -> Vec<T> {
        let (m, n) = self.dims();
        let mut out = self.b.clone();
        let ldb = out.descriptor().ld;
        reference::trsm(
            self.a_shape.order,
            self.side,
            self.a_shape.uplo,
            self.a_shape.trans,
            self.a_shape.diag,
            m,
            n,
            self.alpha,
            self.a.operand(),
            self.a.descriptor().ld,
            out.operand_mut(),
            ldb,
        );
        out.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use blasbench_sys::device::host::Host;
    use num_complex::Complex32;

    use super::*;
    use crate::layout::{Order, Uplo};

    fn c(re: f32) -> Complex32 {
        Complex32::new(re, 0.)
    }

    #[test]
    fn lower_right_block_of_row_major_matrices() {
        let (m, n, off) = (4, 5, 1);
        let a: Vec<Complex32> = [
            11., 12., 13., 14., //
            0., 22., 23., 24., //
            0., 0., 33., 34., //
            0., 0., 0., 44.,
        ]
        .into_iter()
        .map(c)
        .collect();
        let b: Vec<Complex32> = (1..=m)
            .flat_map(|i| (1..=n).map(move |j| c((10 * i + j) as f32)))
            .collect();

        let problem = TrsmProblem::from_buffers(
            Side::Left,
            MatrixShape::full(m - off, m - off, Order::RowMajor)
                .with_uplo(Uplo::Upper)
                .with_ld(m)
                .with_offset(m + off),
            a.clone(),
            MatrixShape::full(m - off, n - off, Order::RowMajor)
                .with_ld(n)
                .with_offset(n + off),
            b.clone(),
            c(10.),
        )
        .unwrap();
        assert_eq!(Routine::<Host>::name(&problem), "ctrsm");
        assert_eq!(Routine::<Host>::operation_count(&problem), 36.);

        let ctx = ExecutionContext::new(Host::new()).unwrap();
        let mut ops = problem.upload(&ctx).unwrap();
        let x = problem.round_trip(&ctx, &mut ops).unwrap();
        assert_eq!(x.len(), m * n);

        // first row and column are outside the block
        for j in 0..n {
            assert_eq!(x[j], b[j]);
        }
        for i in 0..m {
            assert_eq!(x[i * n], b[i * n]);
        }

        // A[1.., 1..] X = 10 B[1.., 1..]
        for i in 1..m {
            for j in 1..n {
                let ax: Complex32 = (1..m).map(|k| a[i * m + k] * x[k * n + j]).sum();
                let want = b[i * n + j] * 10.;
                assert_relative_eq!(ax.re, want.re, max_relative = 1e-4);
                assert_relative_eq!(ax.im, 0., epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn random_operands_are_well_conditioned() {
        let ctx = ExecutionContext::new(Host::new()).unwrap();
        for (side, diag, trans) in [
            (Side::Left, Diag::NonUnit, Transpose::NoTrans),
            (Side::Right, Diag::Unit, Transpose::ConjTrans),
            (Side::Left, Diag::Unit, Transpose::Trans),
        ] {
            let k = match side {
                Side::Left => 6,
                Side::Right => 9,
            };
            let problem = TrsmProblem::<f64>::random(
                &mut HostBufferGenerator::for_dimension(k),
                side,
                MatrixShape::full(k, k, Order::ColumnMajor)
                    .with_uplo(Uplo::Lower)
                    .with_trans(trans)
                    .with_diag(diag),
                MatrixShape::full(6, 9, Order::ColumnMajor).with_offset(2),
                0.5,
            )
            .unwrap();

            let mut ops = problem.upload(&ctx).unwrap();
            let x = problem.round_trip(&ctx, &mut ops).unwrap();
            assert!(x.iter().all(|v| v.is_finite() && v.abs() < 1e3));
            assert_eq!(x, Routine::<Host>::reference(&problem));
        }
    }

    #[test]
    fn side_fixes_the_order_of_a() {
        let err = TrsmProblem::<f32>::random(
            &mut HostBufferGenerator::default(),
            Side::Right,
            MatrixShape::full(3, 3, Order::RowMajor),
            MatrixShape::full(3, 4, Order::RowMajor),
            1.,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InconsistentShape(_)));
    }
}
