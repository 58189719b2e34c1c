use crate::{
    error::ValidationError,
    layout::{Diag, Order, Transpose, Uplo},
};

/// How the elements of a matrix operand are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    Full,
    /// `kl` sub-diagonals and `ku` super-diagonals
    Banded { kl: usize, ku: usize },
    /// One triangle of a triangular, symmetric or Hermitian matrix in `n (n + 1) / 2` elements
    Packed,
}

/// Extent of an operand buffer, as computed by [`MatrixShape::describe`] or [`VectorShape::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Resolved leading dimension, or the absolute increment of a vector. Unused for packed storage.
    pub ld: usize,
    /// Elements spanned by the operand, excluding the offset
    pub len: usize,
    pub offset: usize,
}

impl Descriptor {
    /// Elements the buffer must hold. Saturates, so an overflowing extent never passes a
    /// size check.
    pub fn required(&self) -> usize {
        self.len.saturating_add(self.offset)
    }

    pub fn bytes<T>(&self) -> usize {
        self.required().saturating_mul(std::mem::size_of::<T>())
    }
}

/// Logical shape and storage parameters of a matrix operand.
///
/// `rows x cols` is the shape of `op(A)`: transposed operands are stored `cols x rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    pub rows: usize,
    pub cols: usize,
    pub order: Order,
    pub storage: Storage,
    pub uplo: Uplo,
    pub trans: Transpose,
    pub diag: Diag,
    /// Leading dimension, 0 to use the minimum
    pub ld: usize,
    pub offset: usize,
}

impl MatrixShape {
    pub fn full(rows: usize, cols: usize, order: Order) -> Self {
        Self {
            rows,
            cols,
            order,
            storage: Storage::Full,
            uplo: Uplo::Upper,
            trans: Transpose::NoTrans,
            diag: Diag::NonUnit,
            ld: 0,
            offset: 0,
        }
    }

    pub fn packed(n: usize, order: Order, uplo: Uplo) -> Self {
        Self {
            storage: Storage::Packed,
            uplo,
            ..Self::full(n, n, order)
        }
    }

    pub fn banded(rows: usize, cols: usize, kl: usize, ku: usize, order: Order) -> Self {
        Self {
            storage: Storage::Banded { kl, ku },
            ..Self::full(rows, cols, order)
        }
    }

    #[must_use]
    pub fn with_ld(mut self, ld: usize) -> Self {
        self.ld = ld;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_uplo(mut self, uplo: Uplo) -> Self {
        self.uplo = uplo;
        self
    }

    #[must_use]
    pub fn with_trans(mut self, trans: Transpose) -> Self {
        self.trans = trans;
        self
    }

    #[must_use]
    pub fn with_diag(mut self, diag: Diag) -> Self {
        self.diag = diag;
        self
    }

    /// Stored `(rows, cols)`
    pub fn stored(&self) -> (usize, usize) {
        match self.trans {
            Transpose::NoTrans => (self.rows, self.cols),
            Transpose::Trans | Transpose::ConjTrans => (self.cols, self.rows),
        }
    }

    /// Validates the leading dimension and computes the buffer extent.
    pub fn describe(&self) -> Result<Descriptor, ValidationError> {
        let (rows, cols) = self.stored();
        let (major, minor) = match self.order {
            Order::RowMajor => (rows, cols),
            Order::ColumnMajor => (cols, rows),
        };

        let (ld, len) = match self.storage {
            Storage::Full => {
                let ld = resolve_ld(self.ld, minor)?;
                (ld, span(major, ld, minor)?)
            }
            Storage::Banded { kl, ku } => {
                let band = kl
                    .checked_add(ku)
                    .and_then(|b| b.checked_add(1))
                    .ok_or(ValidationError::ExtentOverflow)?;
                let ld = resolve_ld(self.ld, band)?;
                (ld, span(major, ld, band)?)
            }
            Storage::Packed => {
                if rows != cols {
                    return Err(ValidationError::InconsistentShape(format!(
                        "packed storage needs a square matrix, got {rows}x{cols}"
                    )));
                }
                let len = rows
                    .checked_add(1)
                    .and_then(|r| r.checked_mul(rows))
                    .ok_or(ValidationError::ExtentOverflow)?;
                (0, len / 2)
            }
        };

        checked_extent(ld, len, self.offset)
    }
}

/// Elements from the first to the last stored one: the last major line needs no padding.
fn span(major: usize, ld: usize, minor: usize) -> Result<usize, ValidationError> {
    match major {
        0 => Ok(0),
        major => (major - 1)
            .checked_mul(ld)
            .and_then(|s| s.checked_add(minor))
            .ok_or(ValidationError::ExtentOverflow),
    }
}

fn checked_extent(ld: usize, len: usize, offset: usize) -> Result<Descriptor, ValidationError> {
    if len.checked_add(offset).is_none() {
        return Err(ValidationError::ExtentOverflow);
    }
    Ok(Descriptor { ld, len, offset })
}

fn resolve_ld(ld: usize, min: usize) -> Result<usize, ValidationError> {
    match ld {
        0 => Ok(min),
        ld if ld < min => Err(ValidationError::InvalidLeadingDimension { ld, min }),
        ld => Ok(ld),
    }
}

/// Length, stride and offset of a vector operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorShape {
    pub n: usize,
    pub inc: isize,
    pub offset: usize,
}

impl VectorShape {
    pub fn new(n: usize, inc: isize) -> Self {
        Self { n, inc, offset: 0 }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn describe(&self) -> Result<Descriptor, ValidationError> {
        if self.inc == 0 {
            return Err(ValidationError::ZeroIncrement);
        }
        let step = self.inc.unsigned_abs();
        let len = match self.n {
            0 => 0,
            n => (n - 1)
                .checked_mul(step)
                .and_then(|s| s.checked_add(1))
                .ok_or(ValidationError::ExtentOverflow)?,
        };
        checked_extent(step, len, self.offset)
    }
}
