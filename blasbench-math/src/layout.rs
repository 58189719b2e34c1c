//! Storage flags shared by every routine, and the rules mapping row-major calls onto
//! column-major backends.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    RowMajor,
    ColumnMajor,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uplo {
    Upper = b'U',
    Lower = b'L',
}

impl Uplo {
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    NoTrans = b'N',
    Trans = b'T',
    ConjTrans = b'C',
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diag {
    NonUnit = b'N',
    Unit = b'U',
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left = b'L',
    Right = b'R',
}

impl Side {
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Position of element `(i, j)` of a dense matrix.
pub fn full_index(order: Order, ld: usize, i: usize, j: usize) -> usize {
    match order {
        Order::ColumnMajor => i + j * ld,
        Order::RowMajor => i * ld + j,
    }
}

/// Position of element `(i, j)` of a packed `n x n` matrix.
///
/// `(i, j)` must lie in the stored `uplo` triangle.
pub fn packed_index(order: Order, uplo: Uplo, n: usize, i: usize, j: usize) -> usize {
    match (order, uplo) {
        (Order::ColumnMajor, Uplo::Upper) => {
            debug_assert!(i <= j);
            i + j * (j + 1) / 2
        }
        (Order::ColumnMajor, Uplo::Lower) => {
            debug_assert!(i >= j);
            j * n - j * j.saturating_sub(1) / 2 + (i - j)
        }
        // a row-major triangle is the column-major opposite triangle of the transpose
        (Order::RowMajor, uplo) => packed_index(Order::ColumnMajor, uplo.flip(), n, j, i),
    }
}

/// Column-major description of a symmetric or Hermitian operand stored in `order`.
///
/// Reading row-major storage as column-major yields the transpose. For symmetric and
/// Hermitian matrices that is the opposite triangle of the conjugate, so the triangle flips
/// and the data has to be conjugated in and out of a column-major routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricLayout {
    pub uplo: Uplo,
    pub conjugate: bool,
}

impl SymmetricLayout {
    pub fn column_major(order: Order, uplo: Uplo) -> Self {
        match order {
            Order::ColumnMajor => Self {
                uplo,
                conjugate: false,
            },
            Order::RowMajor => Self {
                uplo: uplo.flip(),
                conjugate: true,
            },
        }
    }
}

/// Column-major description of a triangular solve stored in `order`.
///
/// Row-major `op(A) X = B` is column-major `X^T op(A)^T = B^T`: the side and triangle flip
/// and the dimensions swap, the transpose flag is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangularLayout {
    pub side: Side,
    pub uplo: Uplo,
    pub m: usize,
    pub n: usize,
}

impl TriangularLayout {
    pub fn column_major(order: Order, side: Side, uplo: Uplo, m: usize, n: usize) -> Self {
        match order {
            Order::ColumnMajor => Self { side, uplo, m, n },
            Order::RowMajor => Self {
                side: side.flip(),
                uplo: uplo.flip(),
                m: n,
                n: m,
            },
        }
    }
}
