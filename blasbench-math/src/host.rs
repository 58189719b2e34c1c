use rand::{rngs::StdRng, SeedableRng};

use crate::{
    descriptor::Descriptor,
    element::Element,
    error::ValidationError,
    layout::{full_index, packed_index, Order, Uplo},
};

/// Host resident operand data, `offset` leading elements followed by the operand itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer<T> {
    data: Vec<T>,
    desc: Descriptor,
}

impl<T: Element> HostBuffer<T> {
    pub fn zeroed(desc: Descriptor) -> Self {
        Self {
            data: vec![T::zero(); desc.required()],
            desc,
        }
    }

    /// Copies caller supplied values for the operand, after a zeroed offset region.
    pub fn from_literal(desc: Descriptor, values: &[T]) -> Result<Self, ValidationError> {
        if values.len() != desc.len {
            return Err(ValidationError::LiteralLength {
                expected: desc.len,
                actual: values.len(),
            });
        }
        let mut buf = Self::zeroed(desc);
        buf.operand_mut().copy_from_slice(values);
        Ok(buf)
    }

    /// Takes over a whole buffer, offset region included.
    ///
    /// For operands addressing a block inside a larger matrix, where the leading elements
    /// are part of the data.
    pub fn from_buffer(desc: Descriptor, values: Vec<T>) -> Result<Self, ValidationError> {
        if values.len() != desc.required() {
            return Err(ValidationError::LiteralLength {
                expected: desc.required(),
                actual: values.len(),
            });
        }
        Ok(Self { data: values, desc })
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole buffer, offset region included
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The operand, starting at the offset
    pub fn operand(&self) -> &[T] {
        &self.data[self.desc.offset..]
    }

    pub fn operand_mut(&mut self) -> &mut [T] {
        &mut self.data[self.desc.offset..]
    }

    /// Zeroes the triangle of a full `n x n` symmetric matrix that routines never reference.
    pub fn zero_unreferenced(&mut self, order: Order, uplo: Uplo, n: usize) {
        let ld = self.desc.ld;
        let a = self.operand_mut();
        for i in 0..n {
            for j in 0..n {
                let unreferenced = match uplo {
                    Uplo::Upper => i > j,
                    Uplo::Lower => i < j,
                };
                if unreferenced {
                    a[full_index(order, ld, i, j)] = T::zero();
                }
            }
        }
    }

    /// Drops the imaginary part of the diagonal of a full Hermitian `n x n` matrix.
    pub fn make_diagonal_real(&mut self, order: Order, n: usize) {
        let ld = self.desc.ld;
        let a = self.operand_mut();
        for i in 0..n {
            let d = full_index(order, ld, i, i);
            a[d] = T::from_real(a[d].re());
        }
    }

    /// Drops the imaginary part of the diagonal of a packed Hermitian `n x n` matrix.
    pub fn make_packed_diagonal_real(&mut self, order: Order, uplo: Uplo, n: usize) {
        let ap = self.operand_mut();
        for i in 0..n {
            let d = packed_index(order, uplo, n, i, i);
            ap[d] = T::from_real(ap[d].re());
        }
    }
}

/// Fills host operands from a fixed-seed pseudorandom stream.
///
/// Values are uniform in `[-bound, bound] / scale`, with the bound depending on the element
/// kind and the scale chosen by the routine so that accumulations stay well conditioned.
#[derive(Debug, Clone)]
pub struct HostBufferGenerator {
    seed: u64,
    rng: StdRng,
    scale: f64,
}

impl Default for HostBufferGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl HostBufferGenerator {
    pub const DEFAULT_SEED: u64 = 10;

    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            scale: 1.,
        }
    }

    /// Default seed, scaled by `sqrt(n)` for routines accumulating over `n` terms.
    pub fn for_dimension(n: usize) -> Self {
        Self::default().with_scale((n.max(1) as f64).sqrt())
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Restarts the stream. Buffers generated afterwards repeat the ones after [`Self::new`].
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// A new buffer whose operand is pseudorandom. The offset region is zero.
    pub fn random<T: Element>(&mut self, desc: Descriptor) -> HostBuffer<T> {
        let mut buf = HostBuffer::zeroed(desc);
        let bound = T::real(T::RANDOM_BOUND);
        let inv = T::real(self.scale.recip());
        for v in buf.operand_mut() {
            *v = T::sample(&mut self.rng, bound).scale(inv);
        }
        buf
    }

    pub fn literal<T: Element>(
        &self,
        desc: Descriptor,
        values: &[T],
    ) -> Result<HostBuffer<T>, ValidationError> {
        HostBuffer::from_literal(desc, values)
    }
}
