use std::{fmt::Debug, ops::Neg};

use bytemuck::Pod;
use num_complex::Complex;
use num_traits::{Float, NumAssign};
use rand::Rng;

mod sealed {
    pub trait Sealed {}
}

/// The closed set of element kinds the routines are provided for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Float32,
    Float64,
    Complex32,
    Complex64,
}

impl ElementKind {
    /// BLAS routine prefix
    pub fn prefix(self) -> char {
        match self {
            Self::Float32 => 's',
            Self::Float64 => 'd',
            Self::Complex32 => 'c',
            Self::Complex64 => 'z',
        }
    }

    pub fn is_double(self) -> bool {
        matches!(self, Self::Float64 | Self::Complex64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex32 | Self::Complex64)
    }
}

/// A matrix element: `f32`, `f64`, `Complex<f32>` or `Complex<f64>`.
///
/// Real kinds treat conjugation as the identity, so symmetric and Hermitian routines share
/// one implementation.
pub trait Element:
    sealed::Sealed + Pod + NumAssign + Neg<Output = Self> + Debug + Send + Sync + 'static
{
    type Real: Float + NumAssign + Pod + Debug + Send + Sync;

    const KIND: ElementKind;

    /// Upper bound on the magnitude of each generated random component
    const RANDOM_BOUND: f64;

    fn conj(self) -> Self;
    fn re(self) -> Self::Real;
    fn from_real(re: Self::Real) -> Self;
    fn scale(self, by: Self::Real) -> Self;

    /// Magnitude, widened to `f64` for error measurements
    fn magnitude(self) -> f64;

    fn real(v: f64) -> Self::Real;

    /// Uniform sample with every component in `[-bound, bound]`.
    fn sample<R: Rng + ?Sized>(rng: &mut R, bound: Self::Real) -> Self;
}

macro_rules! impl_real {
    ($float:ident => $kind:ident, bound: $bound:expr) => {
        impl sealed::Sealed for $float {}

        impl Element for $float {
            type Real = $float;

            const KIND: ElementKind = ElementKind::$kind;
            const RANDOM_BOUND: f64 = $bound;

            fn conj(self) -> Self {
                self
            }

            fn re(self) -> $float {
                self
            }

            fn from_real(re: $float) -> Self {
                re
            }

            fn scale(self, by: $float) -> Self {
                self * by
            }

            fn magnitude(self) -> f64 {
                f64::from(self).abs()
            }

            fn real(v: f64) -> $float {
                v as $float
            }

            fn sample<R: Rng + ?Sized>(rng: &mut R, bound: $float) -> Self {
                rng.random_range(-bound..=bound)
            }
        }
    };
}

macro_rules! impl_complex {
    ($float:ident => $kind:ident, bound: $bound:expr) => {
        impl sealed::Sealed for Complex<$float> {}

        impl Element for Complex<$float> {
            type Real = $float;

            const KIND: ElementKind = ElementKind::$kind;
            const RANDOM_BOUND: f64 = $bound;

            fn conj(self) -> Self {
                Complex::conj(&self)
            }

            fn re(self) -> $float {
                self.re
            }

            fn from_real(re: $float) -> Self {
                Complex::new(re, 0.)
            }

            fn scale(self, by: $float) -> Self {
                self * by
            }

            fn magnitude(self) -> f64 {
                f64::from(self.norm())
            }

            fn real(v: f64) -> $float {
                v as $float
            }

            fn sample<R: Rng + ?Sized>(rng: &mut R, bound: $float) -> Self {
                Complex::new(
                    rng.random_range(-bound..=bound),
                    rng.random_range(-bound..=bound),
                )
            }
        }
    };
}

impl_real!(f32 => Float32, bound: 4.);
impl_real!(f64 => Float64, bound: 16.);
impl_complex!(f32 => Complex32, bound: 4.);
impl_complex!(f64 => Complex64, bound: 16.);

#[cfg(test)]
mod tests {
    use num_complex::{Complex32, Complex64};
    use rand::{rngs::StdRng, SeedableRng};

    use super::{Element, ElementKind};

    #[test]
    fn kinds() {
        assert_eq!(f32::KIND.prefix(), 's');
        assert_eq!(Complex64::KIND.prefix(), 'z');
        assert!(f64::KIND.is_double() && !f64::KIND.is_complex());
        assert!(Complex32::KIND.is_complex() && !ElementKind::Complex32.is_double());
    }

    #[test]
    fn conjugation() {
        assert_eq!(2.5f32.conj(), 2.5);
        assert_eq!(Complex64::new(1., 2.).conj(), Complex64::new(1., -2.));
        assert_eq!(Complex32::from_real(3.).scale(2.), Complex32::new(6., 0.));
    }

    #[test]
    fn samples_are_bounded() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..1000 {
            let v = Complex32::sample(&mut rng, 4.);
            assert!(v.re.abs() <= 4. && v.im.abs() <= 4.);
            assert!(f64::sample(&mut rng, 16.).abs() <= 16.);
        }
    }
}
