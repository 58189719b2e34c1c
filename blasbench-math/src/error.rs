use blasbench_sys::DeviceError;
use thiserror::Error;

use crate::gate::Insufficient;

/// Shape or argument problems, detected before anything is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid leading dimension {ld}: must be at least {min}")]
    InvalidLeadingDimension { ld: usize, min: usize },

    #[error("inconsistent shape: {0}")]
    InconsistentShape(String),

    #[error("vector increment must not be zero")]
    ZeroIncrement,

    #[error("operand extent does not fit in the address space")]
    ExtentOverflow,

    #[error("expected {expected} literal values, got {actual}")]
    LiteralLength { expected: usize, actual: usize },
}

impl From<ValidationError> for DeviceError {
    fn from(err: ValidationError) -> Self {
        DeviceError::InvalidArgument(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Insufficient(#[from] Insufficient),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("device result differs from the host reference: max relative error {max_error:e} exceeds {tolerance:e}")]
    Mismatch { max_error: f64, tolerance: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
