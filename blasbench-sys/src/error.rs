use thiserror::Error;

/// Errors reported by a [`crate::device::Device`] or by the buffers living on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// A raw device call returned a non-success status code.
    #[error("{op} failed with status {code}")]
    Status { op: &'static str, code: i32 },

    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    #[error("allocation of {requested} bytes exceeds the device limit of {max} bytes")]
    AllocTooLarge { requested: usize, max: usize },

    /// A transfer touched memory outside of the buffer.
    #[error("transfer of {len} elements at offset {offset} is out of bounds for a buffer of {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// A routine needs more elements than the buffer holds.
    #[error("{operand} needs {required} elements but the buffer holds {actual}")]
    BufferTooSmall {
        operand: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("{0} was declared read-only but is written by the routine")]
    ReadOnlyBuffer(&'static str),

    /// A routine argument the device rejects, such as a zero increment.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// Error coming out of a backend library that does not expose a status code.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type DeviceResult<T, E = DeviceError> = Result<T, E>;

/// Conversion of a raw backend status into a [`DeviceResult`].
pub trait ToDeviceResult {
    fn to_device_result(self, op: &'static str) -> DeviceResult<()>;
}

impl ToDeviceResult for i32 {
    fn to_device_result(self, op: &'static str) -> DeviceResult<()> {
        match self {
            0 => Ok(()),
            code => Err(DeviceError::Status { op, code }),
        }
    }
}
