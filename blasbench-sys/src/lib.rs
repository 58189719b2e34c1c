//! Device seam of blasbench: devices, execution contexts and the buffers living on them.

pub mod buffer;
pub mod context;
pub mod device;
pub mod error;

pub use buffer::DeviceBuffer;
pub use context::ExecutionContext;
pub use device::{AccessMode, Device, DeviceInfo};
pub use error::{DeviceError, DeviceResult};
