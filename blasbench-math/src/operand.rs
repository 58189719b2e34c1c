use blasbench_sys::{AccessMode, Device, DeviceBuffer, DeviceResult, ExecutionContext};
use log::debug;

use crate::{element::Element, host::HostBuffer};

/// A device buffer paired with the untouched host snapshot it was uploaded from.
///
/// Host and device share the same addressing: element `i` of the snapshot, offset region
/// included, is element `i` of the device buffer.
pub struct Operand<'a, T, D: Device> {
    name: &'static str,
    snapshot: &'a HostBuffer<T>,
    buffer: DeviceBuffer<'a, T, D>,
}

impl<'a, T: Element, D: Device> Operand<'a, T, D> {
    /// Allocates the device copy of `snapshot` and uploads it.
    pub fn upload(
        ctx: &'a ExecutionContext<D>,
        name: &'static str,
        access: AccessMode,
        snapshot: &'a HostBuffer<T>,
    ) -> DeviceResult<Self> {
        debug!("{name}: uploading {} elements ({access:?})", snapshot.len());
        let buffer = DeviceBuffer::from_host(ctx, access, snapshot.as_slice())?;
        Ok(Self {
            name,
            snapshot,
            buffer,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn offset(&self) -> usize {
        self.snapshot.descriptor().offset
    }

    /// Resolved leading dimension or increment
    pub fn ld(&self) -> usize {
        self.snapshot.descriptor().ld
    }

    pub fn snapshot(&self) -> &'a HostBuffer<T> {
        self.snapshot
    }

    pub fn is_output(&self) -> bool {
        self.buffer.access() == AccessMode::ReadWrite
    }

    /// Restores the device copy from the snapshot.
    ///
    /// Routines accumulating into their output are not idempotent, so in-out operands are
    /// reset before every timed execution.
    pub fn reset(&mut self) -> DeviceResult<()> {
        self.buffer.write(0, self.snapshot.as_slice())
    }

    pub fn download(&self) -> DeviceResult<Vec<T>> {
        self.buffer.to_host()
    }

    pub fn buffer(&self) -> &DeviceBuffer<'a, T, D> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut DeviceBuffer<'a, T, D> {
        &mut self.buffer
    }
}
