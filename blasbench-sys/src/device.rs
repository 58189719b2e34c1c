use crate::error::DeviceResult;

#[cfg(feature = "cuda")]
pub mod cuda;
pub mod host;

/// How the routines may touch a device buffer.
///
/// Host transfers are allowed in both modes, the access mode only restricts the kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Static description of a device, queried once when a context is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    /// Largest single allocation, in bytes
    pub max_alloc: usize,
    /// Total global memory, in bytes
    pub global_mem: usize,
    pub double_precision: bool,
}

/// A compute device reachable through a queue.
///
/// Transfers are blocking. Kernels are issued asynchronously and signal completion through
/// [`Device::Event`]s, which the host only waits on at measurement boundaries.
pub trait Device {
    /// Raw allocation handle
    type Mem;
    type Queue;
    type Event;

    fn info(&self) -> &DeviceInfo;

    /// Global memory currently free for new allocations, in bytes.
    fn available_memory(&self) -> DeviceResult<usize>;

    fn create_queue(&self) -> DeviceResult<Self::Queue>;

    fn allocate(&self, access: AccessMode, bytes: usize) -> DeviceResult<Self::Mem>;

    /// Releases an allocation. Called exactly once per allocation, from [`crate::buffer::DeviceBuffer`]'s drop.
    fn release(&self, mem: Self::Mem);

    /// Blocking host to device copy of `src` to `offset` bytes into `mem`.
    fn write(
        &self,
        queue: &Self::Queue,
        mem: &mut Self::Mem,
        offset: usize,
        src: &[u8],
    ) -> DeviceResult<()>;

    /// Blocking device to host copy of `dst.len()` bytes from `offset` bytes into `mem`.
    fn read(
        &self,
        queue: &Self::Queue,
        mem: &Self::Mem,
        offset: usize,
        dst: &mut [u8],
    ) -> DeviceResult<()>;

    /// Blocks until every event has completed.
    fn wait(&self, events: &[&Self::Event]) -> DeviceResult<()>;

    /// Blocks until everything issued on the queue has completed.
    fn finish(&self, queue: &Self::Queue) -> DeviceResult<()>;
}
