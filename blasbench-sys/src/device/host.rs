use std::cell::Cell;

use bytemuck::Pod;
use log::debug;

use crate::error::{DeviceError, DeviceResult};

use super::{AccessMode, Device, DeviceInfo};

const GIB: usize = 1 << 30;

/// Device emulated in host memory.
///
/// Honours the same memory limits a real device reports, so resource checks, out of memory
/// failures and double precision support can all be exercised without a GPU.
/// Commands execute as soon as they are enqueued.
#[derive(Debug)]
pub struct Host {
    info: DeviceInfo,
    used: Cell<usize>,
}

impl Default for Host {
    fn default() -> Self {
        Self::with_limits(GIB, 4 * GIB)
    }
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_alloc: usize, global_mem: usize) -> Self {
        Self {
            info: DeviceInfo {
                name: "host".to_owned(),
                max_alloc,
                global_mem,
                double_precision: true,
            },
            used: Cell::new(0),
        }
    }

    #[must_use]
    pub fn without_double_precision(mut self) -> Self {
        self.info.double_precision = false;
        self
    }

    /// Bytes currently held by live allocations
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Marks a command as issued on `queue` and returns its completion event.
    ///
    /// Host commands run synchronously, so the event is already complete.
    pub fn complete(&self, queue: &HostQueue) -> HostEvent {
        let id = queue.issued.get() + 1;
        queue.issued.set(id);
        HostEvent { id }
    }
}

/// Allocation on the [`Host`] device
#[derive(Debug)]
pub struct HostMem {
    bytes: Vec<u8>,
}

impl HostMem {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copies the contents out as typed elements.
    pub fn load<T: Pod>(&self) -> Vec<T> {
        bytemuck::pod_collect_to_vec(&self.bytes)
    }

    /// Overwrites the start of the allocation with `data`.
    pub fn store<T: Pod>(&mut self, data: &[T]) {
        let src: &[u8] = bytemuck::cast_slice(data);
        self.bytes[..src.len()].copy_from_slice(src);
    }
}

#[derive(Debug, Default)]
pub struct HostQueue {
    issued: Cell<u64>,
}

impl HostQueue {
    /// Number of commands issued on this queue so far
    pub fn issued(&self) -> u64 {
        self.issued.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEvent {
    id: u64,
}

impl HostEvent {
    pub fn id(&self) -> u64 {
        self.id
    }
}

fn check_range(offset: usize, len: usize, capacity: usize) -> DeviceResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(DeviceError::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}

impl Device for Host {
    type Mem = HostMem;
    type Queue = HostQueue;
    type Event = HostEvent;

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn available_memory(&self) -> DeviceResult<usize> {
        Ok(self.info.global_mem.saturating_sub(self.used.get()))
    }

    fn create_queue(&self) -> DeviceResult<HostQueue> {
        Ok(HostQueue::default())
    }

    fn allocate(&self, access: AccessMode, bytes: usize) -> DeviceResult<HostMem> {
        if bytes > self.info.max_alloc {
            return Err(DeviceError::AllocTooLarge {
                requested: bytes,
                max: self.info.max_alloc,
            });
        }
        let available = self.available_memory()?;
        if bytes > available {
            return Err(DeviceError::OutOfMemory {
                requested: bytes,
                available,
            });
        }

        self.used.set(self.used.get() + bytes);
        debug!("host: allocated {bytes} bytes ({access:?})");
        Ok(HostMem {
            bytes: vec![0; bytes],
        })
    }

    fn release(&self, mem: HostMem) {
        self.used.set(self.used.get() - mem.len());
        debug!("host: released {} bytes", mem.len());
    }

    fn write(
        &self,
        _queue: &HostQueue,
        mem: &mut HostMem,
        offset: usize,
        src: &[u8],
    ) -> DeviceResult<()> {
        check_range(offset, src.len(), mem.len())?;
        mem.bytes[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn read(
        &self,
        _queue: &HostQueue,
        mem: &HostMem,
        offset: usize,
        dst: &mut [u8],
    ) -> DeviceResult<()> {
        check_range(offset, dst.len(), mem.len())?;
        dst.copy_from_slice(&mem.bytes[offset..offset + dst.len()]);
        Ok(())
    }

    fn wait(&self, _events: &[&HostEvent]) -> DeviceResult<()> {
        Ok(())
    }

    fn finish(&self, _queue: &HostQueue) -> DeviceResult<()> {
        Ok(())
    }
}
