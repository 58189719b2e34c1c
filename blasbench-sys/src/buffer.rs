use std::{marker::PhantomData, mem::ManuallyDrop};

use bytemuck::Pod;
use log::debug;

use crate::{
    context::ExecutionContext,
    device::{AccessMode, Device},
    error::{DeviceError, DeviceResult},
};

/// An owned buffer of `len` elements of `T` living on the device of `ctx`.
///
/// The allocation is released when the buffer is dropped, so every exit path of a test
/// instance, including early validation and resource failures, frees device memory.
pub struct DeviceBuffer<'ctx, T, D: Device> {
    mem: ManuallyDrop<D::Mem>,
    len: usize,
    access: AccessMode,
    ctx: &'ctx ExecutionContext<D>,
    _marker: PhantomData<T>,
}

impl<'ctx, T: Pod, D: Device> DeviceBuffer<'ctx, T, D> {
    /// Allocates an uninitialised buffer of `len` elements.
    pub fn new(
        ctx: &'ctx ExecutionContext<D>,
        access: AccessMode,
        len: usize,
    ) -> DeviceResult<Self> {
        let bytes = len.saturating_mul(std::mem::size_of::<T>());
        let mem = ctx.device().allocate(access, bytes)?;
        Ok(Self {
            mem: ManuallyDrop::new(mem),
            len,
            access,
            ctx,
            _marker: PhantomData,
        })
    }

    /// Allocates a buffer the size of `host` and uploads it.
    pub fn from_host(
        ctx: &'ctx ExecutionContext<D>,
        access: AccessMode,
        host: &[T],
    ) -> DeviceResult<Self> {
        let mut buf = Self::new(ctx, access, host.len())?;
        buf.write(0, host)?;
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn context(&self) -> &'ctx ExecutionContext<D> {
        self.ctx
    }

    fn check(&self, offset: usize, len: usize) -> DeviceResult<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(DeviceError::OutOfBounds {
                offset,
                len,
                capacity: self.len,
            }),
        }
    }

    /// Blocking upload of `src` starting at element `offset`.
    pub fn write(&mut self, offset: usize, src: &[T]) -> DeviceResult<()> {
        self.check(offset, src.len())?;
        let size = std::mem::size_of::<T>();
        debug!("write {} bytes at {}", src.len() * size, offset * size);
        self.ctx.device().write(
            self.ctx.queue(),
            &mut self.mem,
            offset * size,
            bytemuck::cast_slice(src),
        )
    }

    /// Blocking download into `dst` starting at element `offset`.
    pub fn read(&self, offset: usize, dst: &mut [T]) -> DeviceResult<()> {
        self.check(offset, dst.len())?;
        let size = std::mem::size_of::<T>();
        self.ctx.device().read(
            self.ctx.queue(),
            &self.mem,
            offset * size,
            bytemuck::cast_slice_mut(dst),
        )
    }

    /// Downloads the whole buffer.
    pub fn to_host(&self) -> DeviceResult<Vec<T>> {
        let mut out = vec![T::zeroed(); self.len];
        self.read(0, &mut out)?;
        Ok(out)
    }

    /// Raw allocation, for routines reading from the buffer.
    pub fn mem(&self) -> &D::Mem {
        &self.mem
    }

    /// Raw allocation, for routines writing into the buffer.
    ///
    /// # Errors
    /// If the buffer was declared [`AccessMode::ReadOnly`]
    pub fn output_mem(&mut self, operand: &'static str) -> DeviceResult<&mut D::Mem> {
        match self.access {
            AccessMode::ReadWrite => Ok(&mut self.mem),
            AccessMode::ReadOnly => Err(DeviceError::ReadOnlyBuffer(operand)),
        }
    }

    /// Errors unless the buffer holds at least `required` elements.
    pub fn require(&self, operand: &'static str, required: usize) -> DeviceResult<()> {
        if required > self.len {
            return Err(DeviceError::BufferTooSmall {
                operand,
                required,
                actual: self.len,
            });
        }
        Ok(())
    }
}

impl<'ctx, T, D: Device> Drop for DeviceBuffer<'ctx, T, D> {
    fn drop(&mut self) {
        // Safety: `mem` is never touched again after this
        let mem = unsafe { ManuallyDrop::take(&mut self.mem) };
        self.ctx.device().release(mem);
    }
}
