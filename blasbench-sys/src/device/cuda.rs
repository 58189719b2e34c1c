use std::ffi::c_void;

use cust_raw::CUdeviceptr;
use log::debug;

use crate::error::{DeviceError, DeviceResult};

use super::{AccessMode, Device, DeviceInfo};

mod context;
mod stream;

pub use context::Context;
pub use stream::{Event, Stream};

/// Device for CUDA enabled GPUs
///
/// Kernels for this device come from cuBLAS, issued on the [`Stream`] of the execution context.
pub struct Cuda {
    ctx: Context,
    info: DeviceInfo,
}

impl Cuda {
    /// Creates a context on the given device ordinal and queries its limits.
    pub fn new(ordinal: u32) -> DeviceResult<Self> {
        let ctx = Context::init(ordinal)?;

        let mut total = 0usize;
        unsafe {
            cust_raw::cuDeviceTotalMem_v2(&mut total, ctx.device().as_raw())
                .to_cuda_result("cuDeviceTotalMem")?;
        }

        let mut major = 0i32;
        unsafe {
            cust_raw::cuDeviceGetAttribute(
                &mut major,
                cust_raw::CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR,
                ctx.device().as_raw(),
            )
            .to_cuda_result("cuDeviceGetAttribute")?;
        }

        Ok(Self {
            info: DeviceInfo {
                name: format!("cuda:{ordinal}"),
                // cuda has no per allocation limit below the device size
                max_alloc: total,
                global_mem: total,
                double_precision: major >= 2,
            },
            ctx,
        })
    }
}

/// Allocation on a [`Cuda`] device
pub struct CudaMem {
    ptr: CUdeviceptr,
    bytes: usize,
}

impl CudaMem {
    /// Device pointer to the element at `offset`.
    pub fn as_ptr<T>(&self, offset: usize) -> *mut T {
        (self.ptr as usize + offset * std::mem::size_of::<T>()) as *mut T
    }

    pub fn len(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
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

impl Device for Cuda {
    type Mem = CudaMem;
    type Queue = Stream;
    type Event = Event;

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn available_memory(&self) -> DeviceResult<usize> {
        let (mut free, mut total) = (0usize, 0usize);
        unsafe { cust_raw::cuMemGetInfo_v2(&mut free, &mut total).to_cuda_result("cuMemGetInfo")? }
        Ok(free)
    }

    fn create_queue(&self) -> DeviceResult<Stream> {
        Stream::new()
    }

    fn allocate(&self, access: AccessMode, bytes: usize) -> DeviceResult<CudaMem> {
        let mut ptr: CUdeviceptr = 0;
        if bytes != 0 {
            unsafe { cust_raw::cuMemAlloc_v2(&mut ptr, bytes).to_cuda_result("cuMemAlloc")? }
        }
        debug!("{}: allocated {bytes} bytes ({access:?})", self.info.name);
        Ok(CudaMem { ptr, bytes })
    }

    fn release(&self, mem: CudaMem) {
        if mem.bytes == 0 {
            return;
        }
        unsafe {
            if let Err(err) = cust_raw::cuMemFree_v2(mem.ptr).to_cuda_result("cuMemFree") {
                log::error!("{}: failed to release {} bytes: {err}", self.info.name, mem.bytes);
            }
        }
    }

    fn write(
        &self,
        _queue: &Stream,
        mem: &mut CudaMem,
        offset: usize,
        src: &[u8],
    ) -> DeviceResult<()> {
        check_range(offset, src.len(), mem.bytes)?;
        if src.is_empty() {
            return Ok(());
        }
        unsafe {
            cust_raw::cuMemcpyHtoD_v2(
                mem.ptr + offset as CUdeviceptr,
                src.as_ptr().cast::<c_void>(),
                src.len(),
            )
            .to_cuda_result("cuMemcpyHtoD")
        }
    }

    fn read(
        &self,
        _queue: &Stream,
        mem: &CudaMem,
        offset: usize,
        dst: &mut [u8],
    ) -> DeviceResult<()> {
        check_range(offset, dst.len(), mem.bytes)?;
        if dst.is_empty() {
            return Ok(());
        }
        unsafe {
            cust_raw::cuMemcpyDtoH_v2(
                dst.as_mut_ptr().cast::<c_void>(),
                mem.ptr + offset as CUdeviceptr,
                dst.len(),
            )
            .to_cuda_result("cuMemcpyDtoH")
        }
    }

    fn wait(&self, events: &[&Event]) -> DeviceResult<()> {
        events.iter().try_for_each(|e| e.synchronize())
    }

    fn finish(&self, queue: &Stream) -> DeviceResult<()> {
        unsafe {
            cust_raw::cuStreamSynchronize(queue.inner()).to_cuda_result("cuStreamSynchronize")
        }
    }
}

pub(crate) trait ToCudaResult {
    fn to_cuda_result(self, op: &'static str) -> DeviceResult<()>;
}

impl ToCudaResult for cust_raw::cudaError_enum {
    fn to_cuda_result(self, op: &'static str) -> DeviceResult<()> {
        use cust_raw::cudaError_enum;
        match self {
            cudaError_enum::CUDA_SUCCESS => Ok(()),
            cudaError_enum::CUDA_ERROR_OUT_OF_MEMORY => Err(DeviceError::OutOfMemory {
                requested: 0,
                available: 0,
            }),
            code => Err(DeviceError::Status {
                op,
                code: code as i32,
            }),
        }
    }
}
