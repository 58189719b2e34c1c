use std::ptr::NonNull;

use cust_raw::{CUevent, CUstream};
use rcublas_sys::{
    cublasContext, cublasCreate_v2, cublasDestroy_v2, cublasHandle_t, cublasSetStream_v2,
};

use crate::error::{DeviceError, DeviceResult, ToDeviceResult};

use super::ToCudaResult;

/// A cuda stream with the cublas handle bound to it.
pub struct Stream {
    inner: CUstream,
    cublas: NonNull<cublasContext>,
}

impl Stream {
    pub fn new() -> DeviceResult<Self> {
        let mut stream = std::ptr::null_mut();
        unsafe {
            cust_raw::cuStreamCreateWithPriority(&mut stream, 0, 0)
                .to_cuda_result("cuStreamCreate")?;
        }

        let mut handle = std::ptr::null_mut();
        unsafe {
            (cublasCreate_v2(&mut handle) as i32).to_device_result("cublasCreate")?;
        }
        let cublas = NonNull::new(handle).ok_or(DeviceError::Status {
            op: "cublasCreate",
            code: -1,
        })?;
        unsafe {
            (cublasSetStream_v2(cublas.as_ptr(), stream.cast()) as i32)
                .to_device_result("cublasSetStream")?;
        }

        Ok(Self {
            inner: stream,
            cublas,
        })
    }

    pub fn inner(&self) -> CUstream {
        self.inner
    }

    pub fn cublas(&self) -> cublasHandle_t {
        self.cublas.as_ptr()
    }

    /// Makes future work on this stream wait for `event`.
    pub fn wait_event(&self, event: &Event) -> DeviceResult<()> {
        unsafe {
            cust_raw::cuStreamWaitEvent(self.inner, event.inner, 0)
                .to_cuda_result("cuStreamWaitEvent")
        }
    }

    /// Records an event capturing all work issued so far.
    pub fn record(&self) -> DeviceResult<Event> {
        let event = Event::new()?;
        unsafe { cust_raw::cuEventRecord(event.inner, self.inner).to_cuda_result("cuEventRecord")? }
        Ok(event)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        unsafe {
            if (cublasDestroy_v2(self.cublas.as_ptr()) as i32) != 0 {
                log::error!("failed to destroy cublas handle");
            }
        }

        if self.inner.is_null() {
            return;
        }

        unsafe {
            let inner = std::mem::replace(&mut self.inner, std::ptr::null_mut());
            let destroyed = cust_raw::cuStreamDestroy_v2(inner).to_cuda_result("cuStreamDestroy");
            if let Err(err) = destroyed {
                log::error!("failed to destroy cuda stream: {err}");
            }
        }
    }
}

/// Completion event of a command issued on a [`Stream`]
pub struct Event {
    inner: CUevent,
}

impl Event {
    fn new() -> DeviceResult<Self> {
        let mut event = std::ptr::null_mut();
        // CU_EVENT_DISABLE_TIMING
        unsafe { cust_raw::cuEventCreate(&mut event, 0x2).to_cuda_result("cuEventCreate")? }
        Ok(Self { inner: event })
    }

    pub fn synchronize(&self) -> DeviceResult<()> {
        unsafe { cust_raw::cuEventSynchronize(self.inner).to_cuda_result("cuEventSynchronize") }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        unsafe {
            let destroyed =
                cust_raw::cuEventDestroy_v2(self.inner).to_cuda_result("cuEventDestroy");
            if let Err(err) = destroyed {
                log::error!("failed to destroy cuda event: {err}");
            }
        }
    }
}
