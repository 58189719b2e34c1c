use cust_raw::CUcontext;

use crate::error::{DeviceError, DeviceResult};

use super::ToCudaResult;

pub struct Context {
    inner: CUcontext,
    device: cust::device::Device,
}

impl Context {
    /// Initializes the CUDA driver API and creates a context with default settings on the
    /// given device ordinal.
    ///
    /// The context must outlive every buffer and stream created from it.
    #[must_use = "The CUDA Context must be kept alive or errors will be issued for any CUDA function that is run"]
    pub fn init(ordinal: u32) -> DeviceResult<Self> {
        use cust::context::ContextFlags;

        cust::init(cust::CudaFlags::empty()).map_err(backend)?;
        let device = cust::device::Device::get_device(ordinal).map_err(backend)?;

        let flags = ContextFlags::MAP_HOST | ContextFlags::SCHED_AUTO;

        unsafe {
            let mut ctx: CUcontext = std::ptr::null_mut();
            cust_raw::cuCtxCreate_v2(&mut ctx as *mut CUcontext, flags.bits(), device.as_raw())
                .to_cuda_result("cuCtxCreate")?;
            Ok(Self { inner: ctx, device })
        }
    }

    pub(crate) fn device(&self) -> &cust::device::Device {
        &self.device
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }

        unsafe {
            let inner = std::mem::replace(&mut self.inner, std::ptr::null_mut());
            if let Err(err) = cust_raw::cuCtxDestroy_v2(inner).to_cuda_result("cuCtxDestroy") {
                log::error!("failed to destroy cuda context: {err}");
            }
        }
    }
}

fn backend(err: cust::error::CudaError) -> DeviceError {
    DeviceError::Backend(err.to_string())
}
