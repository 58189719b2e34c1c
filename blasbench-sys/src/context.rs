use crate::{device::Device, error::DeviceResult};

/// A device together with the queue every operation of one test instance is issued on.
///
/// The context is created by the caller and passed explicitly to every buffer and routine.
/// Buffers borrow it, so it always outlives them.
pub struct ExecutionContext<D: Device> {
    // the queue has to be torn down before the device it was created on
    queue: D::Queue,
    device: D,
}

impl<D: Device> ExecutionContext<D> {
    pub fn new(device: D) -> DeviceResult<Self> {
        let queue = device.create_queue()?;
        log::debug!("created execution context on {}", device.info().name);
        Ok(Self { queue, device })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn queue(&self) -> &D::Queue {
        &self.queue
    }

    /// Blocks on the given completion events.
    pub fn wait(&self, events: &[&D::Event]) -> DeviceResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.device.wait(events)
    }

    /// Blocks until the queue has drained.
    pub fn finish(&self) -> DeviceResult<()> {
        self.device.finish(&self.queue)
    }
}

impl<D: Device + std::fmt::Debug> std::fmt::Debug for ExecutionContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}
