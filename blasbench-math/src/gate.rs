use blasbench_sys::{Device, DeviceResult, ExecutionContext};
use thiserror::Error;

use crate::{descriptor::Descriptor, element::Element};

/// Why a test case was skipped instead of run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Insufficient {
    #[error("an operand of {bytes} bytes exceeds the maximum allocation of {max_alloc} bytes")]
    AllocTooLarge { bytes: usize, max_alloc: usize },

    #[error("operands need {total} bytes of global memory, {available} available")]
    GlobalMemory { total: usize, available: usize },

    #[error("the device does not support double precision")]
    NoDoublePrecision,
}

/// Decides, before anything is allocated, whether a device can hold the operands of a call.
///
/// Checks are made on the final buffer lengths, after storage kind and offsets have been
/// applied, never on the nominal matrix sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGate {
    max_alloc: usize,
    available: usize,
    double_precision: bool,
}

impl ResourceGate {
    pub fn new(max_alloc: usize, available: usize) -> Self {
        Self {
            max_alloc,
            available,
            double_precision: true,
        }
    }

    /// Snapshot of the limits of the device behind `ctx`.
    pub fn for_context<D: Device>(ctx: &ExecutionContext<D>) -> DeviceResult<Self> {
        let device = ctx.device();
        let info = device.info();
        Ok(Self {
            max_alloc: info.max_alloc,
            available: device.available_memory()?,
            double_precision: info.double_precision,
        })
    }

    #[must_use]
    pub fn with_double_precision(mut self, supported: bool) -> Self {
        self.double_precision = supported;
        self
    }

    /// Checks buffer sizes given in bytes.
    pub fn check_bytes(&self, lengths: &[usize]) -> Result<(), Insufficient> {
        if let Some(&bytes) = lengths.iter().find(|&&b| b > self.max_alloc) {
            return Err(Insufficient::AllocTooLarge {
                bytes,
                max_alloc: self.max_alloc,
            });
        }

        let total = lengths.iter().fold(0usize, |acc, &b| acc.saturating_add(b));
        if total > self.available {
            return Err(Insufficient::GlobalMemory {
                total,
                available: self.available,
            });
        }
        Ok(())
    }

    /// Checks every operand of one call with elements of type `T`.
    pub fn check<T: Element>(&self, operands: &[Descriptor]) -> Result<(), Insufficient> {
        if T::KIND.is_double() && !self.double_precision {
            return Err(Insufficient::NoDoublePrecision);
        }
        let bytes: Vec<usize> = operands.iter().map(Descriptor::bytes::<T>).collect();
        self.check_bytes(&bytes)
    }
}
