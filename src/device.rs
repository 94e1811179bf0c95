//! Compute device selection
//!
//! The device is chosen once, when a [`crate::trainer::Predicto`] is built.
//! Asking for an accelerator the backend cannot provide is not fatal: a
//! warning is logged and the backend's default device is used instead.

use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

/// Requested compute device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComputeDevice {
    /// The backend's default (host) device
    #[default]
    Cpu,
    /// Accelerator by index
    Accelerator(usize),
}

/// Backends that can report their accelerators
pub trait DeviceProbe: Backend {
    /// The accelerator at `index`, if this backend has one
    fn accelerator(index: usize) -> Option<Self::Device>;
}

impl DeviceProbe for NdArray<f32> {
    fn accelerator(_index: usize) -> Option<Self::Device> {
        None
    }
}

impl DeviceProbe for NdArray<f64> {
    fn accelerator(_index: usize) -> Option<Self::Device> {
        None
    }
}

impl<B: DeviceProbe> DeviceProbe for Autodiff<B> {
    fn accelerator(index: usize) -> Option<Self::Device> {
        B::accelerator(index)
    }
}

/// Resolve a device preference to a concrete device
pub fn resolve<B: DeviceProbe>(requested: ComputeDevice) -> B::Device {
    match requested {
        ComputeDevice::Cpu => B::Device::default(),
        ComputeDevice::Accelerator(index) => B::accelerator(index).unwrap_or_else(|| {
            tracing::warn!(
                index,
                "Accelerator is not available, falling back to the default device"
            );
            B::Device::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_cpu_resolves_to_default() {
        let device = resolve::<TestBackend>(ComputeDevice::Cpu);
        assert_eq!(device, <TestBackend as Backend>::Device::default());
    }

    #[test]
    fn test_missing_accelerator_falls_back() {
        let device = resolve::<Autodiff<TestBackend>>(ComputeDevice::Accelerator(0));
        assert_eq!(device, <TestBackend as Backend>::Device::default());
    }
}
