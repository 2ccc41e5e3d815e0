use crate::models::device::{CaptureDeviceHandle, ExposureMode, FocusMode};
use crate::models::error::CaptureError;
use crate::models::orientation::Point;
use crate::traits::device_provider::DeviceProvider;

/// Scoped configuration lock on a capture device.
///
/// Device setters are only reachable through the guard, and the device is
/// unlocked when the guard drops, on every exit path.
pub struct ConfigurationLock<'a, P: DeviceProvider> {
    provider: &'a P,
    device: &'a CaptureDeviceHandle,
}

impl<'a, P: DeviceProvider> ConfigurationLock<'a, P> {
    pub fn acquire(provider: &'a P, device: &'a CaptureDeviceHandle) -> Result<Self, CaptureError> {
        provider.lock_for_configuration(device)?;
        Ok(Self { provider, device })
    }

    pub fn set_focus(&self, point: Point, mode: FocusMode) -> Result<(), CaptureError> {
        self.provider.set_focus(self.device, point, mode)
    }

    pub fn set_exposure(&self, point: Point, mode: ExposureMode) -> Result<(), CaptureError> {
        self.provider.set_exposure(self.device, point, mode)
    }

    pub fn set_zoom_factor(&self, factor: f64) -> Result<(), CaptureError> {
        self.provider.set_zoom_factor(self.device, factor)
    }

    pub fn set_torch(&self, on: bool, level: f32) -> Result<(), CaptureError> {
        self.provider.set_torch(self.device, on, level)
    }
}

impl<P: DeviceProvider> Drop for ConfigurationLock<'_, P> {
    fn drop(&mut self) {
        self.provider.unlock_for_configuration(self.device);
    }
}
