//! Focus, zoom and torch adjustments on the active camera.
//!
//! Adjustments run on the calling thread. Each takes a scoped configuration
//! lock on the device and reports whether it was applied; a device that
//! cannot be locked is skipped with a warning.

use crate::models::device::{CaptureDeviceHandle, ExposureMode, FocusMode};
use crate::models::error::CaptureError;
use crate::models::orientation::{Point, Size, VideoOrientation};
use crate::processing::orientation;
use crate::session::camera_session::{CameraSession, SessionInner};
use crate::session::device_lock::ConfigurationLock;
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::device_provider::DeviceProvider;
use crate::traits::movie_exporter::MovieExporter;

/// Torch level used whenever the torch is switched on.
const TORCH_LEVEL: f32 = 1.0;

impl<P, B, E> CameraSession<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    /// Focus and expose at a touch point in a view of `view` size.
    pub fn focus(&self, at: Point, view: Size) -> bool {
        let Some(point) = orientation::focus_point(at, view) else {
            log::debug!("Ignoring focus request on an empty view");
            return false;
        };
        self.inner.with_active_camera("focus", |lock| {
            lock.set_focus(point, FocusMode::ContinuousAutoFocus)?;
            lock.set_exposure(point, ExposureMode::ContinuousAutoExposure)
        })
    }

    /// Focus at the tapped point, then report the tap to the delegate.
    pub fn handle_single_tap(&self, at: Point, view: Size) -> bool {
        let focused = self.focus(at, view);
        if let Some(delegate) = self.inner.delegate() {
            delegate.on_single_tap(at);
        }
        focused
    }

    pub fn handle_double_tap(&self) {
        if let Some(delegate) = self.inner.delegate() {
            delegate.on_double_tap();
        }
    }

    /// Zoom to a normalized level in [0, 1] of the active camera's range.
    pub fn set_zoom(&self, percent: f64) -> bool {
        let Some(device) = self.inner.active_camera() else {
            return false;
        };
        let factor = orientation::zoom_factor(
            percent,
            device.position,
            device.capabilities.max_zoom_factor,
            self.inner.config.front_zoom_scale,
        );
        self.inner.apply_zoom(&device, factor)
    }

    pub fn reset_zoom(&self) -> bool {
        let Some(device) = self.inner.active_camera() else {
            return false;
        };
        self.inner.apply_zoom(&device, 1.0)
    }

    /// Switch the torch. Skipped on cameras without a torch.
    pub fn set_torch(&self, on: bool) -> bool {
        self.inner.apply_torch(on)
    }

    pub fn toggle_torch(&self) -> bool {
        let on = !self.is_torch_on();
        self.set_torch(on)
    }

    /// Connection orientation for the current device orientation.
    pub fn capture_orientation(&self) -> VideoOrientation {
        orientation::capture_orientation(self.device_orientation())
    }
}

impl<P, B, E> SessionInner<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    pub(super) fn active_camera(&self) -> Option<CaptureDeviceHandle> {
        self.state
            .lock()
            .active_video_input
            .as_ref()
            .map(|input| input.device.clone())
    }

    pub(super) fn apply_torch(&self, on: bool) -> bool {
        let Some(device) = self.active_camera() else {
            return false;
        };
        if device.position.is_front() || !device.supports_torch() {
            log::debug!("Camera {} has no usable torch", device.name);
            return false;
        }
        let applied = self.with_device_lock(&device, "torch", |lock| lock.set_torch(on, TORCH_LEVEL));
        if applied {
            self.state.lock().torch_on = on;
        }
        applied
    }

    fn apply_zoom(&self, device: &CaptureDeviceHandle, factor: f64) -> bool {
        let applied = self.with_device_lock(device, "zoom", |lock| lock.set_zoom_factor(factor));
        if applied {
            self.state.lock().zoom_factor = factor;
        }
        applied
    }

    fn with_active_camera<F>(&self, what: &str, f: F) -> bool
    where
        F: FnOnce(&ConfigurationLock<'_, P>) -> Result<(), CaptureError>,
    {
        match self.active_camera() {
            Some(device) => self.with_device_lock(&device, what, f),
            None => {
                log::debug!("No active camera for {}", what);
                false
            }
        }
    }

    fn with_device_lock<F>(&self, device: &CaptureDeviceHandle, what: &str, f: F) -> bool
    where
        F: FnOnce(&ConfigurationLock<'_, P>) -> Result<(), CaptureError>,
    {
        let lock = match ConfigurationLock::acquire(&*self.provider, device) {
            Ok(lock) => lock,
            Err(e) => {
                log::warn!("Could not lock {} for {}: {}", device.name, what, e);
                return false;
            }
        };
        match f(&lock) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to apply {} on {}: {}", what, device.name, e);
                false
            }
        }
    }
}
