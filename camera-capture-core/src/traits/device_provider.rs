use crate::models::device::{
    AuthorizationStatus, CaptureDeviceHandle, DeviceKind, DevicePosition, ExposureMode, FocusMode,
};
use crate::models::error::CaptureError;
use crate::models::orientation::Point;

/// Callback invoked with the outcome of an authorization request.
pub type AccessCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Interface for the platform device registry.
///
/// Resolves cameras and microphones, answers authorization queries, and
/// applies per-device configuration. Device setters may only be called
/// between `lock_for_configuration` and `unlock_for_configuration`.
pub trait DeviceProvider: Send + Sync {
    /// Default camera at `position`, if one is present.
    fn default_video_device(&self, position: DevicePosition) -> Option<CaptureDeviceHandle>;

    /// Default microphone, if one is present.
    fn default_audio_device(&self) -> Option<CaptureDeviceHandle>;

    fn authorization_status(&self, kind: DeviceKind) -> AuthorizationStatus;

    /// Ask the user for access. `callback` fires once, on any thread.
    fn request_access(&self, kind: DeviceKind, callback: AccessCallback);

    /// Acquire exclusive configuration access to `device`.
    fn lock_for_configuration(&self, device: &CaptureDeviceHandle) -> Result<(), CaptureError>;

    fn unlock_for_configuration(&self, device: &CaptureDeviceHandle);

    fn set_focus(
        &self,
        device: &CaptureDeviceHandle,
        point: Point,
        mode: FocusMode,
    ) -> Result<(), CaptureError>;

    fn set_exposure(
        &self,
        device: &CaptureDeviceHandle,
        point: Point,
        mode: ExposureMode,
    ) -> Result<(), CaptureError>;

    fn set_zoom_factor(&self, device: &CaptureDeviceHandle, factor: f64) -> Result<(), CaptureError>;

    /// Switch the torch on (at `level`, 0.0–1.0) or off.
    fn set_torch(&self, device: &CaptureDeviceHandle, on: bool, level: f32) -> Result<(), CaptureError>;
}
