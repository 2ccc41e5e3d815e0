use serde::{Deserialize, Serialize};

/// Kind of physical capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Camera,
    Microphone,
}

/// Physical mounting position of a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePosition {
    Front,
    #[default]
    Back,
    Unspecified,
}

impl DevicePosition {
    /// The camera position on the other side of the device.
    ///
    /// Anything that is not front-facing switches to the front camera.
    pub fn opposite(self) -> Self {
        match self {
            Self::Back | Self::Unspecified => Self::Front,
            Self::Front => Self::Back,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, Self::Front)
    }
}

/// Hardware capabilities reported by a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub has_torch: bool,
    pub has_flash: bool,
    /// Maximum zoom factor of the active format (1.0 = no zoom).
    pub max_zoom_factor: f64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            has_torch: false,
            has_flash: false,
            max_zoom_factor: 1.0,
        }
    }
}

/// A resolved physical capture device.
///
/// Handles are immutable. They are resolved from the `DeviceProvider` every
/// time they are needed rather than cached across device-list changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDeviceHandle {
    pub id: String,
    pub name: String,
    pub kind: DeviceKind,
    pub position: DevicePosition,
    pub capabilities: DeviceCapabilities,
}

impl CaptureDeviceHandle {
    /// Whether the device can drive a continuous torch.
    pub fn supports_torch(&self) -> bool {
        self.capabilities.has_torch && self.capabilities.has_flash
    }
}

/// Authorization state for one capture domain (camera or microphone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    Restricted,
    NotDetermined,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// A device bound to the capture session as an input.
///
/// Each binding gets a fresh id, so re-binding the same device yields a
/// distinct input.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInput {
    pub id: uuid::Uuid,
    pub device: CaptureDeviceHandle,
}

impl DeviceInput {
    pub fn new(device: CaptureDeviceHandle) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            device,
        }
    }

    pub fn position(&self) -> DevicePosition {
        self.device.position
    }
}

/// Focus behaviour applied together with a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Locked,
    AutoFocus,
    ContinuousAutoFocus,
}

/// Exposure behaviour applied together with a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    Locked,
    AutoExpose,
    ContinuousAutoExposure,
}

/// Session outputs. Each is attached at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Photo,
    Movie,
}
