//! Virtual device registry.
//!
//! Holds a fixed rig of simulated cameras and microphones with their
//! authorization state, and records the configuration applied to each
//! device so hosts can observe focus, zoom and torch changes.

use std::collections::{HashMap, HashSet};
use std::thread;

use parking_lot::Mutex;

use camera_capture_core::models::device::{
    AuthorizationStatus, CaptureDeviceHandle, DeviceCapabilities, DeviceKind, DevicePosition, ExposureMode,
    FocusMode,
};
use camera_capture_core::models::error::CaptureError;
use camera_capture_core::models::orientation::Point;
use camera_capture_core::traits::device_provider::{AccessCallback, DeviceProvider};

/// Configuration last applied to a virtual device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    pub focus: Option<(Point, FocusMode)>,
    pub exposure: Option<(Point, ExposureMode)>,
    pub zoom_factor: f64,
    pub torch_on: bool,
    pub torch_level: f32,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            focus: None,
            exposure: None,
            zoom_factor: 1.0,
            torch_on: false,
            torch_level: 0.0,
        }
    }
}

struct RegistryState {
    devices: Vec<CaptureDeviceHandle>,
    authorization: HashMap<DeviceKind, AuthorizationStatus>,
    /// What the simulated permission prompt answers.
    grant_on_request: bool,
    locked: HashSet<String>,
    settings: HashMap<String, DeviceSettings>,
}

/// `DeviceProvider` over an in-memory set of simulated devices.
pub struct VirtualDeviceProvider {
    state: Mutex<RegistryState>,
}

impl VirtualDeviceProvider {
    /// A phone-like rig: back camera with torch, front camera, microphone.
    /// Nothing is authorized yet and the prompt grants access.
    pub fn new() -> Self {
        Self::with_devices(vec![
            virtual_camera("virtual-back", "Virtual Back Camera", DevicePosition::Back, true, 8.0),
            virtual_camera("virtual-front", "Virtual Front Camera", DevicePosition::Front, false, 4.0),
            CaptureDeviceHandle {
                id: "virtual-mic".into(),
                name: "Virtual Microphone".into(),
                kind: DeviceKind::Microphone,
                position: DevicePosition::Unspecified,
                capabilities: DeviceCapabilities::default(),
            },
        ])
    }

    pub fn with_devices(devices: Vec<CaptureDeviceHandle>) -> Self {
        let settings = devices
            .iter()
            .map(|d| (d.id.clone(), DeviceSettings::default()))
            .collect();
        Self {
            state: Mutex::new(RegistryState {
                devices,
                authorization: HashMap::from([
                    (DeviceKind::Camera, AuthorizationStatus::NotDetermined),
                    (DeviceKind::Microphone, AuthorizationStatus::NotDetermined),
                ]),
                grant_on_request: true,
                locked: HashSet::new(),
                settings,
            }),
        }
    }

    pub fn devices(&self) -> Vec<CaptureDeviceHandle> {
        self.state.lock().devices.clone()
    }

    /// Simulate hot-plugging a device.
    pub fn connect(&self, device: CaptureDeviceHandle) {
        let mut state = self.state.lock();
        state.settings.entry(device.id.clone()).or_default();
        state.devices.retain(|d| d.id != device.id);
        state.devices.push(device);
    }

    /// Simulate unplugging a device. Returns whether it was present.
    pub fn disconnect(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.devices.len();
        state.devices.retain(|d| d.id != id);
        state.locked.remove(id);
        state.devices.len() != before
    }

    pub fn set_authorization(&self, kind: DeviceKind, status: AuthorizationStatus) {
        self.state.lock().authorization.insert(kind, status);
    }

    /// Decide how the simulated permission prompt answers.
    pub fn grant_on_request(&self, grant: bool) {
        self.state.lock().grant_on_request = grant;
    }

    pub fn settings(&self, id: &str) -> Option<DeviceSettings> {
        self.state.lock().settings.get(id).copied()
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.state.lock().locked.contains(id)
    }

    fn configure<F>(&self, device: &CaptureDeviceHandle, f: F) -> Result<(), CaptureError>
    where
        F: FnOnce(&mut DeviceSettings) -> Result<(), CaptureError>,
    {
        let mut state = self.state.lock();
        if !state.locked.contains(&device.id) {
            return Err(CaptureError::LockFailed(format!(
                "{} is not locked for configuration",
                device.name
            )));
        }
        let settings = state.settings.entry(device.id.clone()).or_default();
        f(settings)
    }
}

impl Default for VirtualDeviceProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn virtual_camera(id: &str, name: &str, position: DevicePosition, torch: bool, max_zoom: f64) -> CaptureDeviceHandle {
    CaptureDeviceHandle {
        id: id.into(),
        name: name.into(),
        kind: DeviceKind::Camera,
        position,
        capabilities: DeviceCapabilities {
            has_torch: torch,
            has_flash: torch,
            max_zoom_factor: max_zoom,
        },
    }
}

fn check_point(point: Point) -> Result<(), CaptureError> {
    if (0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y) {
        Ok(())
    } else {
        Err(CaptureError::ConfigurationFailed(format!(
            "point of interest out of range: ({}, {})",
            point.x, point.y
        )))
    }
}

impl DeviceProvider for VirtualDeviceProvider {
    fn default_video_device(&self, position: DevicePosition) -> Option<CaptureDeviceHandle> {
        self.state
            .lock()
            .devices
            .iter()
            .find(|d| d.kind == DeviceKind::Camera && d.position == position)
            .cloned()
    }

    fn default_audio_device(&self) -> Option<CaptureDeviceHandle> {
        self.state
            .lock()
            .devices
            .iter()
            .find(|d| d.kind == DeviceKind::Microphone)
            .cloned()
    }

    fn authorization_status(&self, kind: DeviceKind) -> AuthorizationStatus {
        self.state
            .lock()
            .authorization
            .get(&kind)
            .copied()
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    /// Answers on a separate thread, as a real permission prompt would.
    /// Only an undetermined status is changed by the prompt.
    fn request_access(&self, kind: DeviceKind, callback: AccessCallback) {
        let granted = {
            let mut state = self.state.lock();
            let status = state
                .authorization
                .get(&kind)
                .copied()
                .unwrap_or(AuthorizationStatus::NotDetermined);
            let status = match status {
                AuthorizationStatus::NotDetermined if state.grant_on_request => AuthorizationStatus::Authorized,
                AuthorizationStatus::NotDetermined => AuthorizationStatus::Denied,
                decided => decided,
            };
            state.authorization.insert(kind, status);
            status.is_authorized()
        };
        log::info!("{:?} access {}", kind, if granted { "granted" } else { "denied" });

        let spawned = thread::Builder::new()
            .name("virtual-access-prompt".into())
            .spawn(move || callback(granted));
        if let Err(e) = spawned {
            log::error!("Failed to spawn access prompt thread: {}", e);
        }
    }

    /// Devices of a kind the user refused cannot be configured.
    fn lock_for_configuration(&self, device: &CaptureDeviceHandle) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        if !state.devices.iter().any(|d| d.id == device.id) {
            return Err(CaptureError::DeviceUnavailable);
        }
        if matches!(
            state.authorization.get(&device.kind),
            Some(AuthorizationStatus::Denied | AuthorizationStatus::Restricted)
        ) {
            return Err(CaptureError::PermissionDenied);
        }
        if !state.locked.insert(device.id.clone()) {
            return Err(CaptureError::LockFailed(format!("{} is already locked", device.name)));
        }
        Ok(())
    }

    fn unlock_for_configuration(&self, device: &CaptureDeviceHandle) {
        self.state.lock().locked.remove(&device.id);
    }

    fn set_focus(&self, device: &CaptureDeviceHandle, point: Point, mode: FocusMode) -> Result<(), CaptureError> {
        check_point(point)?;
        self.configure(device, |settings| {
            settings.focus = Some((point, mode));
            Ok(())
        })
    }

    fn set_exposure(
        &self,
        device: &CaptureDeviceHandle,
        point: Point,
        mode: ExposureMode,
    ) -> Result<(), CaptureError> {
        check_point(point)?;
        self.configure(device, |settings| {
            settings.exposure = Some((point, mode));
            Ok(())
        })
    }

    fn set_zoom_factor(&self, device: &CaptureDeviceHandle, factor: f64) -> Result<(), CaptureError> {
        let max = device.capabilities.max_zoom_factor.max(1.0);
        if !(1.0..=max).contains(&factor) {
            return Err(CaptureError::ConfigurationFailed(format!(
                "zoom factor {} outside [1, {}]",
                factor, max
            )));
        }
        self.configure(device, |settings| {
            settings.zoom_factor = factor;
            Ok(())
        })
    }

    fn set_torch(&self, device: &CaptureDeviceHandle, on: bool, level: f32) -> Result<(), CaptureError> {
        if !device.supports_torch() {
            return Err(CaptureError::ConfigurationFailed(format!("{} has no torch", device.name)));
        }
        self.configure(device, |settings| {
            settings.torch_on = on;
            settings.torch_level = if on { level.clamp(0.0, 1.0) } else { 0.0 };
            Ok(())
        })
    }
}
