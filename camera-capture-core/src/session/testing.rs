//! In-memory fakes for exercising the session without a platform backend.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::models::config::{SessionConfiguration, SessionPreset};
use crate::models::device::{
    AuthorizationStatus, CaptureDeviceHandle, DeviceCapabilities, DeviceInput, DeviceKind,
    DevicePosition, ExposureMode, FocusMode, OutputKind,
};
use crate::models::error::CaptureError;
use crate::models::orientation::Point;
use crate::models::photo::RawPhoto;
use crate::models::state::RecordingState;
use crate::session::camera_session::CameraSession;
use crate::traits::capture_backend::{
    CaptureBackend, ConnectionInfo, ConnectionSettings, PhotoCallback, RecordingFinishedCallback,
};
use crate::traits::device_provider::{AccessCallback, DeviceProvider};
use crate::traits::movie_exporter::{ExportCallback, ExportRequest, MovieExporter};
use crate::traits::session_delegate::SessionDelegate;

pub fn back_camera() -> CaptureDeviceHandle {
    CaptureDeviceHandle {
        id: "back-camera".into(),
        name: "Back Camera".into(),
        kind: DeviceKind::Camera,
        position: DevicePosition::Back,
        capabilities: DeviceCapabilities {
            has_torch: true,
            has_flash: true,
            max_zoom_factor: 16.0,
        },
    }
}

pub fn front_camera() -> CaptureDeviceHandle {
    CaptureDeviceHandle {
        id: "front-camera".into(),
        name: "Front Camera".into(),
        kind: DeviceKind::Camera,
        position: DevicePosition::Front,
        capabilities: DeviceCapabilities {
            has_torch: false,
            has_flash: false,
            max_zoom_factor: 16.0,
        },
    }
}

pub fn microphone() -> CaptureDeviceHandle {
    CaptureDeviceHandle {
        id: "microphone".into(),
        name: "Microphone".into(),
        kind: DeviceKind::Microphone,
        position: DevicePosition::Unspecified,
        capabilities: DeviceCapabilities::default(),
    }
}

/// A 3×2 PNG whose red channel is x and green channel is y.
pub fn png_bytes() -> Vec<u8> {
    let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 0]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub struct FakeProvider {
    devices: Mutex<Vec<CaptureDeviceHandle>>,
    authorization: Mutex<HashMap<DeviceKind, AuthorizationStatus>>,
    grant: AtomicBool,
    lock_fails: AtomicBool,
    setters_fail: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// Back camera, front camera and microphone, all authorized.
    pub fn standard() -> Self {
        Self {
            devices: Mutex::new(vec![back_camera(), front_camera(), microphone()]),
            authorization: Mutex::new(HashMap::from([
                (DeviceKind::Camera, AuthorizationStatus::Authorized),
                (DeviceKind::Microphone, AuthorizationStatus::Authorized),
            ])),
            grant: AtomicBool::new(true),
            lock_fails: AtomicBool::new(false),
            setters_fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn remove_device(&self, id: &str) {
        self.devices.lock().retain(|d| d.id != id);
    }

    pub fn set_authorization(&self, kind: DeviceKind, status: AuthorizationStatus) {
        self.authorization.lock().insert(kind, status);
    }

    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn fail_locks(&self, fail: bool) {
        self.lock_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_setters(&self, fail: bool) {
        self.setters_fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn setter(&self, call: String) -> Result<(), CaptureError> {
        if self.setters_fail.load(Ordering::SeqCst) {
            return Err(CaptureError::Unknown("setter rejected".into()));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl DeviceProvider for FakeProvider {
    fn default_video_device(&self, position: DevicePosition) -> Option<CaptureDeviceHandle> {
        self.devices
            .lock()
            .iter()
            .find(|d| d.kind == DeviceKind::Camera && d.position == position)
            .cloned()
    }

    fn default_audio_device(&self) -> Option<CaptureDeviceHandle> {
        self.devices
            .lock()
            .iter()
            .find(|d| d.kind == DeviceKind::Microphone)
            .cloned()
    }

    fn authorization_status(&self, kind: DeviceKind) -> AuthorizationStatus {
        self.authorization
            .lock()
            .get(&kind)
            .copied()
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    fn request_access(&self, kind: DeviceKind, callback: AccessCallback) {
        let granted = self.grant.load(Ordering::SeqCst);
        let status = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        self.authorization.lock().insert(kind, status);
        callback(granted);
    }

    fn lock_for_configuration(&self, device: &CaptureDeviceHandle) -> Result<(), CaptureError> {
        if self.lock_fails.load(Ordering::SeqCst) {
            return Err(CaptureError::LockFailed(format!("{} is busy", device.id)));
        }
        self.calls.lock().push(format!("lock {}", device.id));
        Ok(())
    }

    fn unlock_for_configuration(&self, device: &CaptureDeviceHandle) {
        self.calls.lock().push(format!("unlock {}", device.id));
    }

    fn set_focus(&self, _device: &CaptureDeviceHandle, point: Point, mode: FocusMode) -> Result<(), CaptureError> {
        self.setter(format!("focus {} {} {:?}", point.x, point.y, mode))
    }

    fn set_exposure(
        &self,
        _device: &CaptureDeviceHandle,
        point: Point,
        mode: ExposureMode,
    ) -> Result<(), CaptureError> {
        self.setter(format!("exposure {} {} {:?}", point.x, point.y, mode))
    }

    fn set_zoom_factor(&self, _device: &CaptureDeviceHandle, factor: f64) -> Result<(), CaptureError> {
        self.setter(format!("zoom {}", factor))
    }

    fn set_torch(&self, _device: &CaptureDeviceHandle, on: bool, _level: f32) -> Result<(), CaptureError> {
        self.setter(format!("torch {}", if on { "on" } else { "off" }))
    }
}

struct PendingRecording {
    path: PathBuf,
    finished: RecordingFinishedCallback,
}

pub struct FakeBackend {
    inputs: Mutex<Vec<DeviceInput>>,
    outputs: Mutex<HashSet<OutputKind>>,
    output_adds: Mutex<HashMap<OutputKind, usize>>,
    busy: Mutex<HashSet<String>>,
    accepts_inputs: AtomicBool,
    running: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    events: Mutex<Vec<String>>,
    preset: Mutex<Option<SessionPreset>>,
    recording: Mutex<Option<PendingRecording>>,
    finish_error: Mutex<Option<CaptureError>>,
    finish_on_stop: AtomicBool,
    photo: Mutex<Result<RawPhoto, CaptureError>>,
    last_settings: Mutex<Option<ConnectionSettings>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
            outputs: Mutex::new(HashSet::new()),
            output_adds: Mutex::new(HashMap::new()),
            busy: Mutex::new(HashSet::new()),
            accepts_inputs: AtomicBool::new(true),
            running: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            preset: Mutex::new(None),
            recording: Mutex::new(None),
            finish_error: Mutex::new(None),
            finish_on_stop: AtomicBool::new(false),
            photo: Mutex::new(Ok(RawPhoto {
                data: png_bytes(),
                scale: 2.0,
            })),
            last_settings: Mutex::new(None),
        }
    }

    pub fn set_accepts_inputs(&self, accepts: bool) {
        self.accepts_inputs.store(accepts, Ordering::SeqCst);
    }

    pub fn mark_busy(&self, device_id: &str) {
        self.busy.lock().insert(device_id.to_string());
    }

    pub fn set_finish_error(&self, error: CaptureError) {
        *self.finish_error.lock() = Some(error);
    }

    /// Finalize any recording in progress when the session stops.
    pub fn finish_on_stop(&self, finish: bool) {
        self.finish_on_stop.store(finish, Ordering::SeqCst);
    }

    /// Lose the recording in progress without ever finishing it.
    pub fn discard_recording(&self) {
        self.recording.lock().take();
    }

    pub fn set_photo(&self, photo: Result<RawPhoto, CaptureError>) {
        *self.photo.lock() = photo;
    }

    pub fn inputs(&self) -> Vec<DeviceInput> {
        self.inputs.lock().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.events.lock().iter().filter(|e| *e == "commit").count()
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn output_add_count(&self, output: OutputKind) -> usize {
        self.output_adds.lock().get(&output).copied().unwrap_or(0)
    }

    pub fn preset(&self) -> Option<SessionPreset> {
        *self.preset.lock()
    }

    pub fn last_settings(&self) -> Option<ConnectionSettings> {
        *self.last_settings.lock()
    }
}

impl CaptureBackend for FakeBackend {
    fn begin_configuration(&self) {
        self.events.lock().push("begin".into());
    }

    fn commit_configuration(&self) {
        self.events.lock().push("commit".into());
    }

    fn set_preset(&self, preset: SessionPreset) {
        *self.preset.lock() = Some(preset);
    }

    fn make_input(&self, device: &CaptureDeviceHandle) -> Result<DeviceInput, CaptureError> {
        if self.busy.lock().contains(&device.id) {
            return Err(CaptureError::Unknown(format!("{} is in use", device.id)));
        }
        Ok(DeviceInput::new(device.clone()))
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.accepts_inputs.load(Ordering::SeqCst)
    }

    fn add_input(&self, input: &DeviceInput) {
        self.events.lock().push(format!("add {}", input.device.id));
        self.inputs.lock().push(input.clone());
    }

    fn remove_input(&self, input: &DeviceInput) {
        let mut inputs = self.inputs.lock();
        if inputs.iter().any(|i| i.id == input.id) {
            inputs.retain(|i| i.id != input.id);
            self.events.lock().push(format!("remove {}", input.device.id));
        }
    }

    fn can_add_output(&self, output: OutputKind) -> bool {
        !self.outputs.lock().contains(&output)
    }

    fn add_output(&self, output: OutputKind) {
        self.outputs.lock().insert(output);
        *self.output_adds.lock().entry(output).or_insert(0) += 1;
    }

    fn has_output(&self, output: OutputKind) -> bool {
        self.outputs.lock().contains(&output)
    }

    fn start_running(&self) -> Result<(), CaptureError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_running(&self) {
        if self.finish_on_stop.load(Ordering::SeqCst) {
            self.stop_recording();
        }
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn video_connection(&self, output: OutputKind) -> Option<ConnectionInfo> {
        let has_camera = self.inputs.lock().iter().any(|i| i.device.kind == DeviceKind::Camera);
        (has_camera && self.has_output(output)).then_some(ConnectionInfo {
            supports_orientation: true,
            supports_mirroring: true,
        })
    }

    fn capture_photo(&self, settings: ConnectionSettings, completion: PhotoCallback) {
        *self.last_settings.lock() = Some(settings);
        let photo = self.photo.lock().clone();
        completion(photo);
    }

    fn start_recording(
        &self,
        path: &Path,
        settings: ConnectionSettings,
        finished: RecordingFinishedCallback,
    ) -> Result<(), CaptureError> {
        fs::write(path, b"raw movie").map_err(|e| CaptureError::StorageError(e.to_string()))?;
        *self.last_settings.lock() = Some(settings);
        *self.recording.lock() = Some(PendingRecording {
            path: path.to_path_buf(),
            finished,
        });
        Ok(())
    }

    fn stop_recording(&self) {
        let pending = self.recording.lock().take();
        if let Some(pending) = pending {
            let error = self.finish_error.lock().take();
            (pending.finished)(pending.path, error);
        }
    }

    fn is_recording(&self) -> bool {
        self.recording.lock().is_some()
    }
}

/// Copies the source synchronously, or fails when told to. While held,
/// exports wait until `release` completes them.
pub struct FakeExporter {
    calls: AtomicUsize,
    fails: AtomicBool,
    holding: AtomicBool,
    held: Mutex<Vec<(ExportRequest, ExportCallback)>>,
}

impl FakeExporter {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fails: AtomicBool::new(false),
            holding: AtomicBool::new(false),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fails(&self, fails: bool) {
        self.fails.store(fails, Ordering::SeqCst);
    }

    pub fn hold(&self, hold: bool) {
        self.holding.store(hold, Ordering::SeqCst);
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Complete every held export, in order.
    pub fn release(&self) {
        let held = std::mem::take(&mut *self.held.lock());
        for (request, completion) in held {
            self.complete(request, completion);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn complete(&self, request: ExportRequest, completion: ExportCallback) {
        if self.fails.load(Ordering::SeqCst) {
            completion(Err(CaptureError::ExportFailed("unsupported source".into())));
            return;
        }
        let result = fs::copy(&request.source, &request.destination)
            .map(|_| request.destination.clone())
            .map_err(|e| CaptureError::ExportFailed(e.to_string()));
        completion(result);
    }
}

impl MovieExporter for FakeExporter {
    fn export(&self, request: ExportRequest, completion: ExportCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.holding.load(Ordering::SeqCst) {
            self.held.lock().push((request, completion));
            return;
        }
        self.complete(request, completion);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started,
    Stopped,
    SingleTap(Point),
    DoubleTap,
    Error(CaptureError),
    Recording(RecordingState),
}

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn recording_states(&self) -> Vec<RecordingState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Recording(state) => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl SessionDelegate for EventLog {
    fn on_session_started(&self) {
        self.events.lock().push(Event::Started);
    }

    fn on_session_stopped(&self) {
        self.events.lock().push(Event::Stopped);
    }

    fn on_single_tap(&self, point: Point) {
        self.events.lock().push(Event::SingleTap(point));
    }

    fn on_double_tap(&self) {
        self.events.lock().push(Event::DoubleTap);
    }

    fn on_error(&self, error: &CaptureError) {
        self.events.lock().push(Event::Error(error.clone()));
    }

    fn on_recording_state_changed(&self, state: RecordingState) {
        self.events.lock().push(Event::Recording(state));
    }
}

pub type TestSession = CameraSession<FakeProvider, FakeBackend, FakeExporter>;

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub backend: Arc<FakeBackend>,
    pub exporter: Arc<FakeExporter>,
    pub delegate: Arc<EventLog>,
    pub temp_dir: PathBuf,
    pub session: TestSession,
    // Removes the directory once the rest of the harness is gone.
    _scratch: TempDir,
}

/// A session over the standard fakes, writing into its own temp directory.
pub fn harness() -> Harness {
    harness_with(SessionConfiguration::default())
}

pub fn harness_with(mut config: SessionConfiguration) -> Harness {
    let scratch = tempfile::Builder::new()
        .prefix("camera-capture-test-")
        .tempdir()
        .unwrap();
    let temp_dir = scratch.path().to_path_buf();
    config.temp_directory = temp_dir.clone();

    let provider = Arc::new(FakeProvider::standard());
    let backend = Arc::new(FakeBackend::new());
    let exporter = Arc::new(FakeExporter::new());
    let session = CameraSession::new(
        Arc::clone(&provider),
        Arc::clone(&backend),
        Arc::clone(&exporter),
        config,
    )
    .unwrap();
    let delegate = Arc::new(EventLog::default());
    session.set_delegate(&delegate);

    Harness {
        provider,
        backend,
        exporter,
        delegate,
        temp_dir,
        session,
        _scratch: scratch,
    }
}
