use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::config::SessionConfiguration;
use crate::models::device::{AuthorizationStatus, DeviceInput, DeviceKind, DevicePosition, OutputKind};
use crate::models::error::CaptureError;
use crate::models::orientation::DeviceOrientation;
use crate::models::state::{CaptureState, RecordingState};
use crate::processing::export::ExportPipeline;
use crate::session::queue::{QueueHandle, SessionQueue};
use crate::session::transaction::{ConfigurationTransaction, InputBinding};
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::device_provider::DeviceProvider;
use crate::traits::movie_exporter::MovieExporter;
use crate::traits::session_delegate::SessionDelegate;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
pub(super) struct SessionState {
    pub(super) capture_state: CaptureState,
    pub(super) recording_state: RecordingState,
    pub(super) active_video_input: Option<DeviceInput>,
    pub(super) active_audio_input: Option<DeviceInput>,
    pub(super) torch_on: bool,
    pub(super) zoom_factor: f64,
    pub(super) device_orientation: DeviceOrientation,
    preset_applied: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            capture_state: CaptureState::Idle,
            recording_state: RecordingState::NotRecording,
            active_video_input: None,
            active_audio_input: None,
            torch_on: false,
            zoom_factor: 1.0,
            device_orientation: DeviceOrientation::Portrait,
            preset_applied: false,
        }
    }
}

/// State shared between the public handle, queue jobs and backend callbacks.
pub(super) struct SessionInner<P: DeviceProvider, B: CaptureBackend, E: MovieExporter> {
    pub(super) provider: Arc<P>,
    pub(super) backend: Arc<B>,
    pub(super) export: ExportPipeline<E>,
    pub(super) config: SessionConfiguration,
    pub(super) queue: QueueHandle,
    pub(super) state: Mutex<SessionState>,
    delegate: Mutex<Option<Weak<dyn SessionDelegate>>>,
    transaction_open: AtomicBool,
}

/// Platform-agnostic camera session manager.
///
/// Generic over the device registry, capture session and movie exporter via
/// the `DeviceProvider`, `CaptureBackend` and `MovieExporter` traits.
///
/// Structural work (start, stop, setup, camera switch, configuration
/// transactions, post-recording handling) runs on a dedicated worker
/// thread, one job at a time:
/// ```text
/// caller ─ start/stop/switch/setup ─→ [session queue] ─→ CaptureBackend
///                                           ↑
/// CaptureBackend ─ recording finished ──────┘─→ ExportPipeline ─→ on_finished
/// ```
/// Capture operations and device adjustments run on the calling thread.
pub struct CameraSession<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    pub(super) inner: Arc<SessionInner<P, B, E>>,
    queue: SessionQueue,
}

impl<P, B, E> CameraSession<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    pub fn new(
        provider: Arc<P>,
        backend: Arc<B>,
        exporter: Arc<E>,
        config: SessionConfiguration,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        fs::create_dir_all(&config.temp_directory)
            .map_err(|e| CaptureError::StorageError(format!("failed to create temp directory: {}", e)))?;

        let queue = SessionQueue::new("camera-session")?;
        let inner = Arc::new(SessionInner {
            provider,
            backend,
            export: ExportPipeline::new(exporter, config.clone()),
            config,
            queue: queue.handle(),
            state: Mutex::new(SessionState::new()),
            delegate: Mutex::new(None),
            transaction_open: AtomicBool::new(false),
        });

        Ok(Self { inner, queue })
    }

    /// Register the delegate. The session keeps only a weak reference.
    pub fn set_delegate<D: SessionDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<D> = Arc::downgrade(delegate);
        let weak: Weak<dyn SessionDelegate> = weak;
        *self.inner.delegate.lock() = Some(weak);
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.inner.config
    }

    pub fn state(&self) -> CaptureState {
        self.inner.state.lock().capture_state
    }

    pub fn recording_state(&self) -> RecordingState {
        self.inner.state.lock().recording_state
    }

    pub fn is_recording(&self) -> bool {
        self.recording_state().is_recording()
    }

    pub fn active_video_input(&self) -> Option<DeviceInput> {
        self.inner.state.lock().active_video_input.clone()
    }

    pub fn active_audio_input(&self) -> Option<DeviceInput> {
        self.inner.state.lock().active_audio_input.clone()
    }

    /// Position of the active camera, if one is bound.
    pub fn camera_position(&self) -> Option<DevicePosition> {
        self.inner
            .state
            .lock()
            .active_video_input
            .as_ref()
            .map(DeviceInput::position)
    }

    pub fn is_torch_on(&self) -> bool {
        self.inner.state.lock().torch_on
    }

    pub fn zoom_factor(&self) -> f64 {
        self.inner.state.lock().zoom_factor
    }

    pub fn device_orientation(&self) -> DeviceOrientation {
        self.inner.state.lock().device_orientation
    }

    /// Record the physical device orientation reported by the host.
    pub fn set_device_orientation(&self, orientation: DeviceOrientation) {
        self.inner.state.lock().device_orientation = orientation;
    }

    /// Start the session on the worker. Does nothing if it is already
    /// running by the time the job runs.
    pub fn start(&self) {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || inner.start_on_queue());
    }

    /// Stop the session on the worker, after any start queued before it.
    /// Does nothing if it is already stopped by the time the job runs.
    pub fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || inner.stop_on_queue());
    }

    /// Run `f` on the worker inside a begin/commit configuration bracket.
    ///
    /// Inputs added or removed here are not tracked as the session's active
    /// inputs; use `setup_camera`, `setup_audio` and `switch_camera` for that.
    pub fn configure<F>(&self, f: F)
    where
        F: FnOnce(&mut ConfigurationTransaction<'_, B>) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || {
            let mut tx = match inner.begin_transaction() {
                Some(tx) => tx,
                None => return,
            };
            f(&mut tx);
            tx.commit();
        });
    }

    /// Bind the back camera, apply the preset and attach the photo and
    /// movie outputs. Idempotent.
    pub fn setup_camera(&self) {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || inner.setup_camera_on_queue());
    }

    /// Bind the default microphone. Idempotent.
    pub fn setup_audio(&self) {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || inner.setup_audio_on_queue());
    }

    /// Swap the active camera for the one on the opposite side.
    pub fn switch_camera(&self) {
        let inner = Arc::clone(&self.inner);
        self.queue.dispatch(move || inner.switch_camera_on_queue());
    }

    pub fn is_camera_authorized(&self) -> bool {
        self.inner.provider.authorization_status(DeviceKind::Camera).is_authorized()
    }

    pub fn is_microphone_authorized(&self) -> bool {
        self.inner
            .provider
            .authorization_status(DeviceKind::Microphone)
            .is_authorized()
    }

    /// Request camera access. On grant the camera is set up on the worker and
    /// `on_ready` runs after it. Nothing happens on denial.
    pub fn request_camera_access<F>(&self, on_ready: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.request_access(DeviceKind::Camera, on_ready);
    }

    /// Request microphone access. On grant the microphone is set up on the
    /// worker and `on_ready` runs after it. Nothing happens on denial.
    pub fn request_microphone_access<F>(&self, on_ready: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.request_access(DeviceKind::Microphone, on_ready);
    }

    /// Set up every device the user has authorized, asking where the user
    /// has not decided yet. Denied or restricted devices are skipped.
    pub fn prepare(&self) {
        for kind in [DeviceKind::Camera, DeviceKind::Microphone] {
            let status = self.inner.provider.authorization_status(kind);
            if status.is_authorized() {
                let inner = Arc::clone(&self.inner);
                self.queue.dispatch(move || inner.setup_on_queue(kind));
            } else if status == AuthorizationStatus::NotDetermined {
                self.inner.request_access(kind, || {});
            } else {
                log::info!("{:?} access {:?}; skipping setup", kind, status);
            }
        }
    }

    /// Block until all previously scheduled session work has run.
    pub fn flush(&self) {
        self.queue.flush();
    }
}

impl<P, B, E> Drop for CameraSession<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

impl<P, B, E> SessionInner<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    pub(super) fn delegate(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.delegate.lock().as_ref().and_then(Weak::upgrade)
    }

    pub(super) fn notify_error(&self, error: &CaptureError) {
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }

    pub(super) fn set_recording_state(&self, new_state: RecordingState) {
        self.state.lock().recording_state = new_state;
        self.notify_recording_state(new_state);
    }

    pub(super) fn notify_recording_state(&self, state: RecordingState) {
        log::debug!("Recording state -> {:?}", state);
        if let Some(delegate) = self.delegate() {
            delegate.on_recording_state_changed(state);
        }
    }

    fn begin_transaction(&self) -> Option<ConfigurationTransaction<'_, B>> {
        match ConfigurationTransaction::begin(&*self.backend, &self.transaction_open) {
            Ok(tx) => Some(tx),
            Err(e) => {
                log::error!("Cannot begin configuration: {}", e);
                self.notify_error(&e);
                None
            }
        }
    }

    fn start_on_queue(&self) {
        if self.backend.is_running() {
            log::debug!("Capture session already running");
            return;
        }
        match self.backend.start_running() {
            Ok(()) => {
                self.state.lock().capture_state = CaptureState::Running;
                log::info!("Capture session started");
                if let Some(delegate) = self.delegate() {
                    delegate.on_session_started();
                }
            }
            Err(e) => {
                log::error!("Failed to start capture session: {}", e);
                self.notify_error(&e);
            }
        }
    }

    fn stop_on_queue(&self) {
        if !self.backend.is_running() {
            log::debug!("Capture session already stopped");
            self.state.lock().capture_state = CaptureState::Idle;
            return;
        }
        self.backend.stop_running();
        self.state.lock().capture_state = CaptureState::Idle;
        log::info!("Capture session stopped");
        if let Some(delegate) = self.delegate() {
            delegate.on_session_stopped();
        }
    }

    fn setup_on_queue(&self, kind: DeviceKind) {
        match kind {
            DeviceKind::Camera => self.setup_camera_on_queue(),
            DeviceKind::Microphone => self.setup_audio_on_queue(),
        }
    }

    fn setup_camera_on_queue(&self) {
        let Some(mut tx) = self.begin_transaction() else {
            return;
        };

        if self.state.lock().active_video_input.is_none() {
            match self.provider.default_video_device(DevicePosition::Back) {
                Some(device) => match tx.try_add_input(&device) {
                    Ok(InputBinding::Added(input)) => {
                        log::info!("Camera {} bound", device.name);
                        self.state.lock().active_video_input = Some(input);
                    }
                    Ok(InputBinding::Skipped(_)) => {
                        log::warn!("Camera {} not bound; session refused it", device.name);
                    }
                    Err(e) => {
                        log::error!("Camera {} unavailable: {}", device.name, e);
                        self.notify_error(&e);
                    }
                },
                None => {
                    log::warn!("No back camera available");
                    self.notify_error(&CaptureError::DeviceUnavailable);
                }
            }
        }

        let apply_preset = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.preset_applied, true)
        };
        if apply_preset {
            tx.set_preset(self.config.preset);
        }

        for output in [OutputKind::Photo, OutputKind::Movie] {
            tx.try_add_output(output);
        }

        tx.commit();
    }

    fn setup_audio_on_queue(&self) {
        if self.state.lock().active_audio_input.is_some() {
            return;
        }
        let Some(device) = self.provider.default_audio_device() else {
            log::warn!("No microphone available");
            self.notify_error(&CaptureError::DeviceUnavailable);
            return;
        };
        let Some(mut tx) = self.begin_transaction() else {
            return;
        };

        match tx.try_add_input(&device) {
            Ok(InputBinding::Added(input)) => {
                log::info!("Microphone {} bound", device.name);
                self.state.lock().active_audio_input = Some(input);
            }
            Ok(InputBinding::Skipped(_)) => {
                log::warn!("Microphone {} not bound; session refused it", device.name);
            }
            Err(e) => {
                log::error!("Microphone {} unavailable: {}", device.name, e);
                self.notify_error(&e);
            }
        }

        tx.commit();
    }

    fn switch_camera_on_queue(&self) {
        let Some(mut tx) = self.begin_transaction() else {
            return;
        };

        let current = self.state.lock().active_video_input.clone();
        let new_position = current
            .as_ref()
            .map(|input| input.position().opposite())
            .unwrap_or(DevicePosition::Back);

        if new_position.is_front() {
            self.apply_torch(false);
            self.state.lock().torch_on = false;
        }

        if let Some(input) = &current {
            tx.remove_input(input);
        }
        self.state.lock().active_video_input = None;

        let replacement = match self.provider.default_video_device(new_position) {
            Some(device) => match tx.try_add_input(&device) {
                Ok(binding) => binding.added(),
                Err(e) => {
                    log::warn!("Camera {} unavailable: {}", device.name, e);
                    None
                }
            },
            None => {
                log::warn!("No {:?} camera available", new_position);
                None
            }
        };

        let switched = replacement.is_some();
        {
            let mut state = self.state.lock();
            state.active_video_input = replacement;
            state.zoom_factor = 1.0;
        }

        tx.commit();

        if switched {
            log::info!("Switched to {:?} camera", new_position);
        } else {
            log::error!("Camera switch left the session without a video input");
            self.notify_error(&CaptureError::PartialReconfiguration);
        }
    }

    fn request_access<F>(self: &Arc<Self>, kind: DeviceKind, on_ready: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = Arc::clone(self);
        self.provider.request_access(
            kind,
            Box::new(move |granted| {
                if !granted {
                    log::info!("{:?} access denied", kind);
                    return;
                }
                let setup = Arc::clone(&inner);
                inner.queue.dispatch(move || {
                    setup.setup_on_queue(kind);
                    on_ready();
                });
            }),
        );
    }
}
