use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use camera_capture_core::storage::metadata;
use camera_capture_core::{
    AuthorizationStatus, CameraSession, CaptureBackend, CaptureError, DeviceKind, DevicePosition, FocusMode, ImageOrientation, Point,
    RecordingState, SessionConfiguration, SessionDelegate, Size,
};
use camera_capture_virtual::{count_movie_frames, CopyExporter, VirtualCaptureSession, VirtualDeviceProvider};

const WAIT: Duration = Duration::from_secs(10);

type Session = CameraSession<VirtualDeviceProvider, VirtualCaptureSession, CopyExporter>;

#[derive(Default)]
struct Recorder {
    errors: Mutex<Vec<CaptureError>>,
    states: Mutex<Vec<RecordingState>>,
    started: Mutex<usize>,
}

impl SessionDelegate for Recorder {
    fn on_session_started(&self) {
        *self.started.lock() += 1;
    }

    fn on_session_stopped(&self) {}

    fn on_single_tap(&self, _point: Point) {}

    fn on_double_tap(&self) {}

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_recording_state_changed(&self, state: RecordingState) {
        self.states.lock().push(state);
    }
}

struct Rig {
    provider: Arc<VirtualDeviceProvider>,
    backend: Arc<VirtualCaptureSession>,
    exporter: Arc<CopyExporter>,
    delegate: Arc<Recorder>,
    session: Session,
    temp_dir: PathBuf,
    _scratch: TempDir,
}

fn rig(write_metadata: bool) -> Rig {
    let scratch = tempfile::Builder::new().prefix("virtual-rig-").tempdir().unwrap();
    let temp_dir = scratch.path().to_path_buf();
    let config = SessionConfiguration {
        temp_directory: temp_dir.clone(),
        write_metadata,
        ..Default::default()
    };
    let provider = Arc::new(VirtualDeviceProvider::new());
    provider.set_authorization(DeviceKind::Camera, AuthorizationStatus::Authorized);
    provider.set_authorization(DeviceKind::Microphone, AuthorizationStatus::Authorized);
    let backend = Arc::new(VirtualCaptureSession::with_frame_interval(Duration::from_millis(10)));
    let exporter = Arc::new(CopyExporter::new());
    let session = CameraSession::new(
        Arc::clone(&provider),
        Arc::clone(&backend),
        Arc::clone(&exporter),
        config,
    )
    .unwrap();
    let delegate = Arc::new(Recorder::default());
    session.set_delegate(&delegate);
    Rig {
        provider,
        backend,
        exporter,
        delegate,
        session,
        temp_dir,
        _scratch: scratch,
    }
}

fn running_rig(write_metadata: bool) -> Rig {
    let rig = rig(write_metadata);
    rig.session.prepare();
    rig.session.start();
    rig.session.flush();
    rig
}

fn take_photo(session: &Session) -> Result<camera_capture_core::CapturedPhoto, CaptureError> {
    let (tx, rx) = mpsc::channel();
    session.capture_photo(move |photo| tx.send(photo).unwrap())?;
    rx.recv_timeout(WAIT).unwrap()
}

#[test]
fn prepare_binds_camera_and_microphone() {
    let rig = running_rig(false);

    assert_eq!(rig.session.camera_position(), Some(DevicePosition::Back));
    assert_eq!(rig.session.active_audio_input().unwrap().device.id, "virtual-mic");
    assert_eq!(rig.backend.inputs().len(), 2);
    assert!(!rig.backend.is_configuring());
    assert_eq!(*rig.delegate.started.lock(), 1);
}

#[test]
fn record_and_export_with_metadata() {
    let rig = running_rig(true);
    let (tx, rx) = mpsc::channel();

    let raw = rig.session.start_recording(move |output| tx.send(output).unwrap()).unwrap();
    thread::sleep(Duration::from_millis(50));
    rig.session.stop_recording();
    let exported = rx.recv_timeout(WAIT).unwrap().expect("exported movie");

    assert!(exported.starts_with(&rig.temp_dir));
    assert_ne!(exported, raw);
    assert!(count_movie_frames(&exported).unwrap() >= 1);
    assert_eq!(rig.exporter.completed(), 1);
    assert_eq!(
        *rig.delegate.states.lock(),
        vec![
            RecordingState::Recording,
            RecordingState::Exporting,
            RecordingState::NotRecording,
        ]
    );

    let record = metadata::read_metadata(&exported).unwrap();
    assert_eq!(record.camera_position, DevicePosition::Back);
    assert_eq!(record.checksum, metadata::sha256_file(&exported).unwrap());
    assert!(rig.delegate.errors.lock().is_empty());
}

#[test]
fn teardown_mid_recording_completes_once() {
    let rig = running_rig(false);
    let calls = Arc::new(Mutex::new(0));
    let (tx, rx) = mpsc::channel();

    let counter = Arc::clone(&calls);
    rig.session
        .start_recording(move |output| {
            *counter.lock() += 1;
            tx.send(output).unwrap();
        })
        .unwrap();
    thread::sleep(Duration::from_millis(30));
    drop(rig.session);

    rx.recv_timeout(WAIT).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(*calls.lock(), 1);
    assert!(!rig.backend.is_running());
}

#[test]
fn front_camera_photo_is_left_mirrored() {
    let rig = running_rig(false);

    assert_eq!(take_photo(&rig.session).unwrap().orientation, ImageOrientation::Up);

    rig.session.switch_camera();
    rig.session.flush();
    let photo = take_photo(&rig.session).unwrap();
    assert_eq!(photo.orientation, ImageOrientation::LeftMirrored);
}

#[test]
fn adjustments_reach_the_device() {
    let rig = running_rig(false);

    assert!(rig.session.focus(Point::new(50.0, 25.0), Size::new(100.0, 100.0)));
    assert!(rig.session.set_zoom(1.0));
    assert!(rig.session.set_torch(true));

    let settings = rig.provider.settings("virtual-back").unwrap();
    assert_eq!(
        settings.focus,
        Some((Point::new(0.25, 0.5), FocusMode::ContinuousAutoFocus))
    );
    assert_eq!(settings.zoom_factor, 8.0);
    assert!(settings.torch_on);
    assert!(!rig.provider.is_locked("virtual-back"));

    rig.session.switch_camera();
    rig.session.flush();
    assert!(!rig.provider.settings("virtual-back").unwrap().torch_on);
    assert!(!rig.session.set_torch(true));
}

#[test]
fn switch_to_missing_camera_leaves_no_video() {
    let rig = running_rig(false);
    rig.provider.disconnect("virtual-front");

    rig.session.switch_camera();
    rig.session.flush();

    assert!(rig.session.active_video_input().is_none());
    assert_eq!(
        *rig.delegate.errors.lock(),
        vec![CaptureError::PartialReconfiguration]
    );
    assert_eq!(take_photo(&rig.session).unwrap_err(), CaptureError::OutputUnavailable);
    assert!(!rig.backend.is_configuring());
}

#[test]
fn busy_camera_fails_switch() {
    let rig = running_rig(false);
    rig.backend.mark_busy("virtual-front");

    rig.session.switch_camera();
    rig.session.flush();

    assert!(rig.session.active_video_input().is_none());
    assert_eq!(
        *rig.delegate.errors.lock(),
        vec![CaptureError::PartialReconfiguration]
    );
}

#[test]
fn denied_camera_is_skipped() {
    let rig = rig(false);
    rig.provider.set_authorization(DeviceKind::Camera, AuthorizationStatus::Denied);

    rig.session.prepare();
    rig.session.flush();

    assert!(rig.session.active_video_input().is_none());
    assert!(rig.session.active_audio_input().is_some());
    assert!(rig.delegate.errors.lock().is_empty());
}

#[test]
fn access_prompt_sets_up_camera() {
    let rig = rig(false);
    rig.provider.set_authorization(DeviceKind::Camera, AuthorizationStatus::NotDetermined);
    let (tx, rx) = mpsc::channel();

    rig.session.request_camera_access(move || tx.send(()).unwrap());
    rx.recv_timeout(WAIT).unwrap();

    assert!(rig.session.is_camera_authorized());
    assert_eq!(rig.session.camera_position(), Some(DevicePosition::Back));
}
