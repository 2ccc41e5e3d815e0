//! Drives a full session against the virtual backend.
//!
//! Usage: `camera-demo [config.json]`. Set `RUST_LOG=debug` for the
//! session's own logging.

use std::fs;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use camera_capture_core::{
    CameraSession, CaptureError, DeviceOrientation, Point, RecordingState, SessionConfiguration, SessionDelegate,
    Size,
};
use camera_capture_virtual::{count_movie_frames, CopyExporter, VirtualCaptureSession, VirtualDeviceProvider};

const WAIT: Duration = Duration::from_secs(10);

/// SessionDelegate that forwards events to the log.
struct LogDelegate;

impl SessionDelegate for LogDelegate {
    fn on_session_started(&self) {
        log::info!("[delegate] session started");
    }

    fn on_session_stopped(&self) {
        log::info!("[delegate] session stopped");
    }

    fn on_single_tap(&self, point: Point) {
        log::info!("[delegate] tap at ({}, {})", point.x, point.y);
    }

    fn on_double_tap(&self) {
        log::info!("[delegate] double tap");
    }

    fn on_error(&self, error: &CaptureError) {
        log::error!("[delegate] {}", error);
    }

    fn on_recording_state_changed(&self, state: RecordingState) {
        log::info!("[delegate] recording state {:?}", state);
    }
}

fn load_config() -> Result<SessionConfiguration, CaptureError> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SessionConfiguration::default());
    };
    let json = fs::read_to_string(&path)
        .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path, e)))?;
    SessionConfiguration::from_json(&json)
}

fn timed_out(what: &str) -> CaptureError {
    CaptureError::Unknown(format!("timed out waiting for {}", what))
}

fn run() -> Result<(), CaptureError> {
    let config = load_config()?;
    let temp_dir = config.temp_directory.clone();
    let prefix = config.file_prefix.clone();

    let provider = Arc::new(VirtualDeviceProvider::new());
    let session = CameraSession::new(
        Arc::clone(&provider),
        Arc::new(VirtualCaptureSession::new()),
        Arc::new(CopyExporter::new()),
        config,
    )?;
    let delegate = Arc::new(LogDelegate);
    session.set_delegate(&delegate);

    // Camera and microphone start undetermined; the virtual prompt grants both.
    let (ready_tx, ready_rx) = mpsc::channel();
    let mic_ready = ready_tx.clone();
    session.request_camera_access(move || {
        let _ = ready_tx.send("camera");
    });
    session.request_microphone_access(move || {
        let _ = mic_ready.send("microphone");
    });
    for _ in 0..2 {
        let device = ready_rx.recv_timeout(WAIT).map_err(|_| timed_out("device setup"))?;
        println!("{} ready", device);
    }

    session.start();
    session.flush();
    session.set_device_orientation(DeviceOrientation::Portrait);

    session.handle_single_tap(Point::new(120.0, 300.0), Size::new(390.0, 844.0));
    session.set_zoom(0.25);
    session.set_torch(true);
    println!("zoom factor {:.2}, torch {}", session.zoom_factor(), session.is_torch_on());

    let (photo_tx, photo_rx) = mpsc::channel();
    session.capture_photo(move |photo| {
        let _ = photo_tx.send(photo);
    })?;
    let photo = photo_rx.recv_timeout(WAIT).map_err(|_| timed_out("photo"))??;
    let photo_path = temp_dir.join(format!("{}_photo_{}.png", prefix, uuid::Uuid::new_v4()));
    photo
        .oriented()
        .save(&photo_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to save photo: {}", e)))?;
    println!("photo {}x{} saved to {}", photo.width(), photo.height(), photo_path.display());

    session.switch_camera();
    session.flush();
    println!("switched to {:?} camera, torch {}", session.camera_position(), session.is_torch_on());

    let (movie_tx, movie_rx) = mpsc::channel();
    let raw = session.start_recording(move |output| {
        let _ = movie_tx.send(output);
    })?;
    println!("recording to {}", raw.display());
    thread::sleep(Duration::from_millis(500));
    session.stop_recording();

    match movie_rx.recv_timeout(WAIT).map_err(|_| timed_out("export"))? {
        Some(movie) => println!(
            "movie exported to {} ({} frames)",
            movie.display(),
            count_movie_frames(&movie)?
        ),
        None => println!("recording produced no movie"),
    }

    session.stop();
    session.flush();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("camera demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
