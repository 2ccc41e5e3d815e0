//! Photo and movie capture.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::config::MovieFileType;
use crate::models::device::{DevicePosition, OutputKind};
use crate::models::error::CaptureError;
use crate::models::orientation::VideoOrientation;
use crate::models::photo::CapturedPhoto;
use crate::models::recording_metadata::RecordingMetadata;
use crate::models::state::RecordingState;
use crate::processing::{orientation, photo};
use crate::session::camera_session::{CameraSession, SessionInner};
use crate::storage::{metadata, temp_files};
use crate::traits::capture_backend::{CaptureBackend, ConnectionSettings, RecordingFinishedCallback};
use crate::traits::device_provider::DeviceProvider;
use crate::traits::movie_exporter::MovieExporter;

/// How a recording was captured, kept for its metadata sidecar.
#[derive(Debug, Clone, Copy)]
struct RecordingContext {
    position: DevicePosition,
    mirrored: bool,
    orientation: Option<VideoOrientation>,
}

/// Recording completion that runs exactly once.
///
/// Once armed, dropping it uncalled reports `None`, so a recording lost in
/// teardown or dropped by the backend or exporter still completes.
struct OnFinished<F: FnOnce(Option<PathBuf>)> {
    callback: Option<F>,
    armed: Arc<AtomicBool>,
}

impl<F: FnOnce(Option<PathBuf>)> OnFinished<F> {
    fn new(callback: F, armed: Arc<AtomicBool>) -> Self {
        Self {
            callback: Some(callback),
            armed,
        }
    }

    fn finish(mut self, output: Option<PathBuf>) {
        if let Some(callback) = self.callback.take() {
            callback(output);
        }
    }
}

impl<F: FnOnce(Option<PathBuf>)> Drop for OnFinished<F> {
    fn drop(&mut self) {
        if !self.armed.load(Ordering::SeqCst) {
            return;
        }
        if let Some(callback) = self.callback.take() {
            log::warn!("Recording completion dropped before it ran; reporting no output");
            callback(None);
        }
    }
}

impl<P, B, E> CameraSession<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    /// Take a still photo.
    ///
    /// `on_captured` runs exactly once if this returns `Ok`, on whatever
    /// thread the backend completes on. It never runs if this returns `Err`.
    pub fn capture_photo<F>(&self, on_captured: F) -> Result<(), CaptureError>
    where
        F: FnOnce(Result<CapturedPhoto, CaptureError>) + Send + 'static,
    {
        let connection = self
            .inner
            .backend
            .video_connection(OutputKind::Photo)
            .ok_or(CaptureError::OutputUnavailable)?;

        let (position, device_orientation) = {
            let state = self.inner.state.lock();
            let position = state
                .active_video_input
                .as_ref()
                .map(|input| input.position())
                .unwrap_or_default();
            (position, state.device_orientation)
        };

        let settings = ConnectionSettings {
            orientation: connection
                .supports_orientation
                .then(|| orientation::capture_orientation(device_orientation)),
            mirrored: false,
        };
        let image_orientation = orientation::photo_orientation(position);
        log::debug!("Capturing photo ({:?} camera, {:?})", position, settings.orientation);

        self.inner.backend.capture_photo(
            settings,
            Box::new(move |result| {
                let photo = result
                    .map_err(|e| match e {
                        CaptureError::PhotoCaptureFailed(_) => e,
                        other => CaptureError::PhotoCaptureFailed(other.to_string()),
                    })
                    .and_then(|raw| photo::decode_photo(&raw, image_orientation));
                if let Err(e) = &photo {
                    log::warn!("Photo capture failed: {}", e);
                }
                on_captured(photo);
            }),
        );
        Ok(())
    }

    /// Start recording a movie to a fresh temp file and return its path.
    ///
    /// Once recording is stopped the movie is exported, and `on_finished`
    /// receives the exported file, or `None` if recording or export failed
    /// or the session was torn down first. It runs exactly once if this
    /// returns `Ok`, and never if this returns `Err`.
    pub fn start_recording<F>(&self, on_finished: F) -> Result<PathBuf, CaptureError>
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        let connection = self
            .inner
            .backend
            .video_connection(OutputKind::Movie)
            .ok_or(CaptureError::OutputUnavailable)?;

        let (position, device_orientation) = {
            let mut state = self.inner.state.lock();
            if state.recording_state.is_busy() || self.inner.backend.is_recording() {
                return Err(CaptureError::RecordingInProgress);
            }
            state.recording_state = RecordingState::Recording;
            let position = state
                .active_video_input
                .as_ref()
                .map(|input| input.position())
                .unwrap_or_default();
            (position, state.device_orientation)
        };
        self.inner.notify_recording_state(RecordingState::Recording);

        let settings = ConnectionSettings {
            orientation: connection
                .supports_orientation
                .then(|| orientation::capture_orientation(device_orientation)),
            mirrored: connection.supports_mirroring && orientation::mirrors_video(position),
        };
        let context = RecordingContext {
            position,
            mirrored: settings.mirrored,
            orientation: settings.orientation,
        };
        let path = temp_files::movie_file_path(
            &self.inner.config.temp_directory,
            &self.inner.config.file_prefix,
            MovieFileType::QuickTime,
        );

        let armed = Arc::new(AtomicBool::new(false));
        let on_finished = OnFinished::new(on_finished, Arc::clone(&armed));
        let weak = Arc::downgrade(&self.inner);
        let finished: RecordingFinishedCallback = Box::new(move |source, error| match weak.upgrade() {
            Some(inner) => {
                let handler = Arc::clone(&inner);
                if !inner
                    .queue
                    .dispatch(move || handler.finish_recording(source, error, context, on_finished))
                {
                    log::warn!("Session closed before the recording finished");
                }
            }
            None => {
                log::warn!("Recording finished after its session was dropped");
                on_finished.finish(None);
            }
        });

        if let Err(e) = self.inner.backend.start_recording(&path, settings, finished) {
            log::error!("Failed to start recording: {}", e);
            self.inner.set_recording_state(RecordingState::NotRecording);
            return Err(e);
        }
        armed.store(true, Ordering::SeqCst);

        log::info!("Recording to {}", path.display());
        Ok(path)
    }

    /// Ask the movie output to finalize. Does nothing unless recording.
    pub fn stop_recording(&self) {
        if !self.recording_state().is_recording() {
            log::debug!("Not recording; stop ignored");
            return;
        }
        log::info!("Stopping recording");
        self.inner.backend.stop_recording();
    }
}

impl<P, B, E> SessionInner<P, B, E>
where
    P: DeviceProvider + 'static,
    B: CaptureBackend + 'static,
    E: MovieExporter + 'static,
{
    fn finish_recording<F>(
        self: &Arc<Self>,
        source: PathBuf,
        error: Option<CaptureError>,
        context: RecordingContext,
        on_finished: OnFinished<F>,
    ) where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        if let Some(e) = error {
            let error = match e {
                CaptureError::RecordingFailed(_) => e,
                other => CaptureError::RecordingFailed(other.to_string()),
            };
            log::error!("Recording to {} failed: {}", source.display(), error);
            self.notify_error(&error);
            self.set_recording_state(RecordingState::NotRecording);
            on_finished.finish(None);
            return;
        }

        self.set_recording_state(RecordingState::Exporting);
        let inner = Arc::clone(self);
        let recorded = source.clone();
        self.export.export(&source, move |output| {
            if let Some(exported) = &output {
                log::info!("Recording exported to {}", exported.display());
                if inner.config.write_metadata {
                    write_sidecar(&recorded, exported, &context);
                }
            }
            inner.set_recording_state(RecordingState::NotRecording);
            on_finished.finish(output);
        });
    }
}

fn write_sidecar(source: &Path, exported: &Path, context: &RecordingContext) {
    let result = metadata::sha256_file(exported).and_then(|checksum| {
        let record = RecordingMetadata::new(
            source,
            exported,
            &checksum,
            context.position,
            context.mirrored,
            context.orientation,
        );
        metadata::write_metadata(&record, exported)
    });
    if let Err(e) = result {
        log::warn!("Failed to write metadata for {}: {}", exported.display(), e);
    }
}
