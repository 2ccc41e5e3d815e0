//! Virtual capture session.
//!
//! Simulates a capture graph with a synthetic sensor. Photos are rendered
//! test patterns encoded as JPEG on a dedicated thread. Movies are written
//! by a recorder thread as a minimal frame container:
//!
//! ```text
//! "VMOV" | frame* where frame = u32 LE length | PNG bytes
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;

use camera_capture_core::models::config::SessionPreset;
use camera_capture_core::models::device::{CaptureDeviceHandle, DeviceInput, DeviceKind, DevicePosition, OutputKind};
use camera_capture_core::models::error::CaptureError;
use camera_capture_core::models::orientation::VideoOrientation;
use camera_capture_core::models::photo::RawPhoto;
use camera_capture_core::traits::capture_backend::{
    CaptureBackend, ConnectionInfo, ConnectionSettings, PhotoCallback, RecordingFinishedCallback,
};

/// Magic bytes at the start of every virtual movie file.
pub const MOVIE_MAGIC: &[u8; 4] = b"VMOV";

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(66);

struct SessionGraph {
    configuring: u32,
    preset: SessionPreset,
    inputs: Vec<DeviceInput>,
    outputs: HashSet<OutputKind>,
    busy: HashSet<String>,
}

impl SessionGraph {
    fn camera(&self) -> Option<&DeviceInput> {
        self.inputs.iter().find(|i| i.device.kind == DeviceKind::Camera)
    }

    fn warn_if_unbracketed(&self, what: &str) {
        if self.configuring == 0 {
            log::warn!("{} outside of a configuration bracket", what);
        }
    }
}

/// `CaptureBackend` backed by a synthetic sensor.
pub struct VirtualCaptureSession {
    graph: Mutex<SessionGraph>,
    running: AtomicBool,
    recording: Arc<AtomicBool>,
    recorder_stop: Mutex<Option<Arc<AtomicBool>>>,
    recorder_handle: Mutex<Option<thread::JoinHandle<()>>>,
    frame_interval: Duration,
}

impl VirtualCaptureSession {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    /// Create a session whose recorder writes one frame per `interval`.
    pub fn with_frame_interval(interval: Duration) -> Self {
        Self {
            graph: Mutex::new(SessionGraph {
                configuring: 0,
                preset: SessionPreset::High,
                inputs: Vec::new(),
                outputs: HashSet::new(),
                busy: HashSet::new(),
            }),
            running: AtomicBool::new(false),
            recording: Arc::new(AtomicBool::new(false)),
            recorder_stop: Mutex::new(None),
            recorder_handle: Mutex::new(None),
            frame_interval: interval,
        }
    }

    /// Simulate another client holding `device_id`; inputs for it fail.
    pub fn mark_busy(&self, device_id: &str) {
        self.graph.lock().busy.insert(device_id.to_string());
    }

    pub fn release(&self, device_id: &str) {
        self.graph.lock().busy.remove(device_id);
    }

    pub fn preset(&self) -> SessionPreset {
        self.graph.lock().preset
    }

    pub fn inputs(&self) -> Vec<DeviceInput> {
        self.graph.lock().inputs.clone()
    }

    pub fn is_configuring(&self) -> bool {
        self.graph.lock().configuring > 0
    }

    fn join_recorder(&self) {
        if let Some(handle) = self.recorder_handle.lock().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("Movie recorder thread panicked");
            }
        }
    }
}

impl Default for VirtualCaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VirtualCaptureSession {
    fn drop(&mut self) {
        self.stop_recording();
        self.join_recorder();
    }
}

impl CaptureBackend for VirtualCaptureSession {
    fn begin_configuration(&self) {
        self.graph.lock().configuring += 1;
    }

    fn commit_configuration(&self) {
        let mut graph = self.graph.lock();
        if graph.configuring == 0 {
            log::warn!("commit_configuration without begin_configuration");
            return;
        }
        graph.configuring -= 1;
        if graph.configuring == 0 {
            log::debug!(
                "Virtual session configured: {} input(s), outputs {:?}, preset {:?}",
                graph.inputs.len(),
                graph.outputs,
                graph.preset
            );
        }
    }

    fn set_preset(&self, preset: SessionPreset) {
        self.graph.lock().preset = preset;
    }

    fn make_input(&self, device: &CaptureDeviceHandle) -> Result<DeviceInput, CaptureError> {
        if self.graph.lock().busy.contains(&device.id) {
            return Err(CaptureError::DeviceUnavailable);
        }
        Ok(DeviceInput::new(device.clone()))
    }

    /// One input per device kind.
    fn can_add_input(&self, input: &DeviceInput) -> bool {
        !self
            .graph
            .lock()
            .inputs
            .iter()
            .any(|i| i.device.kind == input.device.kind)
    }

    fn add_input(&self, input: &DeviceInput) {
        let mut graph = self.graph.lock();
        graph.warn_if_unbracketed("add_input");
        graph.inputs.push(input.clone());
    }

    fn remove_input(&self, input: &DeviceInput) {
        let mut graph = self.graph.lock();
        graph.warn_if_unbracketed("remove_input");
        graph.inputs.retain(|i| i.id != input.id);
    }

    fn can_add_output(&self, output: OutputKind) -> bool {
        !self.graph.lock().outputs.contains(&output)
    }

    fn add_output(&self, output: OutputKind) {
        let mut graph = self.graph.lock();
        graph.warn_if_unbracketed("add_output");
        graph.outputs.insert(output);
    }

    fn has_output(&self, output: OutputKind) -> bool {
        self.graph.lock().outputs.contains(&output)
    }

    fn start_running(&self) -> Result<(), CaptureError> {
        if self.graph.lock().configuring > 0 {
            return Err(CaptureError::ConfigurationFailed(
                "cannot start while configuring".into(),
            ));
        }
        self.running.store(true, Ordering::SeqCst);
        log::debug!("Virtual session running");
        Ok(())
    }

    fn stop_running(&self) {
        self.stop_recording();
        self.running.store(false, Ordering::SeqCst);
        log::debug!("Virtual session stopped");
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn video_connection(&self, output: OutputKind) -> Option<ConnectionInfo> {
        let graph = self.graph.lock();
        (graph.outputs.contains(&output) && graph.camera().is_some()).then_some(ConnectionInfo {
            supports_orientation: true,
            supports_mirroring: true,
        })
    }

    fn capture_photo(&self, settings: ConnectionSettings, completion: PhotoCallback) {
        let frame = {
            let graph = self.graph.lock();
            match graph.camera() {
                Some(camera) if self.is_running() => Some(FrameSpec::new(graph.preset, camera.position(), settings)),
                _ => None,
            }
        };
        let Some(frame) = frame else {
            completion(Err(CaptureError::PhotoCaptureFailed(
                "session is not running with a camera".into(),
            )));
            return;
        };

        let slot = Arc::new(Mutex::new(Some(completion)));
        let worker_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name("virtual-photo-capture".into())
            .spawn(move || {
                let result = encode(&frame.render(0), ImageFormat::Jpeg)
                    .map(|data| RawPhoto { data, scale: 1.0 })
                    .map_err(CaptureError::PhotoCaptureFailed);
                if let Some(completion) = worker_slot.lock().take() {
                    completion(result);
                }
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn photo thread: {}", e);
            if let Some(completion) = slot.lock().take() {
                completion(Err(CaptureError::PhotoCaptureFailed(e.to_string())));
            }
        }
    }

    fn start_recording(
        &self,
        path: &Path,
        settings: ConnectionSettings,
        finished: RecordingFinishedCallback,
    ) -> Result<(), CaptureError> {
        if self.recording.load(Ordering::SeqCst) {
            return Err(CaptureError::RecordingInProgress);
        }
        let frame = {
            let graph = self.graph.lock();
            if !graph.outputs.contains(&OutputKind::Movie) {
                return Err(CaptureError::OutputUnavailable);
            }
            let camera = graph
                .camera()
                .ok_or_else(|| CaptureError::RecordingFailed("no camera input".into()))?;
            FrameSpec::new(graph.preset, camera.position(), settings)
        };
        if !self.is_running() {
            return Err(CaptureError::RecordingFailed("session is not running".into()));
        }

        self.join_recorder();

        let mut writer = File::create(path)
            .map(BufWriter::new)
            .map_err(|e| CaptureError::StorageError(format!("failed to create {}: {}", path.display(), e)))?;
        writer
            .write_all(MOVIE_MAGIC)
            .map_err(|e| CaptureError::StorageError(format!("failed to write movie header: {}", e)))?;

        let stop = Arc::new(AtomicBool::new(false));
        self.recording.store(true, Ordering::SeqCst);
        let recording = Arc::clone(&self.recording);
        let thread_stop = Arc::clone(&stop);
        let interval = self.frame_interval;
        let movie_path = path.to_path_buf();

        let handle = thread::Builder::new()
            .name("virtual-movie-recorder".into())
            .spawn(move || {
                let error = record_loop(&mut writer, &frame, &thread_stop, interval).err();
                drop(writer);
                recording.store(false, Ordering::SeqCst);
                finished(movie_path, error);
            })
            .map_err(|e| {
                self.recording.store(false, Ordering::SeqCst);
                CaptureError::RecordingFailed(format!("failed to spawn recorder thread: {}", e))
            })?;

        *self.recorder_stop.lock() = Some(stop);
        *self.recorder_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop_recording(&self) {
        if let Some(stop) = self.recorder_stop.lock().take() {
            stop.store(true, Ordering::SeqCst);
        }
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

/// Writes frames until `stop` is raised. At least one frame is always
/// written so every finished movie has content.
fn record_loop(
    writer: &mut BufWriter<File>,
    frame: &FrameSpec,
    stop: &AtomicBool,
    interval: Duration,
) -> Result<(), CaptureError> {
    let mut index = 0u32;
    loop {
        let png = encode(&frame.render(index), ImageFormat::Png).map_err(CaptureError::RecordingFailed)?;
        let len = u32::try_from(png.len())
            .map_err(|_| CaptureError::RecordingFailed("frame too large".into()))?;
        writer
            .write_all(&len.to_le_bytes())
            .and_then(|_| writer.write_all(&png))
            .map_err(|e| CaptureError::StorageError(format!("failed to write frame: {}", e)))?;
        index += 1;

        if stop.load(Ordering::SeqCst) {
            break;
        }
        thread::sleep(interval);
        if stop.load(Ordering::SeqCst) {
            break;
        }
    }
    writer
        .flush()
        .map_err(|e| CaptureError::StorageError(format!("failed to finalize movie: {}", e)))?;
    log::debug!("Recorded {} frame(s)", index);
    Ok(())
}

/// Count the frames in a virtual movie file.
pub fn count_movie_frames(path: &Path) -> Result<usize, CaptureError> {
    let bytes = std::fs::read(path).map_err(|e| CaptureError::StorageError(e.to_string()))?;
    let body = bytes
        .strip_prefix(MOVIE_MAGIC.as_slice())
        .ok_or_else(|| CaptureError::StorageError(format!("{} is not a virtual movie", path.display())))?;

    let mut frames = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let (len, tail) = rest
            .split_first_chunk::<4>()
            .ok_or_else(|| CaptureError::StorageError("truncated frame header".into()))?;
        let len = u32::from_le_bytes(*len) as usize;
        if tail.len() < len {
            return Err(CaptureError::StorageError("truncated frame".into()));
        }
        rest = &tail[len..];
        frames += 1;
    }
    Ok(frames)
}

/// What the synthetic sensor produces for one capture.
#[derive(Debug, Clone, Copy)]
struct FrameSpec {
    width: u32,
    height: u32,
    position: DevicePosition,
    settings: ConnectionSettings,
}

impl FrameSpec {
    fn new(preset: SessionPreset, position: DevicePosition, settings: ConnectionSettings) -> Self {
        let (width, height) = match preset {
            SessionPreset::Photo => (96, 72),
            SessionPreset::High => (64, 48),
            SessionPreset::Medium => (48, 36),
            SessionPreset::Low => (32, 24),
        };
        Self {
            width,
            height,
            position,
            settings,
        }
    }

    /// Render frame `index` in sensor space, then apply the connection's
    /// orientation and mirroring. The sensor is mounted landscape-right.
    fn render(&self, index: u32) -> DynamicImage {
        let blue = if self.position.is_front() { 200 } else { 40 };
        let shift = index.wrapping_mul(8);
        let sensor = RgbImage::from_fn(self.width, self.height, |x, y| {
            let r = (x * 255 / self.width.max(1)).wrapping_add(shift) as u8;
            let g = (y * 255 / self.height.max(1)) as u8;
            Rgb([r, g, blue])
        });
        let image = DynamicImage::ImageRgb8(sensor);

        let image = match self.settings.orientation {
            Some(VideoOrientation::Portrait) => image.rotate90(),
            Some(VideoOrientation::PortraitUpsideDown) => image.rotate270(),
            Some(VideoOrientation::LandscapeLeft) => image.rotate180(),
            Some(VideoOrientation::LandscapeRight) | None => image,
        };
        if self.settings.mirrored {
            image.fliph()
        } else {
            image
        }
    }
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(|e| format!("failed to encode {:?}: {}", format, e))?;
    Ok(bytes)
}
