use std::path::{Path, PathBuf};

use crate::models::config::SessionPreset;
use crate::models::device::{CaptureDeviceHandle, DeviceInput, OutputKind};
use crate::models::error::CaptureError;
use crate::models::orientation::VideoOrientation;
use crate::models::photo::RawPhoto;

/// Callback invoked exactly once per accepted photo request.
pub type PhotoCallback = Box<dyn FnOnce(Result<RawPhoto, CaptureError>) + Send + 'static>;

/// Callback invoked once the movie file is finalized, with the file location
/// and the error reported by the output, if any.
pub type RecordingFinishedCallback =
    Box<dyn FnOnce(PathBuf, Option<CaptureError>) + Send + 'static>;

/// What an output's video connection supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub supports_orientation: bool,
    pub supports_mirroring: bool,
}

/// Per-capture connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionSettings {
    /// `None` leaves the connection's orientation untouched.
    pub orientation: Option<VideoOrientation>,
    pub mirrored: bool,
}

/// Interface for the platform capture session and its photo/movie outputs.
///
/// Implementations are internally synchronized. The core guarantees that
/// structural calls (inputs, outputs, preset, start/stop) are made from a
/// single worker thread and always between `begin_configuration` and
/// `commit_configuration` where they mutate inputs or outputs. Completion
/// callbacks may be invoked on any thread, including the calling one.
pub trait CaptureBackend: Send + Sync {
    fn begin_configuration(&self);

    fn commit_configuration(&self);

    fn set_preset(&self, preset: SessionPreset);

    /// Build an input for `device`. Fails if the device is busy or gone.
    fn make_input(&self, device: &CaptureDeviceHandle) -> Result<DeviceInput, CaptureError>;

    fn can_add_input(&self, input: &DeviceInput) -> bool;

    fn add_input(&self, input: &DeviceInput);

    /// Remove `input`. Does nothing if it is not attached.
    fn remove_input(&self, input: &DeviceInput);

    fn can_add_output(&self, output: OutputKind) -> bool;

    fn add_output(&self, output: OutputKind);

    fn has_output(&self, output: OutputKind) -> bool;

    /// Start the session. Blocks until running or failed.
    fn start_running(&self) -> Result<(), CaptureError>;

    /// Stop the session. Blocks until stopped.
    fn stop_running(&self);

    fn is_running(&self) -> bool;

    /// The video connection of `output`, if the output is attached and
    /// has a video input feeding it.
    fn video_connection(&self, output: OutputKind) -> Option<ConnectionInfo>;

    /// Issue one still-capture request on the photo output.
    fn capture_photo(&self, settings: ConnectionSettings, completion: PhotoCallback);

    /// Start recording to `path` on the movie output.
    fn start_recording(
        &self,
        path: &Path,
        settings: ConnectionSettings,
        finished: RecordingFinishedCallback,
    ) -> Result<(), CaptureError>;

    /// Ask the movie output to finalize the current file.
    fn stop_recording(&self);

    fn is_recording(&self) -> bool;
}
