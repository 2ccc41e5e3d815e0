//! # camera-capture-core
//!
//! Platform-agnostic camera capture core library.
//!
//! Provides session lifecycle, device configuration, photo and movie
//! capture, post-record export and orientation handling. Platform backends
//! implement the `DeviceProvider`, `CaptureBackend` and `MovieExporter`
//! traits and plug into the generic `CameraSession`.
//!
//! ## Architecture
//!
//! ```text
//! camera-capture-core (this crate)
//! ├── traits/       ← DeviceProvider, CaptureBackend, MovieExporter, SessionDelegate
//! ├── models/       ← CaptureError, CaptureState, RecordingState, SessionConfiguration, devices, photos
//! ├── processing/   ← orientation/focus/zoom mapping, photo decoding, ExportPipeline
//! ├── session/      ← CameraSession, SessionQueue, ConfigurationTransaction, ConfigurationLock
//! └── storage/      ← temp file naming, metadata sidecars
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{ExportPreset, MovieFileType, SessionConfiguration, SessionPreset};
pub use models::device::{
    AuthorizationStatus, CaptureDeviceHandle, DeviceCapabilities, DeviceInput, DeviceKind, DevicePosition,
    ExposureMode, FocusMode, OutputKind,
};
pub use models::error::CaptureError;
pub use models::orientation::{DeviceOrientation, ImageOrientation, Point, Size, VideoOrientation};
pub use models::photo::{CapturedPhoto, RawPhoto};
pub use models::recording_metadata::RecordingMetadata;
pub use models::state::{CaptureState, RecordingState};
pub use processing::export::ExportPipeline;
pub use session::camera_session::CameraSession;
pub use session::device_lock::ConfigurationLock;
pub use session::queue::{QueueHandle, SessionQueue};
pub use session::transaction::{ConfigurationTransaction, InputBinding};
pub use traits::capture_backend::{
    CaptureBackend, ConnectionInfo, ConnectionSettings, PhotoCallback, RecordingFinishedCallback,
};
pub use traits::device_provider::{AccessCallback, DeviceProvider};
pub use traits::movie_exporter::{ExportCallback, ExportRequest, MovieExporter};
pub use traits::session_delegate::SessionDelegate;
