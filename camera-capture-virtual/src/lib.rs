//! # camera-capture-virtual
//!
//! In-process virtual backend for camera-capture-kit.
//!
//! Provides:
//! - `VirtualDeviceProvider` — simulated cameras and microphone with authorization and per-device settings
//! - `VirtualCaptureSession` — capture graph with a synthetic sensor, JPEG stills and a frame-container movie recorder
//! - `CopyExporter` — movie export by copying on a background thread
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use camera_capture_core::{CameraSession, SessionConfiguration};
//! use camera_capture_virtual::{CopyExporter, VirtualCaptureSession, VirtualDeviceProvider};
//!
//! let session = CameraSession::new(
//!     Arc::new(VirtualDeviceProvider::new()),
//!     Arc::new(VirtualCaptureSession::new()),
//!     Arc::new(CopyExporter::new()),
//!     SessionConfiguration::default(),
//! )?;
//! session.prepare();
//! session.start();
//! ```

pub mod devices;
pub mod exporter;
pub mod session;

pub use devices::{DeviceSettings, VirtualDeviceProvider};
pub use exporter::CopyExporter;
pub use session::{count_movie_frames, VirtualCaptureSession, MOVIE_MAGIC};
