use std::path::PathBuf;

use crate::models::config::{ExportPreset, MovieFileType};
use crate::models::error::CaptureError;

/// Callback invoked exactly once when an export finishes.
pub type ExportCallback = Box<dyn FnOnce(Result<PathBuf, CaptureError>) + Send + 'static>;

/// A single transcode of a finished recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub preset: ExportPreset,
    pub file_type: MovieFileType,
    pub optimize_for_network_use: bool,
}

/// Platform transcoder for recorded movies.
pub trait MovieExporter: Send + Sync {
    /// Transcode `request.source` into `request.destination` asynchronously.
    ///
    /// `completion` receives the written destination, or an error if no
    /// usable output was produced.
    fn export(&self, request: ExportRequest, completion: ExportCallback);
}
