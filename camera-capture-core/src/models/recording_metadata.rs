use std::path::Path;

use serde::{Deserialize, Serialize};

use super::device::DevicePosition;
use super::orientation::VideoOrientation;

/// Metadata stored alongside an exported recording.
///
/// Serializable for the JSON sidecar written next to the movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub source_path: String,
    pub file_path: String,
    pub checksum: String,
    pub camera_position: DevicePosition,
    pub mirrored: bool,
    pub orientation: Option<VideoOrientation>,
}

impl RecordingMetadata {
    pub fn new(
        source_path: &Path,
        file_path: &Path,
        checksum: &str,
        camera_position: DevicePosition,
        mirrored: bool,
        orientation: Option<VideoOrientation>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source_path: source_path.to_string_lossy().to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            checksum: checksum.to_string(),
            camera_position,
            mirrored,
            orientation,
        }
    }
}
