use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Capture quality preset applied once when the camera is set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    #[default]
    High,
    Medium,
    Low,
    Photo,
}

/// Quality preset used when transcoding a finished recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreset {
    LowQuality,
    #[default]
    MediumQuality,
    HighestQuality,
}

/// Container format of exported movies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieFileType {
    #[default]
    QuickTime,
    Mpeg4,
}

impl MovieFileType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::QuickTime => "mov",
            Self::Mpeg4 => "mp4",
        }
    }
}

/// Configuration for a camera session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Capture preset (default: high).
    pub preset: SessionPreset,

    /// Directory for raw recordings and exports (default: the OS temp dir).
    pub temp_directory: PathBuf,

    /// File name prefix for `<prefix>_movie_<uuid>.mov` (default: "hsf").
    pub file_prefix: String,

    /// Compression of the zoom range on the front camera (default: 0.07).
    pub front_zoom_scale: f64,

    /// Export quality (default: medium).
    pub export_preset: ExportPreset,

    /// Export container (default: QuickTime).
    pub export_file_type: MovieFileType,

    /// Lay out exports for progressive network playback (default: true).
    pub optimize_for_network_use: bool,

    /// Write a JSON metadata sidecar next to each export (default: false).
    pub write_metadata: bool,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.file_prefix.is_empty() {
            return Err("file prefix must not be empty".into());
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(format!("file prefix contains a path separator: {}", self.file_prefix));
        }
        if !(self.front_zoom_scale > 0.0 && self.front_zoom_scale <= 1.0) {
            return Err(format!(
                "front zoom scale must be in (0, 1]: {}",
                self.front_zoom_scale
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid configuration: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            preset: SessionPreset::High,
            temp_directory: std::env::temp_dir(),
            file_prefix: "hsf".into(),
            front_zoom_scale: 0.07,
            export_preset: ExportPreset::MediumQuality,
            export_file_type: MovieFileType::QuickTime,
            optimize_for_network_use: true,
            write_metadata: false,
        }
    }
}
