//! Pure mappings between device space, view space and capture space.

use crate::models::device::DevicePosition;
use crate::models::orientation::{DeviceOrientation, ImageOrientation, Point, Size, VideoOrientation};

/// Map the reported device orientation to a capture connection orientation.
///
/// The sensor is mounted rotated relative to the screen, so landscape-right
/// maps to landscape-left, and every unlisted orientation (landscape-left,
/// face up/down, unknown) falls back to landscape-right.
pub fn capture_orientation(orientation: DeviceOrientation) -> VideoOrientation {
    match orientation {
        DeviceOrientation::Portrait => VideoOrientation::Portrait,
        DeviceOrientation::LandscapeRight => VideoOrientation::LandscapeLeft,
        DeviceOrientation::PortraitUpsideDown => VideoOrientation::PortraitUpsideDown,
        _ => VideoOrientation::LandscapeRight,
    }
}

/// Convert a touch in view space to a normalized device point of interest.
///
/// Axes are swapped and `y` inverted: `(ty / h, 1 - tx / w)`.
/// Returns `None` for an empty view.
pub fn focus_point(touch: Point, view: Size) -> Option<Point> {
    if view.width <= 0.0 || view.height <= 0.0 {
        return None;
    }
    Some(Point::new(touch.y / view.height, 1.0 - touch.x / view.width))
}

/// Absolute zoom factor for a normalized zoom `percent`.
///
/// `percent` is clamped to [0, 1]. The front camera's range is compressed
/// by `front_scale`.
pub fn zoom_factor(percent: f64, position: DevicePosition, max_zoom: f64, front_scale: f64) -> f64 {
    let mut percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
    if position.is_front() {
        percent *= front_scale;
    }
    let max_scale = max_zoom.max(1.0) - 1.0;
    percent * max_scale + 1.0
}

/// Display orientation for a photo taken with a camera at `position`.
///
/// Front-camera previews are mirrored but the sensor output is not.
pub fn photo_orientation(position: DevicePosition) -> ImageOrientation {
    if position.is_front() {
        ImageOrientation::LeftMirrored
    } else {
        ImageOrientation::Up
    }
}

/// Whether recordings from a camera at `position` are mirrored.
pub fn mirrors_video(position: DevicePosition) -> bool {
    position.is_front()
}
