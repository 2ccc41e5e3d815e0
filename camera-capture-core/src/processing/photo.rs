use crate::models::error::CaptureError;
use crate::models::orientation::ImageOrientation;
use crate::models::photo::{CapturedPhoto, RawPhoto};

/// Decode the bytes delivered by the photo output.
///
/// The format is sniffed from the data. Pixels are left as captured;
/// `orientation` only records how the photo should be displayed.
pub fn decode_photo(raw: &RawPhoto, orientation: ImageOrientation) -> Result<CapturedPhoto, CaptureError> {
    if raw.data.is_empty() {
        return Err(CaptureError::PhotoCaptureFailed("no image data".into()));
    }
    let image = image::load_from_memory(&raw.data)
        .map_err(|e| CaptureError::PhotoCaptureFailed(format!("failed to decode photo: {}", e)))?;

    Ok(CapturedPhoto {
        image,
        scale: raw.scale,
        orientation,
    })
}
