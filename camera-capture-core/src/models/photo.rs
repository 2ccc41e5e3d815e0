use image::DynamicImage;

use super::orientation::ImageOrientation;

/// Encoded still image as delivered by the photo output.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPhoto {
    /// Encoded image bytes (JPEG or PNG).
    pub data: Vec<u8>,
    /// Pixel density of the image (1.0 = one pixel per point).
    pub scale: f64,
}

/// A decoded photo with the orientation it should be displayed in.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub image: DynamicImage,
    pub scale: f64,
    pub orientation: ImageOrientation,
}

impl CapturedPhoto {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Render the display orientation into the pixel data.
    ///
    /// `LeftMirrored` is a transpose: rotate a quarter turn clockwise, then
    /// mirror horizontally.
    pub fn oriented(&self) -> DynamicImage {
        match self.orientation {
            ImageOrientation::Up => self.image.clone(),
            ImageOrientation::LeftMirrored => self.image.rotate90().fliph(),
        }
    }
}
