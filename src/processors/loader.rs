// bulk-resizer/src/processors/loader.rs
use crate::core::geometry::Dimensions;
use crate::core::{ResizeError, Result, DEFAULT_MAX_DIMENSION};
use image::error::ImageError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// A decoded image plus the container format it was read from.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }
}

#[derive(Clone)]
pub struct Loader {
    max_dimension: u32,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Decodes raw file bytes.
    ///
    /// The header is read first so oversized images are rejected before any
    /// pixel buffer is allocated.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let format = image::guess_format(bytes)
            .map_err(|_| ResizeError::Decode("unrecognized image data".to_string()))?;

        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(map_image_error)?;

        self.check_dimensions(width, height)?;

        let image = ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(map_image_error)?;

        if image.width() == 0 || image.height() == 0 {
            return Err(ResizeError::Decode("image has a zero-sized axis".to_string()));
        }

        log::debug!(
            "Decoded {:?} image: {}x{} pixels, color: {:?}",
            format,
            image.width(),
            image.height(),
            image.color()
        );

        Ok(DecodedImage { image, format })
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(ResizeError::ResourceLimit(format!(
                "Image dimensions {}x{} exceed maximum {}px per axis",
                width, height, self.max_dimension
            )));
        }
        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn map_image_error(err: ImageError) -> ResizeError {
    match err {
        ImageError::Limits(e) => ResizeError::ResourceLimit(e.to_string()),
        ImageError::IoError(e) => ResizeError::Decode(format!("truncated or unreadable data: {}", e)),
        other => ResizeError::Decode(other.to_string()),
    }
}
