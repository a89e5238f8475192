// bulk-resizer/src/processors/compressor.rs
use crate::core::{OutputFormat, ResizeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageError, ImageFormat};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;

pub struct Compressor {
    quality: u8,
    optimize_png: bool,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality,
            optimize_png: true,
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Encodes `image` into an in-memory file of the given format.
    ///
    /// Quality drives the JPEG and WebP encoders; WebP at quality 100 is
    /// written lossless. PNG, BMP and GIF are always lossless.
    /// The image must already be flattened when the format has no alpha.
    pub fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ResizeError::Encode(format!(
                "quality {} is outside 1-100",
                self.quality
            )));
        }

        let mut buffer = Cursor::new(Vec::new());

        let written = match format {
            OutputFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
                jpeg_compatible(image).write_with_encoder(encoder)
            }
            OutputFormat::Png => png_compatible(image).write_to(&mut buffer, ImageFormat::Png),
            OutputFormat::WebP if self.quality < 100 => {
                buffer
                    .get_mut()
                    .extend_from_slice(&lossy_webp(image, self.quality)?);
                Ok(())
            }
            OutputFormat::WebP => {
                let encoder = WebPEncoder::new_lossless(&mut buffer);
                eight_bit(image).write_with_encoder(encoder)
            }
            OutputFormat::Bmp => eight_bit(image).write_to(&mut buffer, ImageFormat::Bmp),
            OutputFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut buffer, ImageFormat::Gif),
        };
        written.map_err(|e| encode_error(format, e))?;

        let mut data = buffer.into_inner();

        if format == OutputFormat::Png && self.optimize_png {
            data = self.optimize_png_bytes(&data)?;
        }

        log::debug!(
            "Encoded {}x{} image as {} ({} bytes, quality {})",
            image.width(),
            image.height(),
            format,
            data.len(),
            self.quality
        );

        Ok(data)
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::default())
            .map_err(|e| ResizeError::Encode(format!("PNG optimization failed: {}", e)))
    }
}

fn encode_error(format: OutputFormat, err: ImageError) -> ResizeError {
    ResizeError::Encode(format!("{} encoder: {}", format, err))
}

fn lossy_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let image = eight_bit(image);
    let encoder = webp::Encoder::from_image(&image)
        .map_err(|e| ResizeError::Encode(format!("WebP encoder: {}", e)))?;
    Ok(encoder.encode(quality as f32).to_vec())
}

fn jpeg_compatible(image: &DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::Rgb8 => image.clone(),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

fn png_compatible(image: &DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb32F => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba32F => DynamicImage::ImageRgba16(image.to_rgba16()),
        _ => image.clone(),
    }
}

fn eight_bit(image: &DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => image.clone(),
        c if c.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use image::{Rgb, RgbImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([30, 120, 200])))
    }

    #[test]
    fn encodes_every_output_format() {
        let compressor = Compressor::new(80).with_png_optimization(false);
        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::WebP,
            OutputFormat::Bmp,
            OutputFormat::Gif,
        ] {
            let bytes = compressor.encode(&sample(), format).unwrap();
            assert_eq!(
                image::guess_format(&bytes).unwrap(),
                format.image_format(),
                "{} output",
                format
            );
        }
    }

    #[test]
    fn rejects_quality_out_of_range() {
        let err = Compressor::new(0).encode(&sample(), OutputFormat::Jpeg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        }))
    }

    #[test]
    fn webp_quality_changes_the_output() {
        let low = Compressor::new(10).encode(&gradient(), OutputFormat::WebP).unwrap();
        let high = Compressor::new(90).encode(&gradient(), OutputFormat::WebP).unwrap();

        assert_ne!(low, high);
        assert!(low.len() < high.len(), "q10={} q90={}", low.len(), high.len());
        for bytes in [&low, &high] {
            assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::WebP);
            let decoded = image::load_from_memory(bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (64, 64));
        }
    }

    #[test]
    fn webp_at_full_quality_is_lossless() {
        let bytes = Compressor::new(100).encode(&gradient(), OutputFormat::WebP).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, gradient().to_rgb8());
    }

    #[test]
    fn optimized_png_still_decodes() {
        let bytes = Compressor::new(85).encode(&sample(), OutputFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}
