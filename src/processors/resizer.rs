// bulk-resizer/src/processors/resizer.rs
use crate::core::geometry::{Dimensions, Insets, Rect, TransformPlan};
use crate::core::ResizeAlgorithm;
use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};

/// Pixel-level primitives that carry out a [`TransformPlan`].
pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Resample, then crop, then pad, in that order.
    pub fn apply(&self, image: &DynamicImage, plan: &TransformPlan) -> DynamicImage {
        let mut out = self.resample(image, plan.resample);

        if let Some(rect) = plan.crop {
            out = self.crop(&out, rect);
        }

        if let Some(padding) = plan.padding {
            if padding.insets != Insets::default() {
                out = self.composite_on_canvas(&out, padding.color, padding.insets);
            }
        }

        out
    }

    pub fn resample(&self, image: &DynamicImage, size: Dimensions) -> DynamicImage {
        if size.width == image.width() && size.height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resample");
            return image.clone();
        }

        log::debug!(
            "Resampling image from {}x{} to {} ({:?})",
            image.width(),
            image.height(),
            size,
            self.algorithm
        );

        image.resize_exact(size.width, size.height, self.filter_type())
    }

    pub fn crop(&self, image: &DynamicImage, rect: Rect) -> DynamicImage {
        let whole = rect.width == image.width() && rect.height == image.height();
        if whole && rect.x == 0 && rect.y == 0 {
            return image.clone();
        }
        image.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }

    /// Places `image` on a solid canvas, offset by the leading insets.
    pub fn composite_on_canvas(
        &self,
        image: &DynamicImage,
        color: Rgba<u8>,
        insets: Insets,
    ) -> DynamicImage {
        let width = image.width() + insets.left + insets.right;
        let height = image.height() + insets.top + insets.bottom;

        let mut canvas = RgbaImage::from_pixel(width, height, color);
        imageops::overlay(
            &mut canvas,
            &image.to_rgba8(),
            insets.left as i64,
            insets.top as i64,
        );

        let canvas = DynamicImage::ImageRgba8(canvas);
        if image.color().has_alpha() || color[3] < u8::MAX {
            canvas
        } else {
            DynamicImage::ImageRgb8(canvas.to_rgb8())
        }
    }

    /// Blends any transparency onto an opaque background.
    pub fn flatten_alpha(&self, image: &DynamicImage, background: Rgba<u8>) -> DynamicImage {
        if !image.color().has_alpha() {
            return image.clone();
        }

        let mut canvas = RgbaImage::from_pixel(
            image.width(),
            image.height(),
            Rgba([background[0], background[1], background[2], u8::MAX]),
        );
        imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);

        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::Lanczos3)
    }
}
