//! Pure resize geometry.
//!
//! Everything here works on plain numbers: given the source size, the target
//! size and a [`ResizeMode`], [`plan`] decides how big the resampled image is
//! and which crop rectangle or padding insets turn it into the final output.
//! No pixels are touched.

use image::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Requested output size where either axis may be left on "auto".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn exact(width: u32, height: u32) -> Self {
        Self::new(Some(width), Some(height))
    }

    /// Resolves "auto" axes against the source aspect ratio.
    ///
    /// With neither axis given the source size is returned, which turns the
    /// job into a pure format conversion.
    pub fn resolve(&self, source: Dimensions) -> Dimensions {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Dimensions::new(w, h),
            (Some(w), None) => Dimensions::new(w, scale_axis(source.height, w, source.width)),
            (None, Some(h)) => Dimensions::new(scale_axis(source.width, h, source.height), h),
            (None, None) => source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Largest size that fits inside the target, aspect preserved.
    #[default]
    Fit,
    /// Cover the target, aspect preserved, centered crop of the excess.
    Fill,
    /// Exactly the target size, aspect ignored.
    Stretch,
    /// Fit, then border with a solid color up to the exact target size.
    Pad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Insets {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub color: Rgba<u8>,
    pub insets: Insets,
}

/// Resolved geometry for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPlan {
    pub resample: Dimensions,
    pub crop: Option<Rect>,
    pub padding: Option<Padding>,
}

impl TransformPlan {
    pub fn output_dimensions(&self) -> Dimensions {
        if let Some(crop) = self.crop {
            return Dimensions::new(crop.width, crop.height);
        }
        match self.padding {
            Some(p) => Dimensions::new(
                self.resample.width + p.insets.left + p.insets.right,
                self.resample.height + p.insets.top + p.insets.bottom,
            ),
            None => self.resample,
        }
    }

    pub fn is_noop(&self, source: Dimensions) -> bool {
        self.resample == source
            && self.crop.is_none()
            && self.padding.map_or(true, |p| p.insets == Insets::default())
    }
}

/// Computes the plan for resizing `source` to `target` under `mode`.
///
/// Both inputs must have positive axes. Rounding is half away from zero and
/// an odd leftover pixel always lands on the right/bottom edge.
pub fn plan(
    source: Dimensions,
    target: Dimensions,
    mode: ResizeMode,
    pad_color: Rgba<u8>,
) -> TransformPlan {
    debug_assert!(source.width > 0 && source.height > 0);
    debug_assert!(target.width > 0 && target.height > 0);

    match mode {
        ResizeMode::Fit => TransformPlan {
            resample: fit_dimensions(source, target),
            crop: None,
            padding: None,
        },
        ResizeMode::Fill => {
            let resample = fill_dimensions(source, target);
            let (x, _) = split_leftover(resample.width - target.width);
            let (y, _) = split_leftover(resample.height - target.height);
            TransformPlan {
                resample,
                crop: Some(Rect {
                    x,
                    y,
                    width: target.width,
                    height: target.height,
                }),
                padding: None,
            }
        }
        ResizeMode::Stretch => TransformPlan {
            resample: target,
            crop: None,
            padding: None,
        },
        ResizeMode::Pad => {
            let resample = fit_dimensions(source, target);
            let (left, right) = split_leftover(target.width - resample.width);
            let (top, bottom) = split_leftover(target.height - resample.height);
            TransformPlan {
                resample,
                crop: None,
                padding: Some(Padding {
                    color: pad_color,
                    insets: Insets {
                        top,
                        right,
                        bottom,
                        left,
                    },
                }),
            }
        }
    }
}

/// Scale so that the whole source fits inside the target.
pub fn fit_dimensions(source: Dimensions, target: Dimensions) -> Dimensions {
    // tw/sw <= th/sh  <=>  tw*sh <= th*sw: width is the limiting axis.
    let width_limited = target.width as u64 * source.height as u64
        <= target.height as u64 * source.width as u64;

    if width_limited {
        let h = scale_axis(source.height, target.width, source.width);
        Dimensions::new(target.width, h.min(target.height))
    } else {
        let w = scale_axis(source.width, target.height, source.height);
        Dimensions::new(w.min(target.width), target.height)
    }
}

/// Scale so that the source covers the whole target.
pub fn fill_dimensions(source: Dimensions, target: Dimensions) -> Dimensions {
    let width_limited = target.width as u64 * source.height as u64
        >= target.height as u64 * source.width as u64;

    if width_limited {
        let h = scale_axis(source.height, target.width, source.width);
        Dimensions::new(target.width, h.max(target.height))
    } else {
        let w = scale_axis(source.width, target.height, source.height);
        Dimensions::new(w.max(target.width), target.height)
    }
}

/// `value * numerator / denominator`, rounded half away from zero, at least 1.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = value as f64 * numerator as f64 / denominator as f64;
    (scaled.round() as u32).max(1)
}

/// Splits leftover pixels into (leading, trailing); trailing gets the odd one.
fn split_leftover(leftover: u32) -> (u32, u32) {
    let leading = leftover / 2;
    (leading, leftover - leading)
}
