// bulk-resizer/src/core/mod.rs
pub mod geometry;
pub mod processor;
pub mod report;

use geometry::{ResizeMode, TargetSize};
use image::{ImageFormat, Rgba};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted target or source axis, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 10_000;
pub const DEFAULT_QUALITY: u8 = 85;
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Highest accepted first counter value for sequential names.
pub const MAX_START_INDEX: u32 = 1_000_000_000;

const INVALID_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Gif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
        }
    }

    /// Maps a decoded source format onto an encoder we can write, if any.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    /// Whether the container has a slot for a raw EXIF payload.
    pub fn supports_exif(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Png | OutputFormat::WebP)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::WebP => "WebP",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Gif => "GIF",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Leave existing outputs alone and report the file as skipped.
    #[default]
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    pub prefix: String,
    pub suffix: String,
    pub keep_original_name: bool,
    pub sequential: bool,
    pub start_index: u32,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            keep_original_name: true,
            sequential: false,
            start_index: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub target: TargetSize,
    pub mode: ResizeMode,
    /// `None` keeps each file's source format.
    pub output_format: Option<OutputFormat>,
    pub quality: u8,
    /// `None` writes into a `resized` folder inside the input folder.
    pub output_folder: Option<PathBuf>,
    pub naming: NamingOptions,
    pub recursive: bool,
    pub overwrite: OverwritePolicy,
    pub preserve_metadata: bool,
    pub pad_color: Rgba<u8>,
    /// Canvas used when flattening transparency for opaque-only formats.
    pub background: Rgba<u8>,
    pub algorithm: ResizeAlgorithm,
    pub max_dimension: u32,
    pub optimize_png: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            target: TargetSize::default(),
            mode: ResizeMode::Fit,
            output_format: None,
            quality: DEFAULT_QUALITY,
            output_folder: None,
            naming: NamingOptions::default(),
            recursive: false,
            overwrite: OverwritePolicy::Skip,
            preserve_metadata: true,
            pad_color: WHITE,
            background: WHITE,
            algorithm: ResizeAlgorithm::Lanczos3,
            max_dimension: DEFAULT_MAX_DIMENSION,
            optimize_png: true,
        }
    }
}

impl JobConfig {
    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [("width", self.target.width), ("height", self.target.height)] {
            match value {
                Some(0) => {
                    return Err(ResizeError::Validation(format!(
                        "Target {} must be positive",
                        axis
                    )))
                }
                Some(v) if v > self.max_dimension => {
                    return Err(ResizeError::Validation(format!(
                        "Target {} {} exceeds the {} pixel limit",
                        axis, v, self.max_dimension
                    )))
                }
                _ => {}
            }
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(ResizeError::Validation(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if self.max_dimension == 0 {
            return Err(ResizeError::Validation(
                "Maximum source dimension must be positive".to_string(),
            ));
        }

        let naming = &self.naming;
        if naming.start_index > MAX_START_INDEX {
            return Err(ResizeError::Validation(format!(
                "Start index must be at most {}",
                MAX_START_INDEX
            )));
        }

        for (label, value) in [("prefix", &naming.prefix), ("suffix", &naming.suffix)] {
            if value.contains(INVALID_NAME_CHARS) {
                return Err(ResizeError::Validation(format!(
                    "Filename {} contains invalid characters: {:?}",
                    label, value
                )));
            }
        }

        if !naming.keep_original_name
            && !naming.sequential
            && naming.prefix.is_empty()
            && naming.suffix.is_empty()
        {
            return Err(ResizeError::Validation(
                "Output names would be empty: keep the original name, enable numbering, or set a prefix/suffix"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn output_dir_for(&self, input_dir: &Path) -> PathBuf {
        match &self.output_folder {
            Some(folder) => folder.clone(),
            None => input_dir.join("resized"),
        }
    }
}

pub fn validate_config(config: &JobConfig) -> Result<()> {
    config.validate()
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResizeError::Validation(_) => ErrorKind::Validation,
            ResizeError::Decode(_) => ErrorKind::Decode,
            ResizeError::Encode(_) => ErrorKind::Encode,
            ResizeError::UnsupportedConversion(_) => ErrorKind::UnsupportedConversion,
            ResizeError::ResourceLimit(_) => ErrorKind::ResourceLimit,
            ResizeError::Io(_) => ErrorKind::Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    Encode,
    UnsupportedConversion,
    ResourceLimit,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Encode => "EncodeError",
            ErrorKind::UnsupportedConversion => "UnsupportedConversionError",
            ErrorKind::ResourceLimit => "ResourceLimitError",
            ErrorKind::Io => "IOError",
        };
        f.write_str(name)
    }
}

/// Where a single file was in its processing when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Decoding,
    Planning,
    Transforming,
    Encoding,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovered => "discovery",
            Stage::Decoding => "decoding",
            Stage::Planning => "planning",
            Stage::Transforming => "transforming",
            Stage::Encoding => "encoding",
            Stage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// A per-file error tagged with the stage it came from.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: ResizeError,
}

impl StageError {
    pub fn at(stage: Stage) -> impl FnOnce(ResizeError) -> StageError {
        move |error| StageError { stage, error }
    }
}

pub type Result<T> = std::result::Result<T, ResizeError>;
