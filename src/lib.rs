mod cli;
mod core;
mod processors;
mod utils;

pub use crate::cli::{Algorithm, BatchArgs, Cli, Commands, Format, Mode};
pub use crate::core::geometry::{
    self, fill_dimensions, fit_dimensions, Dimensions, Insets, Padding, Rect, ResizeMode,
    TargetSize, TransformPlan,
};
pub use crate::core::processor::{ImageProcessor, Transformed};
pub use crate::core::report::{BatchReport, FileOutcome, FileStatus};
pub use crate::core::{
    validate_config, ErrorKind, JobConfig, NamingOptions, OutputFormat, OverwritePolicy,
    ResizeAlgorithm, ResizeError, Result, Stage, StageError, DEFAULT_MAX_DIMENSION,
    DEFAULT_QUALITY, WHITE,
};
pub use crate::processors::{
    BatchProcessor, Compressor, DecodedImage, ExifBlob, FilenameGenerator, Loader,
    MetadataProcessor, Resizer,
};
pub use crate::utils::presets::{quality_preset, size_preset, QUALITY_PRESETS, SIZE_PRESETS};
pub use crate::utils::{format_file_size, is_supported_format, parse_color, SUPPORTED_EXTENSIONS};

pub mod prelude {
    pub use crate::{
        BatchProcessor, BatchReport, FilenameGenerator, ImageProcessor, JobConfig, ResizeMode,
        TargetSize,
    };
}

// Re-export commonly used types
pub use image::{DynamicImage, Rgba};
