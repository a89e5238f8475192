// bulk-resizer/src/cli.rs
use crate::core::geometry::ResizeMode;
use crate::core::{OutputFormat, OverwritePolicy, ResizeAlgorithm, DEFAULT_MAX_DIMENSION};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bulk-resizer")]
#[command(about = "Resize, crop, pad and convert whole folders of images", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every image in a folder
    Batch(BatchArgs),

    /// List the named size and quality presets
    Presets,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input folder
    pub input: PathBuf,

    /// Output folder (defaults to <INPUT>/resized)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target width in pixels (omit to derive it from the height)
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Target height in pixels (omit to derive it from the width)
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Named target size, see `presets`
    #[arg(short, long, conflicts_with_all = ["width", "height"])]
    pub preset: Option<String>,

    /// How the image is fitted into the target box
    #[arg(short, long, value_enum, default_value = "fit")]
    pub mode: Mode,

    /// Output format (defaults to each file's own format)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Encoder quality (1-100) or a quality preset name
    #[arg(short, long, default_value = "85")]
    pub quality: String,

    /// Text put in front of every output name
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Text put after every output name
    #[arg(long, default_value = "")]
    pub suffix: String,

    /// Append a running number to each output name
    #[arg(long)]
    pub sequential: bool,

    /// First number used by --sequential
    #[arg(long, default_value = "1")]
    pub start_index: u32,

    /// Leave the original file name out of output names
    #[arg(long)]
    pub drop_name: bool,

    /// Include sub-folders, mirroring them in the output folder
    #[arg(short, long)]
    pub recursive: bool,

    /// Replace outputs that already exist instead of skipping them
    #[arg(long)]
    pub overwrite: bool,

    /// Do not carry EXIF metadata into the outputs
    #[arg(long)]
    pub strip_metadata: bool,

    /// Padding color for pad mode (#RRGGBB, #RRGGBBAA or a name)
    #[arg(long, default_value = "white")]
    pub pad_color: String,

    /// Background used when flattening transparency for JPEG
    #[arg(long, default_value = "white")]
    pub background: String,

    /// Resampling algorithm
    #[arg(short, long, value_enum, default_value = "lanczos3")]
    pub algorithm: Algorithm,

    /// Reject sources wider or taller than this many pixels
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
    pub max_dimension: u32,

    /// Skip the lossless PNG optimization pass
    #[arg(long)]
    pub no_optimize: bool,

    /// Number of worker threads (0 = one per core)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Fit,
    Fill,
    Stretch,
    Pad,
}

impl From<Mode> for ResizeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Fit => ResizeMode::Fit,
            Mode::Fill => ResizeMode::Fill,
            Mode::Stretch => ResizeMode::Stretch,
            Mode::Pad => ResizeMode::Pad,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[value(alias = "jpeg")]
    Jpg,
    Png,
    Webp,
    Bmp,
    Gif,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Jpg => OutputFormat::Jpeg,
            Format::Png => OutputFormat::Png,
            Format::Webp => OutputFormat::WebP,
            Format::Bmp => OutputFormat::Bmp,
            Format::Gif => OutputFormat::Gif,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(alg: Algorithm) -> Self {
        match alg {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

impl BatchArgs {
    pub fn overwrite_policy(&self) -> OverwritePolicy {
        if self.overwrite {
            OverwritePolicy::Overwrite
        } else {
            OverwritePolicy::Skip
        }
    }
}
