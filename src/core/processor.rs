// bulk-resizer/src/core/processor.rs
use super::geometry::{self, Dimensions, TransformPlan};
use super::{JobConfig, OutputFormat, ResizeError, Stage, StageError};
use crate::processors::{Compressor, ExifBlob, Loader, MetadataProcessor, Resizer};

/// An encoded output file, ready to be written.
#[derive(Debug)]
pub struct Transformed {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub plan: TransformPlan,
    pub source_dimensions: Dimensions,
    pub output_dimensions: Dimensions,
    pub kept_metadata: bool,
}

/// Runs one source file through decode, plan, transform and encode.
pub struct ImageProcessor {
    config: JobConfig,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
    metadata_processor: MetadataProcessor,
}

impl ImageProcessor {
    pub fn new(config: JobConfig) -> Self {
        let loader = Loader::new().with_max_dimension(config.max_dimension);
        let resizer = Resizer::new(config.algorithm);
        let compressor =
            Compressor::new(config.quality).with_png_optimization(config.optimize_png);

        Self {
            config,
            loader,
            resizer,
            compressor,
            metadata_processor: MetadataProcessor::new(),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Transforms raw source bytes into encoded output bytes.
    ///
    /// Errors carry the stage they happened in so the caller can report it.
    pub fn transform(&self, bytes: &[u8]) -> Result<Transformed, StageError> {
        let decoded = self.loader.decode(bytes).map_err(StageError::at(Stage::Decoding))?;
        let source = decoded.dimensions();

        let (format, plan, exif) = self
            .plan(bytes, decoded.format, source)
            .map_err(StageError::at(Stage::Planning))?;

        let mut image = self.resizer.apply(&decoded.image, &plan);
        drop(decoded);
        if !format.supports_alpha() && image.color().has_alpha() {
            log::debug!("Flattening transparency for {} output", format);
            image = self.resizer.flatten_alpha(&image, self.config.background);
        }
        let output_dimensions = Dimensions::new(image.width(), image.height());

        let mut encoded = self
            .compressor
            .encode(&image, format)
            .map_err(StageError::at(Stage::Encoding))?;

        let kept_metadata = exif.is_some();
        if let Some(exif) = exif {
            encoded = self
                .metadata_processor
                .embed_exif(encoded, format, &exif)
                .map_err(StageError::at(Stage::Encoding))?;
        }

        Ok(Transformed {
            bytes: encoded,
            format,
            plan,
            source_dimensions: source,
            output_dimensions,
            kept_metadata,
        })
    }

    /// Picks the output format, builds the geometry plan and decides whether
    /// metadata travels along.
    fn plan(
        &self,
        bytes: &[u8],
        source_format: image::ImageFormat,
        source: Dimensions,
    ) -> Result<(OutputFormat, TransformPlan, Option<ExifBlob>), ResizeError> {
        let format = match self.config.output_format {
            Some(format) => format,
            None => OutputFormat::from_image_format(source_format).ok_or_else(|| {
                ResizeError::UnsupportedConversion(format!(
                    "no encoder for {:?} sources, choose an output format",
                    source_format
                ))
            })?,
        };

        let target = self.config.target.resolve(source);
        let plan = geometry::plan(source, target, self.config.mode, self.config.pad_color);

        // Nothing larger than the configured limit is ever allocated.
        let limit = self.config.max_dimension;
        for (what, dims) in [
            ("target", target),
            ("resample", plan.resample),
            ("output", plan.output_dimensions()),
        ] {
            if dims.width > limit || dims.height > limit {
                return Err(ResizeError::ResourceLimit(format!(
                    "{} size {} for {} source exceeds {}px per axis",
                    what, dims, source, limit
                )));
            }
        }

        let exif = if self.config.preserve_metadata {
            self.metadata_processor.extract_exif(bytes, source_format)
        } else {
            None
        };

        if exif.is_some() && !format.supports_exif() {
            return Err(ResizeError::UnsupportedConversion(format!(
                "source EXIF cannot be kept in {} output (use --strip-metadata or JPEG/PNG/WebP)",
                format
            )));
        }

        log::debug!(
            "Planned {} -> {} ({:?}): resample {}, crop {:?}, padding {:?}",
            source,
            plan.output_dimensions(),
            self.config.mode,
            plan.resample,
            plan.crop,
            plan.padding.map(|p| p.insets)
        );

        Ok((format, plan, exif))
    }
}
