// bulk-resizer/src/processors/metadata.rs
use crate::core::{OutputFormat, ResizeError, Result};
use image::ImageFormat;
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::ImageEXIF;

/// Raw EXIF payload lifted from a source container. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifBlob(Vec<u8>);

impl ExifBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Copies the EXIF segment out of `bytes`, if the container has one.
    pub fn extract_exif(&self, bytes: &[u8], format: ImageFormat) -> Option<ExifBlob> {
        let exif = match format {
            ImageFormat::Jpeg => Jpeg::from_bytes(bytes.to_vec().into()).ok()?.exif(),
            ImageFormat::Png => Png::from_bytes(bytes.to_vec().into()).ok()?.exif(),
            ImageFormat::WebP => WebP::from_bytes(bytes.to_vec().into()).ok()?.exif(),
            _ => None,
        }?;

        if exif.is_empty() {
            return None;
        }

        log::debug!("Found {} bytes of EXIF data in {:?} source", exif.len(), format);
        Some(ExifBlob::new(exif.to_vec()))
    }

    /// Writes `exif` verbatim into an already encoded file.
    pub fn embed_exif(
        &self,
        encoded: Vec<u8>,
        format: OutputFormat,
        exif: &ExifBlob,
    ) -> Result<Vec<u8>> {
        let payload = Some(exif.as_bytes().to_vec().into());
        let mut output = Vec::with_capacity(encoded.len() + exif.len() + 16);

        let written = match format {
            OutputFormat::Jpeg => {
                let mut jpeg =
                    Jpeg::from_bytes(encoded.into()).map_err(container_error(format))?;
                jpeg.set_exif(payload);
                jpeg.encoder().write_to(&mut output)
            }
            OutputFormat::Png => {
                let mut png =
                    Png::from_bytes(encoded.into()).map_err(container_error(format))?;
                png.set_exif(payload);
                png.encoder().write_to(&mut output)
            }
            OutputFormat::WebP => {
                let mut webp =
                    WebP::from_bytes(encoded.into()).map_err(container_error(format))?;
                webp.set_exif(payload);
                webp.encoder().write_to(&mut output)
            }
            OutputFormat::Bmp | OutputFormat::Gif => {
                return Err(ResizeError::UnsupportedConversion(format!(
                    "{} output cannot carry EXIF metadata",
                    format
                )))
            }
        };
        written?;

        Ok(output)
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn container_error(format: OutputFormat) -> impl FnOnce(img_parts::Error) -> ResizeError {
    move |e| ResizeError::Encode(format!("could not reopen {} output for metadata: {}", format, e))
}
