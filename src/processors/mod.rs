// bulk-resizer/src/processors/mod.rs
mod batch;
mod compressor;
mod loader;
mod metadata;
mod naming;
mod resizer;

pub use batch::BatchProcessor;
pub use compressor::Compressor;
pub use loader::{DecodedImage, Loader};
pub use metadata::{ExifBlob, MetadataProcessor};
pub use naming::FilenameGenerator;
pub use resizer::Resizer;
