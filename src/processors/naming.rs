//! Output file naming.
//!
//! Names are composed as `{prefix}{stem}{suffix}{_NNNN}.{ext}`:
//! - `stem` is the source file stem, dropped when `keep_original_name` is off
//! - `_NNNN` is the run counter, zero-padded to four digits, only when
//!   sequential numbering is on
//! - `ext` comes from the target format, or the lower-cased source extension
//!   when the source format is kept
//!
//! A [`FilenameGenerator`] lives for exactly one run. It owns the counter and
//! remembers every path it handed out, so two sources can never be written to
//! the same output path; a clash gets a `-1`, `-2`, ... disambiguator.

use crate::core::{NamingOptions, OutputFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct FilenameGenerator {
    options: NamingOptions,
    next_index: u32,
    used: HashSet<String>,
}

impl FilenameGenerator {
    pub fn new(options: NamingOptions) -> Self {
        Self {
            next_index: options.start_index,
            options,
            used: HashSet::new(),
        }
    }

    /// Counter value the next sequential name will use.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Pure composition of a file name from its parts.
    pub fn compose(&self, stem: &str, extension: &str, index: Option<u32>) -> String {
        format!("{}.{}", self.compose_stem(stem, index), extension)
    }

    fn compose_stem(&self, stem: &str, index: Option<u32>) -> String {
        let mut name = String::with_capacity(stem.len() + 32);
        name.push_str(&self.options.prefix);
        if self.options.keep_original_name {
            name.push_str(stem);
        }
        name.push_str(&self.options.suffix);
        if let Some(index) = index {
            name.push_str(&format!("_{:04}", index));
        }
        name
    }

    /// Names the output for `source` inside `dir` and advances the counter
    /// when numbering is enabled.
    pub fn generate(
        &mut self,
        dir: &Path,
        source: &Path,
        format: Option<OutputFormat>,
    ) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let extension = match format {
            Some(format) => format.extension().to_string(),
            None => source
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "jpg".to_string()),
        };

        let index = if self.options.sequential {
            let index = self.next_index;
            // Clashes past the ceiling fall back to `-N` disambiguation.
            self.next_index = self.next_index.saturating_add(1);
            Some(index)
        } else {
            None
        };

        let mut path = dir.join(self.compose(&stem, &extension, index));
        let mut disambiguator = 1u32;
        while !self.used.insert(collision_key(&path)) {
            let base = self.compose_stem(&stem, index);
            path = dir.join(format!("{}-{}.{}", base, disambiguator, extension));
            disambiguator += 1;
        }

        if disambiguator > 1 {
            log::debug!(
                "Output name for {} clashed within this run, using {}",
                source.display(),
                path.display()
            );
        }

        path
    }
}

/// File systems we target may be case-insensitive.
fn collision_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
