use crate::core::processor::ImageProcessor;
use crate::core::report::{BatchReport, FileOutcome};
use crate::core::{JobConfig, OverwritePolicy, ResizeError, Result, Stage, StageError};
use crate::processors::naming::FilenameGenerator;
use crate::utils::{format_file_size, is_supported_format};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use walkdir::WalkDir;

const PROBE_FILE: &str = ".bulk-resizer-write-probe";

pub struct BatchProcessor {
    config: JobConfig,
    thread_pool: Option<rayon::ThreadPool>,
    show_progress: bool,
    cancel: Arc<AtomicBool>,
}

/// A file found by the walk, before any validation.
struct Discovered {
    path: PathBuf,
    relative: PathBuf,
    /// Set when the walk already knows the file cannot be processed.
    rejected: Option<String>,
}

/// A validated, named file waiting to be transformed.
struct Candidate {
    source: PathBuf,
    output: PathBuf,
    original_bytes: u64,
}

enum Work {
    Resolved(FileOutcome),
    Pending(Candidate),
}

impl BatchProcessor {
    /// Builds a processor for one job. `max_threads == 0` uses rayon's global pool.
    pub fn new(config: JobConfig, max_threads: usize) -> Result<Self> {
        config.validate()?;

        let mut processor = Self {
            config,
            thread_pool: None,
            show_progress: true,
            cancel: Arc::new(AtomicBool::new(false)),
        };

        // Initialize thread pool once
        if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    ResizeError::Validation(format!("Failed to create thread pool: {}", e))
                })?;
            processor.thread_pool = Some(pool);
        }

        Ok(processor)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Setting the flag stops the batch once in-flight files are done.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn process_directory(&self, input_dir: &Path) -> Result<BatchReport> {
        let started = Instant::now();
        let output_dir = self.config.output_dir_for(input_dir);

        self.validate_paths(input_dir, &output_dir)?;

        fs::create_dir_all(&output_dir)?;
        ensure_writable(&output_dir)?;

        let discovered = self.discover(input_dir, &output_dir)?;

        if discovered.is_empty() {
            log::warn!("No files found in {}", input_dir.display());
            return Ok(BatchReport::finalize(Vec::new(), started.elapsed(), None));
        }

        log::info!(
            "Processing {} files from {} into {}",
            discovered.len(),
            input_dir.display(),
            output_dir.display()
        );

        let work = self.prepare(discovered, &output_dir);
        let pb = self.create_progress_bar(work.len());
        let (outcomes, aborted) = self.execute(work, &output_dir, &pb);
        let report = BatchReport::finalize(outcomes, started.elapsed(), aborted);

        pb.finish_with_message(format!(
            "Processed {} images ({:.1}% size reduction)",
            report.succeeded(),
            report.size_change_percent().max(0.0)
        ));

        log::info!(
            "Batch finished: {} succeeded, {} skipped, {} failed in {:.2?}",
            report.succeeded(),
            report.skipped(),
            report.failed(),
            report.elapsed
        );

        Ok(report)
    }

    /// Runs the prepared work on the pool. Outcomes keep the order of `work`;
    /// the second value is why the run stopped early, if it did.
    fn execute(
        &self,
        work: Vec<Work>,
        output_dir: &Path,
        pb: &ProgressBar,
    ) -> (Vec<FileOutcome>, Option<String>) {
        let processor = ImageProcessor::new(self.config.clone());
        let aborted: OnceLock<String> = OnceLock::new();

        let run = |item: Work| -> FileOutcome {
            match item {
                Work::Resolved(outcome) => outcome,
                Work::Pending(candidate) => {
                    if let Some(reason) = self.stop_reason(&aborted) {
                        return FileOutcome::skipped(
                            candidate.source,
                            Some(candidate.output),
                            format!("not attempted: {}", reason),
                        );
                    }
                    self.process_candidate(&processor, candidate, output_dir, &aborted)
                }
            }
        };

        let outcomes: Vec<FileOutcome> = if let Some(pool) = &self.thread_pool {
            pool.install(|| {
                work.into_par_iter()
                    .progress_with(pb.clone())
                    .map(&run)
                    .collect()
            })
        } else {
            work.into_par_iter()
                .progress_with(pb.clone())
                .map(&run)
                .collect()
        };

        let aborted = aborted.into_inner().or_else(|| {
            self.cancel
                .load(Ordering::SeqCst)
                .then(|| "cancelled by operator".to_string())
        });
        (outcomes, aborted)
    }

    fn stop_reason(&self, aborted: &OnceLock<String>) -> Option<String> {
        if let Some(reason) = aborted.get() {
            return Some(format!("batch aborted, {}", reason));
        }
        if self.cancel.load(Ordering::SeqCst) {
            return Some("batch cancelled".to_string());
        }
        None
    }

    /// Walks the input folder, never descending into the output folder.
    /// Entries come back sorted by their path relative to `input_dir`.
    fn discover(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<Discovered>> {
        let walker = WalkDir::new(input_dir).follow_links(true);
        let walker = if self.config.recursive {
            walker
        } else {
            walker.max_depth(1)
        };
        let excluded = fs::canonicalize(output_dir)?;

        let mut found = Vec::new();
        let entries = walker.min_depth(1).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && fs::canonicalize(entry.path()).map_or(false, |p| p == excluded))
        });

        for entry in entries {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {}
                Ok(entry) => {
                    let rejected = (!entry.file_type().is_file())
                        .then(|| "not a regular file".to_string());
                    let path = entry.into_path();
                    found.push(Discovered {
                        relative: relative_to(&path, input_dir),
                        path,
                        rejected,
                    });
                }
                Err(err) => match err.path() {
                    Some(path) if path != input_dir => {
                        let path = path.to_path_buf();
                        found.push(Discovered {
                            relative: relative_to(&path, input_dir),
                            path,
                            rejected: Some(format!("unreadable: {}", err)),
                        });
                    }
                    _ => return Err(ResizeError::Io(io::Error::other(err.to_string()))),
                },
            }
        }

        found.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(found)
    }

    /// Validates each discovered file and hands out output names in discovery
    /// order, so numbering never depends on worker scheduling.
    fn prepare(&self, discovered: Vec<Discovered>, output_dir: &Path) -> Vec<Work> {
        let mut names = FilenameGenerator::new(self.config.naming.clone());

        discovered
            .into_iter()
            .map(|entry| {
                let original_bytes = match validate_candidate(&entry) {
                    Ok(size) => size,
                    Err(reason) => {
                        log::debug!("Skipping {}: {}", entry.path.display(), reason);
                        return Work::Resolved(FileOutcome::skipped(entry.path, None, reason));
                    }
                };

                let dir = match entry.relative.parent() {
                    Some(parent) if self.config.recursive => output_dir.join(parent),
                    _ => output_dir.to_path_buf(),
                };
                let output = names.generate(&dir, &entry.path, self.config.output_format);

                if self.config.overwrite == OverwritePolicy::Skip && output.exists() {
                    log::info!(
                        "Skipping {} ({} already exists)",
                        entry.path.display(),
                        output.display()
                    );
                    return Work::Resolved(FileOutcome::skipped(
                        entry.path,
                        Some(output),
                        "output already exists",
                    ));
                }

                Work::Pending(Candidate {
                    source: entry.path,
                    output,
                    original_bytes,
                })
            })
            .collect()
    }

    fn process_candidate(
        &self,
        processor: &ImageProcessor,
        candidate: Candidate,
        output_root: &Path,
        aborted: &OnceLock<String>,
    ) -> FileOutcome {
        let Candidate {
            source,
            output,
            original_bytes,
        } = candidate;
        log::debug!("Processing {}", source.display());

        let result = fs::read(&source)
            .map_err(|e| StageError::at(Stage::Decoding)(ResizeError::Io(e)))
            .and_then(|bytes| processor.transform(&bytes));

        let transformed = match result {
            Ok(transformed) => transformed,
            Err(StageError { stage, error }) => {
                log::warn!("Failed {} while {}: {}", source.display(), stage, error);
                return FileOutcome::failed(source, Some(output), original_bytes, stage, &error);
            }
        };

        match write_output(&output, &transformed.bytes, self.config.overwrite) {
            Ok(()) => {
                let output_bytes = transformed.bytes.len() as u64;
                log::info!(
                    "{}: {} -> {} ({} -> {})",
                    source.display(),
                    transformed.source_dimensions,
                    transformed.output_dimensions,
                    format_file_size(original_bytes),
                    format_file_size(output_bytes)
                );
                FileOutcome::success(
                    source,
                    output,
                    original_bytes,
                    output_bytes,
                    transformed.source_dimensions,
                    transformed.output_dimensions,
                )
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && output.is_file() => {
                log::info!(
                    "Skipping {} ({} appeared meanwhile)",
                    source.display(),
                    output.display()
                );
                FileOutcome::skipped(source, Some(output), "output already exists")
            }
            Err(e) => {
                // Only a folder that stopped accepting writes stops the whole run.
                if let Err(probe) = ensure_writable(output_root) {
                    let reason = format!(
                        "output folder {} is not writable: {}",
                        output_root.display(),
                        probe
                    );
                    if aborted.set(reason.clone()).is_ok() {
                        log::error!("Aborting batch: {}", reason);
                    }
                }
                let error = ResizeError::Io(e);
                log::warn!("Failed {} while writing: {}", source.display(), error);
                FileOutcome::failed(source, Some(output), original_bytes, Stage::Writing, &error)
            }
        }
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.exists() {
            return Err(ResizeError::Validation(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if !input_dir.is_dir() {
            return Err(ResizeError::Validation(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        fs::read_dir(input_dir)?;

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ResizeError::Validation(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        // Prevent processing the same directory as output
        let same = match (fs::canonicalize(input_dir), fs::canonicalize(output_dir)) {
            (Ok(a), Ok(b)) => a == b,
            _ => input_dir == output_dir,
        };
        if same {
            return Err(ResizeError::Validation(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Discovery-time checks. Returns the file size, or why the file is skipped.
fn validate_candidate(entry: &Discovered) -> std::result::Result<u64, String> {
    if let Some(reason) = &entry.rejected {
        return Err(reason.clone());
    }

    if !is_supported_format(&entry.path) {
        return Err("not a supported image extension".to_string());
    }

    let metadata = fs::metadata(&entry.path).map_err(|e| format!("unreadable: {}", e))?;
    if metadata.len() == 0 {
        return Err("empty file".to_string());
    }

    Ok(metadata.len())
}

/// Creates and removes a marker file to prove the folder accepts writes.
fn ensure_writable(dir: &Path) -> io::Result<()> {
    let probe = dir.join(format!("{}-{}", PROBE_FILE, std::process::id()));
    OpenOptions::new().write(true).create(true).truncate(true).open(&probe)?;
    fs::remove_file(&probe)
}

/// Writes one output file. The handle is closed on every path and a partial
/// file is removed when the write fails.
fn write_output(path: &Path, bytes: &[u8], policy: OverwritePolicy) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    match policy {
        OverwritePolicy::Skip => options.create_new(true),
        OverwritePolicy::Overwrite => options.create(true).truncate(true),
    };

    let file = options.open(path)?;
    let mut writer = BufWriter::new(file);
    let result = writer.write_all(bytes).and_then(|()| writer.flush());
    drop(writer);

    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::FileStatus;
    use tempfile::TempDir;

    #[test]
    fn write_output_respects_skip_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.jpg");

        write_output(&path, b"first", OverwritePolicy::Skip).unwrap();
        let err = write_output(&path, b"second", OverwritePolicy::Skip).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).unwrap(), b"first");

        write_output(&path, b"third", OverwritePolicy::Overwrite).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"third");
    }

    #[test]
    fn probe_leaves_no_file_behind() {
        let dir = TempDir::new().unwrap();
        ensure_writable(dir.path()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn discovery_validation_reasons() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.png");
        let text = dir.path().join("notes.txt");
        fs::write(&empty, b"").unwrap();
        fs::write(&text, b"hello").unwrap();

        let entry = |path: &Path| Discovered {
            path: path.to_path_buf(),
            relative: relative_to(path, dir.path()),
            rejected: None,
        };

        assert_eq!(validate_candidate(&entry(&empty)), Err("empty file".to_string()));
        assert!(validate_candidate(&entry(&text)).is_err());
    }

    #[test]
    fn unwritable_output_folder_aborts_remaining_files() {
        let input = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let out_dir = parent.path().join("out");
        for name in ["a.png", "b.png", "c.png"] {
            image::RgbImage::new(8, 8).save(input.path().join(name)).unwrap();
        }

        let config = JobConfig {
            target: crate::core::geometry::TargetSize::exact(4, 4),
            output_folder: Some(out_dir.clone()),
            optimize_png: false,
            ..Default::default()
        };
        let processor = BatchProcessor::new(config, 1).unwrap().with_progress(false);
        fs::create_dir_all(&out_dir).unwrap();
        let discovered = processor.discover(input.path(), &out_dir).unwrap();
        let work = processor.prepare(discovered, &out_dir);

        // The folder turns into a plain file once the run is planned.
        fs::remove_dir(&out_dir).unwrap();
        fs::write(&out_dir, b"not a folder").unwrap();
        let (outcomes, aborted) = processor.execute(work, &out_dir, &ProgressBar::hidden());

        assert!(aborted.is_some());
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, FileStatus::Failed);
        assert_eq!(outcomes[0].stage, Some(Stage::Writing));
        for outcome in &outcomes[1..] {
            assert_eq!(outcome.status, FileStatus::Skipped);
            assert!(outcome
                .reason
                .as_deref()
                .unwrap()
                .starts_with("not attempted: batch aborted"));
        }
    }

    #[test]
    fn failed_write_in_healthy_folder_does_not_abort() {
        let input = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for name in ["a.png", "b.png"] {
            image::RgbImage::new(8, 8).save(input.path().join(name)).unwrap();
        }

        let config = JobConfig {
            output_folder: Some(out.path().to_path_buf()),
            optimize_png: false,
            ..Default::default()
        };
        let processor = BatchProcessor::new(config, 1).unwrap().with_progress(false);
        let discovered = processor.discover(input.path(), out.path()).unwrap();
        let work = processor.prepare(discovered, out.path());

        // A directory squatting on the first output name blocks only that file.
        fs::create_dir(out.path().join("a.png")).unwrap();
        let (outcomes, aborted) = processor.execute(work, out.path(), &ProgressBar::hidden());

        assert!(aborted.is_none());
        assert_eq!(outcomes[0].status, FileStatus::Failed);
        assert_eq!(outcomes[1].status, FileStatus::Success);
    }

    #[test]
    fn same_input_and_output_is_rejected() {
        let dir = TempDir::new().unwrap();
        let processor = BatchProcessor::new(JobConfig::default(), 1).unwrap();
        let err = processor.validate_paths(dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err, ResizeError::Validation(_)));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = JobConfig {
            quality: 0,
            ..Default::default()
        };
        assert!(matches!(
            BatchProcessor::new(config, 0),
            Err(ResizeError::Validation(_))
        ));
    }
}
