// bulk-resizer/src/core/report.rs
use super::geometry::Dimensions;
use super::{ErrorKind, ResizeError, Stage};
use crate::utils::format_file_size;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Success,
    Skipped,
    Failed,
}

/// Result of one source file. Built once, never changed afterwards.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub status: FileStatus,
    pub reason: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub stage: Option<Stage>,
    pub original_bytes: u64,
    pub output_bytes: u64,
    pub source_dimensions: Option<Dimensions>,
    pub output_dimensions: Option<Dimensions>,
}

impl FileOutcome {
    pub fn success(
        source: PathBuf,
        output: PathBuf,
        original_bytes: u64,
        output_bytes: u64,
        source_dimensions: Dimensions,
        output_dimensions: Dimensions,
    ) -> Self {
        Self {
            source,
            output: Some(output),
            status: FileStatus::Success,
            reason: None,
            error_kind: None,
            stage: None,
            original_bytes,
            output_bytes,
            source_dimensions: Some(source_dimensions),
            output_dimensions: Some(output_dimensions),
        }
    }

    pub fn skipped(source: PathBuf, output: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source,
            output,
            status: FileStatus::Skipped,
            reason: Some(reason.into()),
            error_kind: None,
            stage: None,
            original_bytes: 0,
            output_bytes: 0,
            source_dimensions: None,
            output_dimensions: None,
        }
    }

    pub fn failed(
        source: PathBuf,
        output: Option<PathBuf>,
        original_bytes: u64,
        stage: Stage,
        error: &ResizeError,
    ) -> Self {
        Self {
            source,
            output,
            status: FileStatus::Failed,
            reason: Some(error.to_string()),
            error_kind: Some(error.kind()),
            stage: Some(stage),
            original_bytes,
            output_bytes: 0,
            source_dimensions: None,
            output_dimensions: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Aggregate record of one run, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub total_original_bytes: u64,
    pub total_output_bytes: u64,
    pub elapsed: Duration,
    /// Set when the run stopped before every file was attempted.
    pub aborted: Option<String>,
}

impl BatchReport {
    /// Folds outcomes into totals. Only successful files count towards sizes.
    pub fn finalize(
        outcomes: Vec<FileOutcome>,
        elapsed: Duration,
        aborted: Option<String>,
    ) -> Self {
        let (before, after) = outcomes
            .iter()
            .filter(|o| o.is_success())
            .fold((0u64, 0u64), |(b, a), o| (b + o.original_bytes, a + o.output_bytes));

        Self {
            outcomes,
            total_original_bytes: before,
            total_output_bytes: after,
            elapsed,
            aborted,
        }
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(FileStatus::Success)
    }

    pub fn skipped(&self) -> usize {
        self.count(FileStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status == FileStatus::Failed)
    }

    /// Percentage saved across successful files; negative when outputs grew.
    pub fn size_change_percent(&self) -> f64 {
        if self.total_original_bytes == 0 {
            return 0.0;
        }
        (self.total_original_bytes as f64 - self.total_output_bytes as f64)
            / self.total_original_bytes as f64
            * 100.0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Processed: {}", self.succeeded())?;
        writeln!(f, "Skipped:   {}", self.skipped())?;
        writeln!(f, "Failed:    {}", self.failed())?;
        writeln!(
            f,
            "Size:      {} -> {} ({:.1}% saved)",
            format_file_size(self.total_original_bytes),
            format_file_size(self.total_output_bytes),
            self.size_change_percent()
        )?;
        writeln!(f, "Elapsed:   {:.2?}", self.elapsed)?;

        if let Some(reason) = &self.aborted {
            writeln!(f, "\nBatch aborted: {}", reason)?;
        }

        if self.failed() > 0 {
            writeln!(f, "\nErrors:")?;
            for outcome in self.failures() {
                let stage = outcome.stage.map(|s| s.to_string()).unwrap_or_default();
                writeln!(
                    f,
                    "  - {} [{}]: {}",
                    outcome.source.display(),
                    stage,
                    outcome.reason.as_deref().unwrap_or("unknown error")
                )?;
            }
        }

        write!(f, "{}", rule)
    }
}
