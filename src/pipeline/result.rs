// file: src/pipeline/result.rs
// description: per-file outcomes and their fold into batch and pipeline totals

use crate::models::EntityCounts;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal state of one discovered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
    Imported,
    Skipped,
    Rejected,
    Errored,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Rejected | FileOutcome::Errored)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProcessingResult {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: EntityCounts,
    pub imported_brokers: usize,
    /// Processing stopped on a raised error (read, classify, parse or
    /// store failure) instead of running to completion.
    pub aborted: bool,
}

impl FileProcessingResult {
    pub fn aborted(path: PathBuf, error: String, warnings: Vec<String>) -> Self {
        Self {
            path,
            outcome: FileOutcome::Errored,
            success: false,
            errors: vec![error],
            warnings,
            stats: EntityCounts::default(),
            imported_brokers: 0,
            aborted: true,
        }
    }

    pub fn is_processed(&self) -> bool {
        !self.aborted
    }
}

/// Running totals for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub files: usize,
    pub processed_files: usize,
    pub imported_brokers: usize,
    pub failed_files: usize,
    pub skipped_files: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: EntityCounts,
}

impl BatchTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: FileProcessingResult) {
        self.files += 1;
        if result.is_processed() {
            self.processed_files += 1;
        }
        if result.outcome.is_failure() {
            self.failed_files += 1;
        }
        if result.outcome == FileOutcome::Skipped {
            self.skipped_files += 1;
        }
        self.imported_brokers += result.imported_brokers;
        self.stats += result.stats;
        self.errors.extend(result.errors);
        self.warnings.extend(result.warnings);
    }
}

/// Terminal artifact of a run. Starts zeroed, absorbs each batch, and is
/// frozen by `finalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    pub discovered_files: usize,
    pub processed_files: usize,
    pub imported_brokers: usize,
    pub failed_files: usize,
    pub skipped_files: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: EntityCounts,
    pub processing_time: u64,
}

impl PipelineResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, batch: BatchTotals) {
        self.processed_files += batch.processed_files;
        self.imported_brokers += batch.imported_brokers;
        self.failed_files += batch.failed_files;
        self.skipped_files += batch.skipped_files;
        self.stats += batch.stats;
        self.errors.extend(batch.errors);
        self.warnings.extend(batch.warnings);
    }

    /// A run succeeds only if it imported something.
    pub fn finalize(&mut self, elapsed: Duration) {
        self.processing_time = elapsed.as_millis() as u64;
        self.success = self.imported_brokers > 0;
    }

    pub fn success_rate(&self) -> f64 {
        if self.discovered_files == 0 {
            return 0.0;
        }
        let succeeded = self.discovered_files.saturating_sub(self.failed_files);
        (succeeded as f64 / self.discovered_files as f64) * 100.0
    }

    pub fn files_per_second(&self) -> f64 {
        if self.processing_time == 0 {
            return 0.0;
        }
        self.processed_files as f64 / (self.processing_time as f64 / 1000.0)
    }
}
