// file: src/pipeline/processor.rs
// description: drives one file from read through dispatch, guard, gate and import
// reference: parses documents, validates records, and hands them to the store

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::EntityCounts;
use crate::pipeline::dispatch::ParserDispatch;
use crate::pipeline::gate::{GateDecision, ValidationGate};
use crate::pipeline::guard::{ExistenceCheck, ExistenceGuard};
use crate::pipeline::log_buffer::LogBuffer;
use crate::pipeline::result::{FileOutcome, FileProcessingResult};
use crate::source::{CandidateFile, DocumentReader, FsDocumentReader};
use crate::store::BrokerStore;
use crate::utils::Validator;
use crate::validator::RecordValidator;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Read failures worth another attempt; everything else fails the file.
pub fn is_retryable(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

#[derive(Debug, Default)]
struct BrokerTally {
    imported: usize,
    skipped: usize,
    rejected: usize,
    import_failed: usize,
    raised: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    stats: EntityCounts,
}

impl BrokerTally {
    /// Precedence when one file holds several brokers:
    /// imported, then errored, then rejected, then skipped.
    fn outcome(&self) -> FileOutcome {
        if self.imported > 0 {
            FileOutcome::Imported
        } else if self.raised || self.import_failed > 0 {
            FileOutcome::Errored
        } else if self.rejected > 0 {
            FileOutcome::Rejected
        } else {
            FileOutcome::Skipped
        }
    }
}

pub struct FileProcessor {
    dispatch: ParserDispatch,
    validator: Arc<dyn RecordValidator>,
    store: Arc<dyn BrokerStore>,
    reader: Arc<dyn DocumentReader>,
    guard: ExistenceGuard,
    gate: ValidationGate,
    max_retries: u32,
    retry_delay: Duration,
}

impl FileProcessor {
    pub fn new(
        config: &PipelineConfig,
        dispatch: ParserDispatch,
        validator: Arc<dyn RecordValidator>,
        store: Arc<dyn BrokerStore>,
    ) -> Self {
        Self {
            dispatch,
            validator,
            store,
            reader: Arc::new(FsDocumentReader),
            guard: ExistenceGuard::new(config.skip_existing),
            gate: ValidationGate::new(config.validation_strict),
            max_retries: config.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Always yields exactly one result; errors are recorded, never raised.
    pub async fn process(&self, file: &CandidateFile, log: &mut LogBuffer) -> FileProcessingResult {
        let label = file.file_name();
        log.debug(format!("Processing {}", file.path.display()));

        let records = match self.load_records(file, log).await {
            Ok(records) => records,
            Err(e) => {
                let message = format!("{}: {}", label, e);
                log.error(message.clone());
                return FileProcessingResult::aborted(file.path.clone(), message, Vec::new());
            }
        };

        let mut tally = BrokerTally::default();
        for (index, record) in records.iter().enumerate() {
            let broker = record
                .display_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("broker #{}", index + 1));

            match self.guard.check(self.store.as_ref(), record.display_name()).await {
                ExistenceCheck::Found => {
                    let message = format!("{}: {} already exists, skipping", label, broker);
                    log.warn(message.clone());
                    tally.warnings.push(message);
                    tally.skipped += 1;
                    continue;
                }
                ExistenceCheck::CheckFailed(reason) => {
                    log.warn(format!(
                        "{}: existence check for {} failed, importing anyway: {}",
                        label, broker, reason
                    ));
                }
                ExistenceCheck::NotFound => {}
            }

            let prefix = |message: &String| format!("{} [{}]: {}", label, broker, message);

            match self.gate.decide(self.validator.validate(record)) {
                GateDecision::Reject { errors, warnings } => {
                    log.warn(format!("{}: {} rejected by validation", label, broker));
                    tally.errors.extend(errors.iter().map(prefix));
                    tally.warnings.extend(warnings.iter().map(prefix));
                    tally.rejected += 1;
                    continue;
                }
                GateDecision::Accept { warnings } => {
                    tally.warnings.extend(warnings.iter().map(prefix));
                }
            }

            match self.store.import(record).await {
                Ok(report) if report.success => {
                    log.info(format!("{}: imported {}", label, broker));
                    tally.imported += 1;
                    tally.stats += report.stats;
                }
                Ok(report) => {
                    log.error(format!("{}: import of {} failed", label, broker));
                    if report.errors.is_empty() {
                        tally.errors.push(prefix(&"import failed".to_string()));
                    } else {
                        tally.errors.extend(report.errors.iter().map(prefix));
                    }
                    tally.import_failed += 1;
                }
                Err(e) => {
                    let message = prefix(&e.to_string());
                    log.error(message.clone());
                    tally.errors.push(message);
                    tally.raised = true;
                }
            }
        }

        let outcome = tally.outcome();
        FileProcessingResult {
            path: file.path.clone(),
            outcome,
            success: outcome == FileOutcome::Imported,
            errors: tally.errors,
            warnings: tally.warnings,
            stats: tally.stats,
            imported_brokers: tally.imported,
            aborted: outcome == FileOutcome::Errored && tally.raised,
        }
    }

    async fn load_records(
        &self,
        file: &CandidateFile,
        log: &mut LogBuffer,
    ) -> Result<Vec<crate::models::NormalizedBrokerRecord>> {
        let content = self.read_with_retry(&file.path, log).await?;
        Validator::validate_content_not_empty(&content)?;

        let records = self.dispatch.dispatch(file, &content)?;
        if records.is_empty() {
            return Err(PipelineError::ScriptExtract {
                file: file.file_name(),
                message: "bundle contains no brokers".to_string(),
            });
        }

        if records.len() > 1 {
            log.debug(format!("{} holds {} brokers", file.file_name(), records.len()));
        }
        Ok(records)
    }

    async fn read_with_retry(&self, path: &Path, log: &mut LogBuffer) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.reader.read(path).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    log.warn(format!(
                        "Read of {} failed ({}), retry {}/{}",
                        path.display(),
                        e,
                        attempt,
                        self.max_retries
                    ));
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(source) => {
                    return Err(PipelineError::FileOperation {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedBrokerRecord;
    use crate::pipeline::log_buffer::LogLevel;
    use crate::pipeline::result::BatchTotals;
    use crate::store::{ImportReport, JsonBrokerStore, StoreSummary};
    use crate::validator::BrokerValidator;
    use async_trait::async_trait;
    use std::fs as std_fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct FailingStore;

    #[async_trait]
    impl BrokerStore for FailingStore {
        async fn exists(&self, _name: &str) -> Result<bool> {
            Err(PipelineError::Store("lookup unavailable".into()))
        }

        async fn import(&self, _record: &NormalizedBrokerRecord) -> Result<ImportReport> {
            Err(PipelineError::Store("write refused".into()))
        }

        async fn summary(&self) -> Result<StoreSummary> {
            Ok(StoreSummary::default())
        }
    }

    fn processor(config: &PipelineConfig, store: Arc<dyn BrokerStore>) -> FileProcessor {
        FileProcessor::new(
            config,
            ParserDispatch::default(),
            Arc::new(BrokerValidator::new()),
            store,
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> CandidateFile {
        let path = dir.path().join(name);
        std_fs::write(&path, content).unwrap();
        CandidateFile::new(path)
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(is_retryable(&std::io::Error::from(ErrorKind::Interrupted)));
        assert!(is_retryable(&std::io::Error::from(ErrorKind::TimedOut)));
        assert!(!is_retryable(&std::io::Error::from(ErrorKind::NotFound)));
        assert!(!is_retryable(&std::io::Error::from(ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_missing_file_is_errored_and_aborted() {
        let config = PipelineConfig::default();
        let processor = processor(&config, Arc::new(JsonBrokerStore::in_memory()));
        let mut log = LogBuffer::new(true);

        let file = CandidateFile::new(PathBuf::from("/nonexistent/xm-review.html"));
        let result = processor.process(&file, &mut log).await;

        assert_eq!(result.outcome, FileOutcome::Errored);
        assert!(result.aborted);
        assert_eq!(result.errors.len(), 1);
        assert!(!log.is_empty());
    }

    #[tokio::test]
    async fn test_store_lookup_failure_fails_open_then_import_error() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "xm-review.html", "<html><body><h1>XM</h1></body></html>");
        let config = PipelineConfig::default();
        let processor = processor(&config, Arc::new(FailingStore));
        let mut log = LogBuffer::new(true);

        let result = processor.process(&file, &mut log).await;

        assert!(log.lines().iter().any(|l| l.contains("existence check for XM failed")));
        assert_eq!(result.outcome, FileOutcome::Errored);
        assert!(result.errors[0].contains("write refused"));
    }

    #[tokio::test]
    async fn test_import_report_failure_is_errored_but_processed() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "bundle.js", r#"var brokers = [{features: ["x"]}];"#);
        let config = PipelineConfig {
            validation_strict: false,
            ..PipelineConfig::default()
        };
        let processor = processor(&config, Arc::new(JsonBrokerStore::in_memory()));
        let mut log = LogBuffer::new(false);

        let result = processor.process(&file, &mut log).await;

        assert_eq!(result.outcome, FileOutcome::Errored);
        assert!(!result.aborted);
        assert!(result.warnings.iter().any(|w| w.contains("missing name")));
        assert!(result.errors.iter().any(|e| e.contains("without a name")));
    }

    struct FlakyReader {
        failures: u32,
        kind: ErrorKind,
        calls: AtomicU32,
    }

    impl FlakyReader {
        fn new(failures: u32, kind: ErrorKind) -> Arc<Self> {
            Arc::new(Self {
                failures,
                kind,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentReader for FlakyReader {
        async fn read(&self, _path: &Path) -> std::io::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(std::io::Error::from(self.kind))
            } else {
                Ok("<html><body><h1>XM Review</h1></body></html>".to_string())
            }
        }
    }

    fn flaky_processor(max_retries: u32, reader: Arc<FlakyReader>) -> FileProcessor {
        let config = PipelineConfig {
            max_retries,
            ..PipelineConfig::default()
        };
        processor(&config, Arc::new(JsonBrokerStore::in_memory()))
            .with_reader(reader)
            .with_retry_delay(Duration::ZERO)
    }

    fn virtual_page() -> CandidateFile {
        CandidateFile::new(PathBuf::from("/scraped/xm-review.html"))
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let reader = FlakyReader::new(2, ErrorKind::Interrupted);
        let processor = flaky_processor(2, reader.clone());
        let mut log = LogBuffer::new(true);

        let result = processor.process(&virtual_page(), &mut log).await;

        assert_eq!(reader.calls(), 3);
        assert_eq!(result.outcome, FileOutcome::Imported);
        assert_eq!(result.imported_brokers, 1);
        assert!(log.lines().iter().any(|l| l.contains("retry 2/2")));
    }

    #[tokio::test]
    async fn test_zero_retries_fails_on_first_transient_error() {
        let reader = FlakyReader::new(1, ErrorKind::TimedOut);
        let processor = flaky_processor(0, reader.clone());

        let result = processor
            .process(&virtual_page(), &mut LogBuffer::new(false))
            .await;

        assert_eq!(reader.calls(), 1);
        assert_eq!(result.outcome, FileOutcome::Errored);
        assert!(result.aborted);
        assert!(result.errors[0].contains("File operation failed"));
    }

    #[tokio::test]
    async fn test_permanent_read_failure_is_not_retried() {
        let reader = FlakyReader::new(1, ErrorKind::PermissionDenied);
        let processor = flaky_processor(3, reader.clone());

        let result = processor
            .process(&virtual_page(), &mut LogBuffer::new(false))
            .await;

        assert_eq!(reader.calls(), 1);
        assert_eq!(result.outcome, FileOutcome::Errored);
    }

    #[tokio::test]
    async fn test_rejected_beats_skipped_within_one_bundle() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "bundle.js",
            r#"var brokers = [{name: "Gamma Trade", platforms: ["MT4"]}, {features: ["Copy trading"]}];"#,
        );
        let store = Arc::new(JsonBrokerStore::in_memory());
        store
            .import(&NormalizedBrokerRecord::named("Gamma Trade"))
            .await
            .unwrap();
        let config = PipelineConfig {
            validation_strict: true,
            skip_existing: true,
            ..PipelineConfig::default()
        };
        let processor = processor(&config, store);
        let mut log = LogBuffer::new(true);

        let result = processor.process(&file, &mut log).await;

        assert_eq!(result.outcome, FileOutcome::Rejected);
        assert!(!result.aborted);
        assert!(result.warnings.iter().any(|w| w.contains("Gamma Trade already exists")));
        assert!(result.errors.iter().any(|e| e.contains("missing name")));
        assert!(log
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Warn && e.message.contains("already exists")));

        let mut totals = BatchTotals::new();
        totals.record(result);
        assert_eq!(totals.failed_files, 1);
        assert_eq!(totals.skipped_files, 0);
        assert_eq!(totals.processed_files, 1);
        assert_eq!(totals.imported_brokers, 0);
    }

    #[tokio::test]
    async fn test_empty_file_is_errored() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "empty-review.html", "  \n");
        let config = PipelineConfig::default();
        let processor = processor(&config, Arc::new(JsonBrokerStore::in_memory()));

        let result = processor.process(&file, &mut LogBuffer::new(false)).await;
        assert_eq!(result.outcome, FileOutcome::Errored);
        assert!(result.errors[0].contains("Content is empty"));
    }
}
