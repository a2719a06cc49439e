// file: src/pipeline/orchestrator.rs
// description: coordinates discovery, batching, per-file processing and final flush
// reference: orchestrates the sequential import workflow

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::parser::{
    BrokerPageParser, BrokerScriptExtractor, HtmlReviewParser, ScriptLiteralExtractor,
};
use crate::pipeline::batcher::partition;
use crate::pipeline::context::{PipelineRun, RunContext};
use crate::pipeline::dispatch::ParserDispatch;
use crate::pipeline::processor::FileProcessor;
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::result::BatchTotals;
use crate::source::{CandidateFile, Discovery, DocumentReader, FileLocator, FsDocumentReader};
use crate::store::BrokerStore;
use crate::validator::{BrokerValidator, RecordValidator};
use std::sync::Arc;
use std::time::Duration;

/// Discovery output split into the batches a run would process.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub discovery: Discovery,
    pub batches: Vec<Vec<CandidateFile>>,
}

pub struct ImportPipeline {
    config: PipelineConfig,
    store: Arc<dyn BrokerStore>,
    html_parser: Arc<dyn BrokerPageParser>,
    script_extractor: Arc<dyn BrokerScriptExtractor>,
    validator: Arc<dyn RecordValidator>,
    reader: Arc<dyn DocumentReader>,
    retry_delay: Option<Duration>,
    show_progress: bool,
    colored: bool,
}

impl ImportPipeline {
    pub fn new(config: PipelineConfig, store: Arc<dyn BrokerStore>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            store,
            html_parser: Arc::new(HtmlReviewParser::new()),
            script_extractor: Arc::new(ScriptLiteralExtractor::new()),
            validator: Arc::new(BrokerValidator::new()),
            reader: Arc::new(FsDocumentReader),
            retry_delay: None,
            show_progress: false,
            colored: true,
        })
    }

    pub fn with_html_parser(mut self, parser: Arc<dyn BrokerPageParser>) -> Self {
        self.html_parser = parser;
        self
    }

    pub fn with_script_extractor(mut self, extractor: Arc<dyn BrokerScriptExtractor>) -> Self {
        self.script_extractor = extractor;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn RecordValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }

    pub fn with_progress(mut self, show_progress: bool, colored: bool) -> Self {
        self.show_progress = show_progress;
        self.colored = colored;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn discover(&self) -> Discovery {
        FileLocator::new(&self.config).locate()
    }

    pub fn plan(&self) -> ImportPlan {
        let discovery = self.discover();
        let batches = partition(&discovery.files, self.config.batch_size);
        ImportPlan { discovery, batches }
    }

    /// Runs one import end to end. Never fails: file-level problems land in
    /// the result's errors and warnings, and anything that escapes the batch
    /// loop is recorded as a pipeline error with `success: false`.
    pub async fn run(&self) -> PipelineRun {
        let mut ctx = RunContext::new(self.config.enable_logging);

        if let Err(e) = self.execute(&mut ctx).await {
            ctx.fail(format!("Pipeline failed: {}", e));
        }

        let fatal = ctx.is_fatal();
        let mut run = ctx.finish();
        let result = &run.result;
        let summary = format!(
            "Import finished in {}ms: {} discovered, {} processed, {} brokers imported, {} failed, {} skipped",
            result.processing_time,
            result.discovered_files,
            result.processed_files,
            result.imported_brokers,
            result.failed_files,
            result.skipped_files
        );
        if fatal || !result.success {
            run.log.warn(summary);
        } else {
            run.log.info(summary);
        }

        run
    }

    fn processor(&self) -> FileProcessor {
        let dispatch = ParserDispatch::new(self.html_parser.clone(), self.script_extractor.clone());
        let processor = FileProcessor::new(
            &self.config,
            dispatch,
            self.validator.clone(),
            self.store.clone(),
        )
        .with_reader(self.reader.clone());

        match self.retry_delay {
            Some(delay) => processor.with_retry_delay(delay),
            None => processor,
        }
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let locator = FileLocator::new(&self.config);
        ctx.log.info(format!(
            "Starting broker import from {}",
            locator.root().display()
        ));

        let discovery = locator.locate();
        for warning in &discovery.warnings {
            ctx.log.warn(warning.clone());
        }

        ctx.result.discovered_files = discovery.files.len();
        ctx.log.info(format!("Discovered {} files", discovery.files.len()));

        if discovery.files.is_empty() {
            ctx.log.warn("No files matched the configured patterns");
            return Ok(());
        }

        let batches = partition(&discovery.files, self.config.batch_size);
        let total_batches = batches.len();
        let processor = self.processor();
        let progress =
            ProgressTracker::with_color(discovery.files.len(), self.show_progress, self.colored);

        for (index, batch) in batches.iter().enumerate() {
            let number = index + 1;
            progress.start_batch(number, total_batches, batch.len());
            ctx.log.info(format!(
                "Batch {}/{}: {} files",
                number,
                total_batches,
                batch.len()
            ));

            let mut totals = BatchTotals::new();
            for file in batch {
                let outcome = processor.process(file, &mut ctx.log).await;
                totals.record(outcome);
                progress.file_done(
                    &file.file_name(),
                    ctx.result.imported_brokers + totals.imported_brokers,
                    ctx.result.failed_files + totals.failed_files,
                );
            }

            ctx.log.info(format!(
                "Batch {}/{} complete: {} processed, {} brokers imported, {} failed, {} skipped",
                number,
                total_batches,
                totals.processed_files,
                totals.imported_brokers,
                totals.failed_files,
                totals.skipped_files
            ));
            ctx.result.absorb(totals);
        }

        progress.finish();
        self.store.flush().await?;

        Ok(())
    }
}
