// file: src/pipeline/context.rs
// description: explicit per-run state threaded through every pipeline stage

use crate::pipeline::log_buffer::LogBuffer;
use crate::pipeline::result::PipelineResult;
use std::time::Instant;

/// Everything a run mutates. Created at run start, owned by the run, and
/// handed back to the caller as a `PipelineRun`.
pub struct RunContext {
    pub log: LogBuffer,
    pub result: PipelineResult,
    started: Instant,
    fatal: bool,
}

impl RunContext {
    pub fn new(enable_logging: bool) -> Self {
        Self {
            log: LogBuffer::new(enable_logging),
            result: PipelineResult::new(),
            started: Instant::now(),
            fatal: false,
        }
    }

    /// Records an error that escaped the batch loop.
    pub fn fail(&mut self, message: String) {
        self.log.error(message.clone());
        self.result.errors.push(message);
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn finish(mut self) -> PipelineRun {
        self.result.finalize(self.started.elapsed());
        if self.fatal {
            self.result.success = false;
        }

        PipelineRun {
            result: self.result,
            log: self.log,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: PipelineResult,
    pub log: LogBuffer,
}
