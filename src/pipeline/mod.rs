// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod batcher;
pub mod context;
pub mod dispatch;
pub mod gate;
pub mod guard;
pub mod log_buffer;
mod orchestrator;
mod processor;
mod progress;
pub mod result;

pub use batcher::partition;
pub use context::{PipelineRun, RunContext};
pub use dispatch::ParserDispatch;
pub use gate::{GateDecision, ValidationGate};
pub use guard::{ExistenceCheck, ExistenceGuard};
pub use log_buffer::{LogBuffer, LogEntry, LogLevel};
pub use orchestrator::{ImportPipeline, ImportPlan};
pub use processor::{FileProcessor, is_retryable};
pub use progress::ProgressTracker;
pub use result::{BatchTotals, FileOutcome, FileProcessingResult, PipelineResult};
