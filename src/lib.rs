// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod utils;
pub mod validator;

pub use config::{Config, OutputConfig, PipelineConfig, StoreConfig};
pub use error::{PipelineError, Result};
pub use models::{EntityCounts, NormalizedBrokerRecord};
pub use parser::{
    BrokerPageParser, BrokerScriptExtractor, ExtractedBrokers, HtmlReviewParser,
    ScriptLiteralExtractor,
};
pub use pipeline::{
    FileOutcome, FileProcessingResult, ImportPipeline, ImportPlan, LogBuffer, PipelineResult,
    PipelineRun,
};
pub use source::{CandidateFile, DocumentKind, DocumentReader, FileLocator, FsDocumentReader};
pub use store::{BrokerStore, ImportReport, JsonBrokerStore, StoreSummary};
pub use utils::Validator;
pub use validator::{BrokerValidator, RecordValidator, ValidationOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _validator = BrokerValidator::new();
        assert!(LogBuffer::new(true).is_empty());
    }
}
