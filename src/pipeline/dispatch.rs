// file: src/pipeline/dispatch.rs
// description: routes a file to the page parser or the script extractor by kind

use crate::error::{PipelineError, Result};
use crate::models::NormalizedBrokerRecord;
use crate::parser::{
    BrokerPageParser, BrokerScriptExtractor, HtmlReviewParser, ScriptLiteralExtractor,
    derive_broker_name,
};
use crate::source::{CandidateFile, DocumentKind};
use std::sync::Arc;

#[derive(Clone)]
pub struct ParserDispatch {
    html: Arc<dyn BrokerPageParser>,
    script: Arc<dyn BrokerScriptExtractor>,
}

impl ParserDispatch {
    pub fn new(html: Arc<dyn BrokerPageParser>, script: Arc<dyn BrokerScriptExtractor>) -> Self {
        Self { html, script }
    }

    /// Returns every broker the file describes, possibly none for a bundle.
    /// Page records without a name get one derived from the file name.
    pub fn dispatch(
        &self,
        file: &CandidateFile,
        content: &str,
    ) -> Result<Vec<NormalizedBrokerRecord>> {
        let source = file.file_name();

        match file.kind {
            Some(DocumentKind::Html) => {
                let mut record = self.html.parse(content, &source)?;
                if record.display_name().is_none() {
                    record.name = derive_broker_name(&file.path);
                }
                Ok(vec![record])
            }
            Some(DocumentKind::Script) => {
                Ok(self.script.extract(content, &source)?.into_records())
            }
            None => Err(PipelineError::UnsupportedFileType {
                path: file.path.clone(),
                extension: file
                    .path
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            }),
        }
    }
}

impl Default for ParserDispatch {
    fn default() -> Self {
        Self::new(
            Arc::new(HtmlReviewParser::new()),
            Arc::new(ScriptLiteralExtractor::new()),
        )
    }
}
