// file: src/parser/mod.rs
// description: document parser seams and their default implementations
// reference: internal module structure

pub mod convert;
pub mod html;
pub mod naming;
pub mod script;

use crate::error::Result;
use crate::models::NormalizedBrokerRecord;

pub use convert::RecordConverter;
pub use html::HtmlReviewParser;
pub use naming::derive_broker_name;
pub use script::ScriptLiteralExtractor;

/// Turns one review page into a broker record. `source` labels errors.
pub trait BrokerPageParser: Send + Sync {
    fn parse(&self, html: &str, source: &str) -> Result<NormalizedBrokerRecord>;
}

/// Pulls embedded broker literals out of a script bundle.
pub trait BrokerScriptExtractor: Send + Sync {
    fn extract(&self, script: &str, source: &str) -> Result<ExtractedBrokers>;
}

/// A bundle may describe a single broker or a list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedBrokers {
    Single(NormalizedBrokerRecord),
    Many(Vec<NormalizedBrokerRecord>),
}

impl ExtractedBrokers {
    pub fn into_records(self) -> Vec<NormalizedBrokerRecord> {
        match self {
            Self::Single(record) => vec![record],
            Self::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_records_normalizes_shapes() {
        let single = ExtractedBrokers::Single(NormalizedBrokerRecord::named("XM"));
        assert_eq!(single.len(), 1);
        assert_eq!(single.into_records().len(), 1);

        let many = ExtractedBrokers::Many(vec![
            NormalizedBrokerRecord::named("XM"),
            NormalizedBrokerRecord::named("IG"),
        ]);
        assert_eq!(many.into_records().len(), 2);

        assert!(ExtractedBrokers::Many(vec![]).is_empty());
    }
}
