// file: src/validator/mod.rs
// description: record validation seam and outcome type
// reference: internal module structure

pub mod rules;

use crate::models::NormalizedBrokerRecord;
use serde::Serialize;

pub use rules::BrokerValidator;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

pub trait RecordValidator: Send + Sync {
    fn validate(&self, record: &NormalizedBrokerRecord) -> ValidationOutcome;
}
