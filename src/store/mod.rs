// file: src/store/mod.rs
// description: broker persistence seam consumed by the import pipeline
// reference: internal module structure

pub mod json;

use crate::error::Result;
use crate::models::{EntityCounts, NormalizedBrokerRecord};
use async_trait::async_trait;
use serde::Serialize;

pub use json::{JsonBrokerStore, StoredBroker};

/// Outcome of one import attempt. A `success: false` report is a business
/// failure; transport or io failures come back as `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub stats: EntityCounts,
}

impl ImportReport {
    pub fn imported(stats: EntityCounts) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            stats,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            stats: EntityCounts::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub brokers: usize,
    pub stats: EntityCounts,
}

#[async_trait]
pub trait BrokerStore: Send + Sync {
    /// Name lookup, case-insensitive.
    async fn exists(&self, name: &str) -> Result<bool>;

    async fn import(&self, record: &NormalizedBrokerRecord) -> Result<ImportReport>;

    /// Persists buffered writes. Called once at the end of a run.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn summary(&self) -> Result<StoreSummary>;
}
