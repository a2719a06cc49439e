// file: src/pipeline/guard.rs
// description: skip-if-present check against the broker store

use crate::store::BrokerStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceCheck {
    Found,
    NotFound,
    CheckFailed(String),
}

impl ExistenceCheck {
    /// Fail open: a failed lookup never blocks an import.
    pub fn should_skip(&self) -> bool {
        matches!(self, ExistenceCheck::Found)
    }
}

pub struct ExistenceGuard {
    enabled: bool,
}

impl ExistenceGuard {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `NotFound` when disabled or when the record has no usable name.
    pub async fn check(&self, store: &dyn BrokerStore, name: Option<&str>) -> ExistenceCheck {
        let Some(name) = name.filter(|_| self.enabled) else {
            return ExistenceCheck::NotFound;
        };

        match store.exists(name).await {
            Ok(true) => ExistenceCheck::Found,
            Ok(false) => ExistenceCheck::NotFound,
            Err(e) => ExistenceCheck::CheckFailed(e.to_string()),
        }
    }
}
