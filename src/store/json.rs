// file: src/store/json.rs
// description: json file backed broker store with upsert by name
// reference: https://docs.rs/serde_json

use crate::error::{PipelineError, Result};
use crate::models::NormalizedBrokerRecord;
use crate::store::{BrokerStore, ImportReport, StoreSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBroker {
    pub id: Uuid,
    pub record: NormalizedBrokerRecord,
    pub content_hash: String,
    pub imported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Brokers keyed by lowercased name. Writes stay in memory until `flush`,
/// which replaces the file through a temporary sibling.
pub struct JsonBrokerStore {
    storage_path: Option<PathBuf>,
    brokers: RwLock<BTreeMap<String, StoredBroker>>,
}

impl JsonBrokerStore {
    pub async fn open(storage_path: impl Into<PathBuf>) -> Result<Self> {
        let storage_path = storage_path.into();
        let brokers = Self::load(&storage_path).await?;
        info!(
            "Opened broker store at {} ({} brokers)",
            storage_path.display(),
            brokers.len()
        );

        Ok(Self {
            storage_path: Some(storage_path),
            brokers: RwLock::new(brokers),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            storage_path: None,
            brokers: RwLock::new(BTreeMap::new()),
        }
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, StoredBroker>> {
        if !path.exists() {
            debug!("No existing store file at {}", path.display());
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: path.to_path_buf(),
                source,
            })?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Store(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub async fn get(&self, name: &str) -> Option<StoredBroker> {
        self.brokers.read().await.get(&Self::key(name)).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.brokers
            .read()
            .await
            .values()
            .filter_map(|b| b.record.display_name().map(str::to_string))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.brokers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BrokerStore for JsonBrokerStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.brokers.read().await.contains_key(&Self::key(name)))
    }

    async fn import(&self, record: &NormalizedBrokerRecord) -> Result<ImportReport> {
        let Some(name) = record.display_name() else {
            return Ok(ImportReport::failed("cannot import a broker without a name"));
        };

        let now = Utc::now();
        let content_hash = record.content_hash();
        let mut brokers = self.brokers.write().await;

        match brokers.get_mut(&Self::key(name)) {
            Some(existing) => {
                if existing.content_hash != content_hash {
                    existing.record = record.clone();
                    existing.content_hash = content_hash;
                    existing.updated_at = now;
                }
                debug!("Updated broker {}", name);
            }
            None => {
                brokers.insert(
                    Self::key(name),
                    StoredBroker {
                        id: Uuid::new_v4(),
                        record: record.clone(),
                        content_hash,
                        imported_at: now,
                        updated_at: now,
                    },
                );
                debug!("Inserted broker {}", name);
            }
        }

        Ok(ImportReport::imported(record.entity_counts()))
    }

    async fn flush(&self) -> Result<()> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };

        let contents = serde_json::to_string_pretty(&*self.brokers.read().await)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: temp_path.clone(),
                source,
            })?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: path.clone(),
                source,
            })?;

        debug!("Flushed broker store to {}", path.display());
        Ok(())
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let brokers = self.brokers.read().await;
        let mut summary = StoreSummary {
            brokers: brokers.len(),
            ..StoreSummary::default()
        };
        for broker in brokers.values() {
            summary.stats += broker.record.entity_counts();
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FromLabel, Platform};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_import_then_exists_case_insensitive() {
        let store = JsonBrokerStore::in_memory();
        let report = store.import(&NormalizedBrokerRecord::named("Pepperstone")).await.unwrap();

        assert!(report.success);
        assert!(store.exists("pepperstone").await.unwrap());
        assert!(store.exists(" PEPPERSTONE ").await.unwrap());
        assert!(!store.exists("XM").await.unwrap());
    }

    #[tokio::test]
    async fn test_import_without_name_fails() {
        let store = JsonBrokerStore::in_memory();
        let report = store.import(&NormalizedBrokerRecord::default()).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_keeps_id_and_returns_counts() {
        let store = JsonBrokerStore::in_memory();
        store.import(&NormalizedBrokerRecord::named("XM")).await.unwrap();
        let first_id = store.get("XM").await.unwrap().id;

        let mut updated = NormalizedBrokerRecord::named("xm");
        updated.platforms = vec![Platform::from_label("MT4".into()), Platform::from_label("MT5".into())];
        let report = store.import(&updated).await.unwrap();

        assert_eq!(report.stats.platforms, 2);
        assert_eq!(store.len().await, 1);
        let stored = store.get("XM").await.unwrap();
        assert_eq!(stored.id, first_id);
        assert_eq!(stored.record.platforms.len(), 2);
    }

    #[tokio::test]
    async fn test_store_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/brokers.json");

        {
            let store = JsonBrokerStore::open(&path).await.unwrap();
            store.import(&NormalizedBrokerRecord::named("IG")).await.unwrap();
            store.flush().await.unwrap();
        }

        let store = JsonBrokerStore::open(&path).await.unwrap();
        assert_eq!(store.names().await, vec!["IG".to_string()]);
        assert_eq!(store.summary().await.unwrap().brokers, 1);
    }

    #[test]
    fn test_corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brokers.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = tokio_test::block_on(JsonBrokerStore::open(&path));
        assert!(matches!(result, Err(PipelineError::Store(_))));
    }
}
