//! Filter rule storage backends
//!
//! [`SledFilterStore`] keeps rules in an embedded sled database, one JSON
//! document per rule keyed by the big-endian rule id. [`MemoryFilterStore`]
//! is used when no database path is configured and in tests.

use crate::filter::{FilterId, FilterKey, FilterPatch, FilterRule};
use async_trait::async_trait;
use parking_lot::Mutex;
use pipebot_common::{PipebotError, Result, Timestamp};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Durable storage for filter rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Reads every stored rule.
    async fn load_all(&self) -> Result<Vec<FilterRule>>;

    /// Stores a new active rule and returns it with its assigned id.
    async fn insert(&self, key: FilterKey, created_at: Timestamp) -> Result<FilterRule>;

    /// Applies a patch to a stored rule and returns the updated row.
    async fn update(&self, id: FilterId, patch: FilterPatch) -> Result<FilterRule>;
}

/// Non-durable store.
#[derive(Debug)]
pub struct MemoryFilterStore {
    rules: Mutex<BTreeMap<FilterId, FilterRule>>,
    next_id: AtomicU64,
}

impl MemoryFilterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryFilterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilterStore for MemoryFilterStore {
    async fn load_all(&self) -> Result<Vec<FilterRule>> {
        Ok(self.rules.lock().values().cloned().collect())
    }

    async fn insert(&self, key: FilterKey, created_at: Timestamp) -> Result<FilterRule> {
        let id = FilterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let rule = FilterRule {
            id,
            active: true,
            key,
            created_at,
        };
        self.rules.lock().insert(id, rule.clone());
        Ok(rule)
    }

    async fn update(&self, id: FilterId, patch: FilterPatch) -> Result<FilterRule> {
        let mut rules = self.rules.lock();
        let rule = rules
            .get_mut(&id)
            .ok_or_else(|| PipebotError::database(format!("Filter rule {id} not found")))?;
        patch.apply(rule);
        Ok(rule.clone())
    }
}

/// Store backed by a sled database.
#[derive(Debug, Clone)]
pub struct SledFilterStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledFilterStore {
    /// Opens or creates the database at `path`.
    ///
    /// # Errors
    ///
    /// Fails when sled cannot open the database or its tree.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening filter database at: {:?}", path.as_ref());

        let db = sled::Config::default()
            .path(path.as_ref())
            .flush_every_ms(Some(1000))
            .open()
            .map_err(|e| {
                PipebotError::database_with_source(
                    format!("Failed to open database at {:?}", path.as_ref()),
                    e,
                )
            })?;

        let tree = db
            .open_tree("filters")
            .map_err(|e| PipebotError::database_with_source("Failed to open filters tree", e))?;

        Ok(Self { db, tree })
    }

    async fn write(&self, rule: &FilterRule) -> Result<()> {
        let data = serde_json::to_vec(rule)?;
        self.tree
            .insert(rule.id.0.to_be_bytes(), data)
            .map_err(|e| PipebotError::database_with_source("Failed to write filter rule", e))?;
        self.tree
            .flush_async()
            .await
            .map_err(|e| PipebotError::database_with_source("Failed to flush filter rules", e))?;
        Ok(())
    }
}

#[async_trait]
impl FilterStore for SledFilterStore {
    async fn load_all(&self) -> Result<Vec<FilterRule>> {
        let mut rules = Vec::new();
        for entry in self.tree.iter() {
            let (_, data) = entry
                .map_err(|e| PipebotError::database_with_source("Failed to scan filter rules", e))?;
            rules.push(serde_json::from_slice(&data)?);
        }
        Ok(rules)
    }

    async fn insert(&self, key: FilterKey, created_at: Timestamp) -> Result<FilterRule> {
        // sled ids start at zero; keep zero free.
        let id = self
            .db
            .generate_id()
            .map_err(|e| PipebotError::database_with_source("Failed to allocate filter id", e))?
            + 1;

        let rule = FilterRule {
            id: FilterId(id),
            active: true,
            key,
            created_at,
        };
        self.write(&rule).await?;

        debug!(id = %rule.id, "Stored filter rule");
        Ok(rule)
    }

    async fn update(&self, id: FilterId, patch: FilterPatch) -> Result<FilterRule> {
        let data = self
            .tree
            .get(id.0.to_be_bytes())
            .map_err(|e| PipebotError::database_with_source("Failed to read filter rule", e))?
            .ok_or_else(|| PipebotError::database(format!("Filter rule {id} not found")))?;

        let mut rule: FilterRule = serde_json::from_slice(&data)?;
        patch.apply(&mut rule);
        self.write(&rule).await?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;
    use pipebot_common::test_utils::{chat_fixtures::*, mock_timestamp};
    use pipebot_common::Scope;
    use tempfile::tempdir;

    fn key() -> FilterKey {
        FilterKey::global(FilterKind::Block, bob().id)
            .blocking(alice().id)
            .for_command("say")
            .in_channel(channel_a())
    }

    #[tokio::test]
    async fn test_memory_store_insert_and_update() {
        let store = MemoryFilterStore::new();
        let rule = store.insert(key(), mock_timestamp(2024, 1, 1, 0, 0, 0)).await.unwrap();
        assert_eq!(rule.id, FilterId(1));

        let updated = store
            .update(rule.id, FilterPatch { active: Some(false) })
            .await
            .unwrap();
        assert!(!updated.active);
        assert_eq!(store.load_all().await.unwrap(), vec![updated]);
        assert!(store.update(FilterId(42), FilterPatch::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_sled_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filters.db");
        let created_at = mock_timestamp(2024, 1, 1, 0, 0, 0);

        let id = {
            let store = SledFilterStore::new(&path).unwrap();
            let rule = store.insert(key(), created_at).await.unwrap();
            store
                .update(rule.id, FilterPatch { active: Some(false) })
                .await
                .unwrap();
            rule.id
        };

        let store = SledFilterStore::new(&path).unwrap();
        let rules = store.load_all().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, id);
        assert!(!rules[0].active);
        assert_eq!(rules[0].key.channel, Scope::Exact(channel_a()));
        assert_eq!(rules[0].key.blocked_user, Some(alice().id));
        assert_eq!(rules[0].created_at, created_at);
    }

    #[tokio::test]
    async fn test_sled_ids_are_unique() {
        let dir = tempdir().unwrap();
        let store = SledFilterStore::new(dir.path().join("filters.db")).unwrap();
        let a = store.insert(key(), mock_timestamp(2024, 1, 1, 0, 0, 0)).await.unwrap();
        let b = store
            .insert(key().for_command("ping"), mock_timestamp(2024, 1, 1, 0, 0, 0))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert!(store.update(FilterId(9999), FilterPatch::default()).await.is_err());
    }
}
