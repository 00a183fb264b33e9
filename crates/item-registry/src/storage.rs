//! Item persistence on top of a key-value backend
//!
//! Layout:
//! - `item:<id>` holds the item record as JSON
//! - `items:index` holds a JSON array of every item id, in insertion order
//!
//! Item and index writes are separate operations. A failure between them can
//! leave a dangling id in the index; [`ItemStore::get_all_items`] skips those.

use chrono::Utc;
use lostfound_common::{Item, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;

/// Key of the id index record
pub const ITEMS_INDEX_KEY: &str = "items:index";

/// Scratch key used by the health round trip
pub const HEALTH_CHECK_KEY: &str = "health-check-test";

/// Key of a single item record
pub fn item_key(id: &str) -> String {
    format!("item:{}", id)
}

/// Storage backend for found items
#[derive(Clone)]
pub struct ItemStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ItemStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn backend_name(&self) -> &'static str {
        self.kv.backend_name()
    }

    async fn read_index(&self) -> Result<Vec<String>> {
        match self.kv.get(ITEMS_INDEX_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_index(&self, ids: &[String]) -> Result<()> {
        let json = serde_json::to_string(ids)?;
        self.kv.set(ITEMS_INDEX_KEY, &json).await
    }

    /// Write an item record, appending its id to the index if it is new
    pub async fn save_item(&self, item: &Item) -> Result<()> {
        let json = serde_json::to_string(item)?;
        self.kv.set(&item_key(&item.id), &json).await?;

        let mut ids = self.read_index().await?;
        if ids.iter().any(|id| id == &item.id) {
            debug!("Item {} already indexed", item.id);
        } else {
            ids.push(item.id.clone());
            self.write_index(&ids).await?;
            debug!("Indexed item {} ({} total)", item.id, ids.len());
        }

        info!("Saved item: {}", item.id);
        Ok(())
    }

    /// Get an item by id. Does not consult the index.
    pub async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        match self.kv.get(&item_key(id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Every indexed item, most recently found first
    ///
    /// Ids without a readable record are skipped.
    pub async fn get_all_items(&self) -> Result<Vec<Item>> {
        let ids = self.read_index().await?;

        let mut items = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(json) = self.kv.get(&item_key(id)).await? else {
                warn!("Index references missing item: {}", id);
                continue;
            };

            match serde_json::from_str::<Item>(&json) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping unreadable item {}: {}", id, e),
            }
        }

        // Stable sort keeps index order for equal timestamps.
        items.sort_by(|a, b| b.found_at.cmp(&a.found_at));
        Ok(items)
    }

    /// Delete an item and drop it from the index
    ///
    /// Returns Ok(false) if no record exists for `id`.
    pub async fn delete_item(&self, id: &str) -> Result<bool> {
        let key = item_key(id);

        if self.kv.get(&key).await?.is_none() {
            debug!("Item not found for delete: {}", id);
            return Ok(false);
        }

        self.kv.del(&key).await?;

        let ids: Vec<String> = self
            .read_index()
            .await?
            .into_iter()
            .filter(|existing| existing != id)
            .collect();
        self.write_index(&ids).await?;

        info!("Deleted item: {}", id);
        Ok(true)
    }

    /// Number of ids in the index
    pub async fn count_items(&self) -> Result<usize> {
        Ok(self.read_index().await?.len())
    }

    /// Write, read back and delete a scratch key
    ///
    /// Returns true if the value read back matches the one written.
    pub async fn health_check(&self) -> Result<bool> {
        let value = Utc::now().timestamp_millis().to_string();

        self.kv.set(HEALTH_CHECK_KEY, &value).await?;
        let read_back = self.kv.get(HEALTH_CHECK_KEY).await?;
        self.kv.del(HEALTH_CHECK_KEY).await?;

        Ok(read_back.as_deref() == Some(value.as_str()))
    }
}
