//! Item lifecycle: report, edit, claim, delete
//!
//! Each operation validates its request, checks the current record and then
//! writes through [`ItemStore`]. Nothing is locked across the read and the
//! write, so two concurrent claims on one item resolve last-write-wins.

use chrono::{DateTime, Duration, Utc};
use lostfound_common::{
    ClaimItemRequest, EditItemRequest, Error, Item, ItemStatus, ReportItemRequest, Result,
};
use rand::Rng;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::storage::ItemStore;

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LENGTH: usize = 9;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Filters for listing items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring of the name or description
    pub q: Option<String>,
    pub status: Option<ItemStatus>,
}

/// Generate an item id of the form `<unix millis>-<9 base36 chars>`
pub fn generate_item_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LENGTH)
        .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}-{}", now.timestamp_millis(), suffix)
}

#[derive(Clone)]
pub struct ItemService {
    store: ItemStore,
    clock: Arc<dyn Clock>,
}

impl ItemService {
    pub fn new(store: ItemStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: ItemStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Report a found item. Nothing is written if validation fails.
    pub async fn create_item(&self, request: ReportItemRequest) -> Result<Item> {
        let now = self.now();
        let draft = request.into_draft(now)?;

        let item = Item::new(generate_item_id(now), draft, now);
        self.store.save_item(&item).await?;

        info!("Reported item {}: {}", item.id, item.item_name);
        Ok(item)
    }

    /// All items, most recently found first, optionally filtered
    pub async fn list_items(&self, query: &ListQuery) -> Result<Vec<Item>> {
        let mut items = self.store.get_all_items().await?;

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            items.retain(|item| item.matches_query(q));
        }
        if let Some(status) = query.status {
            items.retain(|item| item.status == status);
        }

        debug!("Listing {} items", items.len());
        Ok(items)
    }

    pub async fn get_item(&self, id: &str) -> Result<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Staff edit of content and finder contact fields
    pub async fn update_item(&self, id: &str, request: EditItemRequest) -> Result<Item> {
        let mut item = self.get_item(id).await?;
        let edit = request.into_edit()?;

        item.apply_edit(edit);
        self.store.save_item(&item).await?;

        info!("Updated item {}", id);
        Ok(item)
    }

    /// Claim a lost item on behalf of its owner
    pub async fn claim_item(&self, id: &str, request: ClaimItemRequest) -> Result<Item> {
        let mut item = self.get_item(id).await?;
        if item.is_claimed() {
            return Err(Error::AlreadyClaimed);
        }

        let claim = request.into_claim()?;
        item.claim(claim.claimer, claim.claim_image_url, self.now())?;
        self.store.save_item(&item).await?;

        info!("Claimed item {}", id);
        Ok(item)
    }

    pub async fn delete_item(&self, id: &str) -> Result<()> {
        if !self.store.delete_item(id).await? {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Round trip against the key-value backend
    pub async fn health(&self) -> Result<bool> {
        self.store.health_check().await
    }
}
