//! Item records and their lifecycle.
//!
//! An item is created `lost` and may be claimed exactly once. Staff edits
//! touch only the content and finder contact fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ClaimExpiry, Error, Result};

/// Lifecycle state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Lost,
    Claimed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Lost => "lost",
            ItemStatus::Claimed => "claimed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lost" => Ok(ItemStatus::Lost),
            "claimed" => Ok(ItemStatus::Claimed),
            other => Err(Error::validation(format!("Unknown status: {}", other))),
        }
    }
}

/// Finder contact details captured when an item is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pickup_location: String,
}

/// Claimer contact details captured when an item is claimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Validated and sanitized content of a new report
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub item_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub found_at: DateTime<Utc>,
    pub finder: FinderContact,
}

/// Validated and sanitized staff edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEdit {
    pub item_name: String,
    pub description: String,
    pub finder: FinderContact,
}

/// Found item record, stored as JSON under `item:<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub item_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub found_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: ItemStatus,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub claim_image_url: Option<String>,

    pub finder_name: String,
    pub finder_email: String,
    pub finder_phone: String,
    pub pickup_location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimer_phone: Option<String>,
}

impl Item {
    /// Create a new `lost` item from a validated draft
    pub fn new(id: String, draft: ItemDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            item_name: draft.item_name,
            description: draft.description,
            image_url: draft.image_url,
            latitude: draft.latitude,
            longitude: draft.longitude,
            found_at: draft.found_at,
            created_at,
            status: ItemStatus::Lost,
            claimed_at: None,
            claim_image_url: None,
            finder_name: draft.finder.name,
            finder_email: draft.finder.email,
            finder_phone: draft.finder.phone,
            pickup_location: draft.finder.pickup_location,
            claimer_name: None,
            claimer_email: None,
            claimer_phone: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.status == ItemStatus::Claimed
    }

    /// Overwrite content and finder fields, leaving identity, status,
    /// claim fields and timestamps untouched.
    pub fn apply_edit(&mut self, edit: ItemEdit) {
        self.item_name = edit.item_name;
        self.description = edit.description;
        self.finder_name = edit.finder.name;
        self.finder_email = edit.finder.email;
        self.finder_phone = edit.finder.phone;
        self.pickup_location = edit.finder.pickup_location;
    }

    /// Transition `lost -> claimed`.
    ///
    /// Fails with [`Error::AlreadyClaimed`] if the item was claimed before;
    /// the record is left unchanged in that case.
    pub fn claim(
        &mut self,
        claimer: ClaimerContact,
        claim_image_url: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if self.is_claimed() {
            return Err(Error::AlreadyClaimed);
        }

        self.status = ItemStatus::Claimed;
        self.claimed_at = Some(at);
        self.claim_image_url = claim_image_url;
        self.claimer_name = Some(claimer.name);
        self.claimer_email = Some(claimer.email);
        self.claimer_phone = Some(claimer.phone);
        Ok(())
    }

    /// Expiry of the claim window, `None` while the item is still lost
    pub fn claim_expiry(&self, now: DateTime<Utc>) -> Option<ClaimExpiry> {
        match (self.status, self.claimed_at) {
            (ItemStatus::Claimed, Some(claimed_at)) => Some(ClaimExpiry::new(claimed_at, now)),
            _ => None,
        }
    }

    /// Case-insensitive substring match on name and description
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.item_name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}
