//! Request payloads accepted by the registry API.
//!
//! Missing text fields deserialize as empty strings so that they are
//! reported by the validators ("Item name is required") instead of being
//! rejected as malformed JSON. Coordinates that are not JSON numbers are
//! read as absent and reported as "Invalid latitude"/"Invalid longitude".
//! Validation stops at the first failing field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::item::{ClaimerContact, FinderContact, ItemDraft, ItemEdit};
use crate::validation::{
    is_embedded_image, parse_found_at, sanitize, validate_description, validate_email,
    validate_image_url, validate_item_name, validate_latitude, validate_longitude,
    validate_phone, validate_pickup_location, validate_required,
};
use crate::Result;

/// Body of `POST /api/items`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportItemRequest {
    pub item_name: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(deserialize_with = "number_or_none")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "number_or_none")]
    pub longitude: Option<f64>,
    pub found_at: String,
    pub finder_name: String,
    pub finder_email: String,
    pub finder_phone: String,
    pub pickup_location: String,
}

/// Body of `PUT /api/items/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditItemRequest {
    pub item_name: String,
    pub description: String,
    pub finder_name: String,
    pub finder_email: String,
    pub finder_phone: String,
    pub pickup_location: String,
}

/// Body of `POST /api/items/{id}/claim`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimItemRequest {
    pub claim_image_url: Option<String>,
    pub claimer_name: String,
    pub claimer_email: String,
    pub claimer_phone: String,
}

/// Validated claim, ready to apply with [`crate::Item::claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemClaim {
    pub claimer: ClaimerContact,
    pub claim_image_url: Option<String>,
}

/// Any JSON value is accepted; only numbers are kept.
fn number_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

fn finder_contact(name: &str, email: &str, phone: &str, pickup: &str) -> Result<FinderContact> {
    validate_required(name, "Finder name")?;
    validate_email(email, "Finder email")?;
    validate_phone(phone, "Finder phone")?;
    validate_pickup_location(pickup)?;

    Ok(FinderContact {
        name: sanitize(name),
        email: sanitize(email),
        phone: sanitize(phone),
        pickup_location: sanitize(pickup),
    })
}

/// Embedded payloads are stored verbatim, URLs are sanitized; blank means none.
fn normalize_image(image: Option<String>) -> Option<String> {
    let image = image?;
    if image.trim().is_empty() {
        return None;
    }
    if is_embedded_image(&image) {
        Some(image.trim().to_string())
    } else {
        Some(sanitize(&image))
    }
}

impl ReportItemRequest {
    /// Validate every field in order and produce a sanitized draft.
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<ItemDraft> {
        validate_item_name(&self.item_name)?;
        validate_description(&self.description)?;
        validate_image_url(self.image_url.as_deref().unwrap_or(""))?;
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        let found_at = parse_found_at(&self.found_at, now)?;
        let finder = finder_contact(
            &self.finder_name,
            &self.finder_email,
            &self.finder_phone,
            &self.pickup_location,
        )?;

        Ok(ItemDraft {
            item_name: sanitize(&self.item_name),
            description: sanitize(&self.description),
            image_url: normalize_image(self.image_url),
            // Both were checked above.
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            found_at,
            finder,
        })
    }
}

impl EditItemRequest {
    pub fn into_edit(self) -> Result<ItemEdit> {
        validate_item_name(&self.item_name)?;
        validate_description(&self.description)?;
        let finder = finder_contact(
            &self.finder_name,
            &self.finder_email,
            &self.finder_phone,
            &self.pickup_location,
        )?;

        Ok(ItemEdit {
            item_name: sanitize(&self.item_name),
            description: sanitize(&self.description),
            finder,
        })
    }
}

impl ClaimItemRequest {
    /// Claimer contact is mandatory; the proof image is optional but must be
    /// a valid image reference when present.
    pub fn into_claim(self) -> Result<ItemClaim> {
        validate_required(&self.claimer_name, "Claimer name")?;
        validate_email(&self.claimer_email, "Claimer email")?;
        validate_phone(&self.claimer_phone, "Claimer phone")?;
        validate_image_url(self.claim_image_url.as_deref().unwrap_or(""))?;

        Ok(ItemClaim {
            claimer: ClaimerContact {
                name: sanitize(&self.claimer_name),
                email: sanitize(&self.claimer_email),
                phone: sanitize(&self.claimer_phone),
            },
            claim_image_url: normalize_image(self.claim_image_url),
        })
    }
}
