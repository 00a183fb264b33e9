//! Shared domain types for the lost-and-found item registry.
//!
//! Everything in this crate is pure: item records, request payloads and
//! their validation, and the derived claim-expiry view. Persistence and
//! HTTP live in `item-registry`.

pub mod error;
pub mod expiry;
pub mod item;
pub mod requests;
pub mod validation;

pub use error::{Error, Result};
pub use expiry::{ClaimExpiry, CLAIM_WINDOW_DAYS};
pub use item::{ClaimerContact, FinderContact, Item, ItemDraft, ItemEdit, ItemStatus};
pub use requests::{ClaimItemRequest, EditItemRequest, ItemClaim, ReportItemRequest};
