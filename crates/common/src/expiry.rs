//! Claim expiry window.
//!
//! A claimed item stays claimed forever; the window only drives how long
//! the item is shown as awaiting pickup. Nothing here is persisted.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Days a claimed item is held after `claimedAt`.
pub const CLAIM_WINDOW_DAYS: i64 = 3;

/// Expiry state of a claim as seen at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimExpiry {
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    /// `"Expired"`, `"2d 5h"`, `"3h 12m"` or `"45m"`
    pub remaining: String,
}

impl ClaimExpiry {
    pub fn new(claimed_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let expires_at = claimed_at + Duration::days(CLAIM_WINDOW_DAYS);
        let left = expires_at - now;

        Self {
            expires_at,
            expired: left <= Duration::zero(),
            remaining: format_remaining(left),
        }
    }
}

fn format_remaining(left: Duration) -> String {
    if left <= Duration::zero() {
        return "Expired".to_string();
    }

    let days = left.num_days();
    let hours = left.num_hours() % 24;
    let minutes = left.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
