//! Field validators for item reports, edits and claims.
//!
//! Every validator returns `Ok(())` or an [`Error::Validation`] carrying a
//! human-readable reason. Lengths are counted in characters after
//! [`sanitize`] has been applied.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use url::Url;

use crate::{Error, Result};

/// Maximum length of an item name.
pub const MAX_ITEM_NAME_LENGTH: usize = 100;

/// Maximum length of an item description.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Maximum length of a remote image URL. Embedded images are not bounded.
pub const MAX_IMAGE_URL_LENGTH: usize = 500;

/// Maximum length of a pickup location.
pub const MAX_PICKUP_LOCATION_LENGTH: usize = 200;

const EMBEDDED_IMAGE_PREFIX: &str = "data:image/";

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Strips `<...>` markup and surrounding whitespace.
///
/// An unterminated `<` is kept as literal text.
///
/// # Example
///
/// ```
/// use lostfound_common::validation::sanitize;
///
/// assert_eq!(sanitize("  <b>Black</b> wallet "), "Black wallet");
/// assert_eq!(sanitize("a < b"), "a < b");
/// ```
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Checks that a sanitized value is present and no longer than `max` characters.
fn validate_bounded_text(input: &str, label: &str, max: usize) -> Result<()> {
    let sanitized = sanitize(input);

    if sanitized.is_empty() {
        return Err(Error::validation(format!("{} is required", label)));
    }

    if char_len(&sanitized) > max {
        return Err(Error::validation(format!(
            "{} must be {} characters or less",
            label, max
        )));
    }

    Ok(())
}

pub fn validate_item_name(item_name: &str) -> Result<()> {
    validate_bounded_text(item_name, "Item name", MAX_ITEM_NAME_LENGTH)
}

pub fn validate_description(description: &str) -> Result<()> {
    validate_bounded_text(description, "Description", MAX_DESCRIPTION_LENGTH)
}

pub fn validate_pickup_location(pickup_location: &str) -> Result<()> {
    validate_bounded_text(
        pickup_location,
        "Pickup location",
        MAX_PICKUP_LOCATION_LENGTH,
    )
}

/// Returns true for images embedded by the client as a `data:image/...` payload.
pub fn is_embedded_image(value: &str) -> bool {
    value.trim_start().starts_with(EMBEDDED_IMAGE_PREFIX)
}

/// Validates an optional image reference.
///
/// Empty input is accepted. Embedded images are accepted without further
/// checks; anything else must be an `http` or `https` URL of at most
/// [`MAX_IMAGE_URL_LENGTH`] characters.
pub fn validate_image_url(input: &str) -> Result<()> {
    if input.trim().is_empty() || is_embedded_image(input) {
        return Ok(());
    }

    let sanitized = sanitize(input);

    if char_len(&sanitized) > MAX_IMAGE_URL_LENGTH {
        return Err(Error::validation(format!(
            "Image URL must be {} characters or less",
            MAX_IMAGE_URL_LENGTH
        )));
    }

    let parsed = Url::parse(&sanitized).map_err(|_| Error::validation("Invalid URL format"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(Error::validation("Image URL must use HTTP or HTTPS")),
    }
}

fn validate_coordinate(value: Option<f64>, label: &str, bound: f64) -> Result<()> {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return Err(Error::validation(format!("Invalid {}", label.to_lowercase()))),
    };

    if !(-bound..=bound).contains(&value) {
        return Err(Error::validation(format!(
            "{} must be between {} and {}",
            label, -bound, bound
        )));
    }

    Ok(())
}

pub fn validate_latitude(latitude: Option<f64>) -> Result<()> {
    validate_coordinate(latitude, "Latitude", 90.0)
}

pub fn validate_longitude(longitude: Option<f64>) -> Result<()> {
    validate_coordinate(longitude, "Longitude", 180.0)
}

/// Parses the time an item was found and rejects timestamps after `now`.
///
/// Accepts RFC 3339 (`2024-05-01T10:30:00.000Z`), a zone-less
/// `YYYY-MM-DDTHH:MM[:SS]` read as UTC, or a bare `YYYY-MM-DD` read as
/// midnight UTC.
pub fn parse_found_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Found date is required"));
    }

    let found_at = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .map(|date| date.and_time(NaiveTime::MIN))
                })
                .map(|naive| naive.and_utc())
        })
        .map_err(|_| Error::validation("Invalid found date"))?;

    if found_at > now {
        return Err(Error::validation("Found date cannot be in the future"));
    }

    Ok(found_at)
}

/// Requires a non-empty value after sanitization.
pub fn validate_required(input: &str, label: &str) -> Result<()> {
    if sanitize(input).is_empty() {
        return Err(Error::validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Loose `local@domain.tld` shape check.
///
/// # Example
///
/// ```
/// use lostfound_common::validation::is_valid_email;
///
/// assert!(is_valid_email("a@b.com"));
/// assert!(!is_valid_email("a@b"));
/// assert!(!is_valid_email("a b@c.com"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Some dot must have at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Phone numbers may contain spaces and hyphens; the rest must be 10 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: Vec<char> = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
        && digits.iter().all(|c| c.is_ascii_digit())
}

pub fn validate_email(email: &str, label: &str) -> Result<()> {
    validate_required(email, label)?;
    if !is_valid_email(&sanitize(email)) {
        return Err(Error::validation(format!("{} is not a valid email address", label)));
    }
    Ok(())
}

pub fn validate_phone(phone: &str, label: &str) -> Result<()> {
    validate_required(phone, label)?;
    if !is_valid_phone(&sanitize(phone)) {
        return Err(Error::validation(format!(
            "{} must be {} to {} digits",
            label, MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        )));
    }
    Ok(())
}
