//! Institution slugs.
//!
//! A slug is the lower-cased name with every run of characters outside ASCII
//! `[a-z0-9]` collapsed into one hyphen and no leading or trailing hyphens,
//! followed by a suffix derived from the creation time:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use comanda_core::{base_slug, institution_slug};
//!
//! assert_eq!(base_slug("Mama's Kitchen!!"), "mama-s-kitchen");
//!
//! let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
//! assert_eq!(institution_slug("Mama's Kitchen!!", at), "mama-s-kitchen-loyw3v28");
//! ```

use chrono::{DateTime, Utc};

/// Base used when the name contains no ASCII letters or digits at all.
const FALLBACK_BASE: &str = "restaurant";

/// Build the base slug for a name (no uniqueness suffix).
#[must_use]
pub fn base_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Build a unique slug for a new institution created at `at`.
#[must_use]
pub fn institution_slug(name: &str, at: DateTime<Utc>) -> String {
    let base = base_slug(name);
    let base = if base.is_empty() {
        FALLBACK_BASE
    } else {
        base.as_str()
    };
    format!("{base}-{}", to_base36(at.timestamp_millis().unsigned_abs()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_owned();
    }

    let mut out = Vec::new();
    while value > 0 {
        #[allow(clippy::cast_possible_truncation)] // remainder is always < 36
        let digit = (value % 36) as usize;
        out.push(DIGITS.get(digit).copied().unwrap_or(b'0'));
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
