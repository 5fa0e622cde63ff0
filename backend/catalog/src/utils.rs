use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Stored slug when set, otherwise derived from the title.
pub fn slug_for(stored: Option<&str>, title: &str) -> String {
    match stored {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(title),
    }
}

/// Lowercase, strip combining marks after NFD, collapse everything outside
/// `a-z0-9` into single hyphens. Characters with no ASCII base are dropped.
pub fn slugify(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();

    NON_ALNUM
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

/// Airtable datetimes are RFC 3339; date-only cells come back as `YYYY-MM-DD`.
pub fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

pub fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|s| !s.is_empty())
}
