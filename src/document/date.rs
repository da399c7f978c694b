//! Publish-date parsing for detail pages

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-time layouts seen in `datetime` attributes and page text
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Date-only layouts, interpreted as midnight UTC
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
];

/// Labels that often precede the date itself
const DATE_LABELS: &[&str] = &["published on", "posted on", "updated on", "published", "posted", "updated", "date"];

/// Parses a publish date as shown on a detail page
///
/// Returns `None` when nothing recognizable is found; an unparsable date is
/// never an error for the crawl.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = strip_label(&collapsed);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(parsed.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(cleaned, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    tracing::debug!("Unrecognized publish date: '{}'", raw);
    None
}

fn strip_label(value: &str) -> &str {
    for label in DATE_LABELS {
        let prefix = value.as_bytes().get(..label.len());
        if prefix.is_some_and(|p| p.eq_ignore_ascii_case(label.as_bytes())) {
            return value[label.len()..].trim_start_matches([':', ' ']).trim();
        }
    }
    value.trim()
}
