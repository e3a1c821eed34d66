//! Intake: turns raw form fields into a timestamped [`Submission`].

use chrono::{DateTime, FixedOffset, Utc};

use crate::pipeline::types::Submission;

/// Offset of the reporting region (+05:30).
const REGION_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn region_offset() -> FixedOffset {
    FixedOffset::east_opt(REGION_OFFSET_SECS).expect("+05:30 is a valid UTC offset")
}

/// Current time at +05:30.
pub fn region_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&region_offset())
}

/// Build a submission stamped with the current time at +05:30.
///
/// Fields are trimmed but otherwise taken verbatim; empty values are allowed.
pub fn normalize(category: &str, location: &str, description: &str) -> Submission {
    normalize_at(category, location, description, Utc::now())
}

/// Same as [`normalize`] with an explicit clock reading.
pub fn normalize_at(
    category: &str,
    location: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Submission {
    Submission {
        category: category.trim().to_string(),
        location: location.trim().to_string(),
        description: description.trim().to_string(),
        submitted_at: now.with_timezone(&region_offset()),
    }
}

/// Parse a stored ISO-8601 timestamp back into the region offset.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&region_offset()))
}
