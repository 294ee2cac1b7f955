use crate::models::ContentNode;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date attributes checked on every node
pub const DATE_ATTRIBUTES: [&str; 3] = ["start", "end", "due"];

/// Parse an OLX date: RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC),
/// or a bare `YYYY-MM-DD`. Surrounding quotes from JSON policy values are
/// tolerated.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_matches('"');

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A node's resolved date attribute, if present and parseable
pub fn node_date(node: &ContentNode, key: &str) -> Option<DateTime<Utc>> {
    node.attr(key).as_deref().and_then(parse_date)
}
