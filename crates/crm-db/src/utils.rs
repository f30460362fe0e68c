//! Shared utility functions

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse a stored RFC3339 timestamp
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp for storage
///
/// Every stored timestamp uses millisecond precision and a `Z` suffix so that
/// lexical ordering in SQL matches chronological ordering.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a client-supplied date
///
/// Accepts RFC3339, the `datetime-local` shape browsers submit
/// (`2024-05-01T14:30`, optionally with seconds), and plain dates.
/// Values without an offset are taken as UTC.
pub fn parse_client_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build a `LIKE` pattern matching `query` as a literal substring
///
/// Use together with `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2024-01-01T12:00:00.000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        assert!(parse_timestamp("invalid").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_format_timestamp_sorts_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1500);

        assert_eq!(format_timestamp(&earlier), "2024-01-01T09:00:00.000Z");
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[test]
    fn test_parse_client_datetime() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();

        assert_eq!(parse_client_datetime("2024-05-01T14:30:00Z"), Some(expected));
        assert_eq!(parse_client_datetime("2024-05-01T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_client_datetime("2024-05-01T14:30"), Some(expected));
        assert_eq!(parse_client_datetime("2024-05-01 14:30:00"), Some(expected));
        assert_eq!(
            parse_client_datetime("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_client_datetime("next tuesday"), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
