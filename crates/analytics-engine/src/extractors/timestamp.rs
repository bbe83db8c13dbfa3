// Best-effort parsing of stored creation timestamps.
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a stored timestamp. Returns `None` for anything unparsable; the
/// record then drops out of time-bucketed trends but stays in the batch.
///
/// Accepted shapes, tried in order: RFC 3339, ISO without offset (assumed
/// UTC), "YYYY-MM-DD HH:MM:SS", bare date at midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-03-10T14:30:00-03:00").unwrap();
        assert_eq!(ts.hour(), 17); // converted to UTC
    }

    #[test]
    fn parses_iso_without_offset_as_utc() {
        let ts = parse_timestamp("2024-03-10T14:30:00").unwrap();
        assert_eq!((ts.hour(), ts.minute()), (14, 30));
    }

    #[test]
    fn parses_space_separated_and_bare_date() {
        assert!(parse_timestamp("2024-03-10 14:30:00").is_some());
        let midnight = parse_timestamp("2024-03-10").unwrap();
        assert_eq!((midnight.day(), midnight.hour()), (10, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("ontem"), None);
        assert_eq!(parse_timestamp("10/03/2024"), None);
    }
}
