pub mod marc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Current UTC time as `2024-05-01T10:00:00.000Z`
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Leading integer of `raw`, ignoring surrounding whitespace ("12 tomos" -> 12).
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    trimmed[..end].parse().ok()
}

/// Parse the timestamp shapes found in stored loans: RFC 3339, a
/// `datetime-local` value without zone (read as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_int() {
        assert_eq!(parse_leading_int("0005"), Some(5));
        assert_eq!(parse_leading_int(" 12abc"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn timestamps_in_every_stored_shape() {
        let full = parse_timestamp("2024-05-01T10:30:00.000Z").unwrap();
        let local = parse_timestamp("2024-05-01T10:30").unwrap();
        assert_eq!(full, local);
        assert_eq!(
            parse_timestamp("2024-05-01").unwrap().date_naive(),
            full.date_naive()
        );
        assert!(parse_timestamp("yesterday").is_none());
    }
}
