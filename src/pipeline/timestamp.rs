//! Lenient parsing of date text scraped from pages

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
];

/// Parses a publish date in any of the formats publishers commonly use
///
/// Zone-less values are taken as UTC; date-only values as midnight UTC.
/// Month names may be full or abbreviated, and ordinal suffixes (`9th`) are
/// accepted.
///
/// # Example
///
/// ```
/// use newsbot::pipeline::parse_timestamp;
///
/// assert!(parse_timestamp("2024-06-09T08:00:00Z").is_some());
/// assert!(parse_timestamp("Sun, 09 Jun 2024 08:00:00 GMT").is_some());
/// assert!(parse_timestamp("June 9th, 2024").is_some());
/// assert!(parse_timestamp("last Tuesday").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    let cleaned = clean_date_text(text);
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Collapses whitespace, drops periods after abbreviations (`Jun.`) and
/// strips ordinal suffixes from day numbers
fn clean_date_text(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let token = token.trim_end_matches('.');
            let (body, comma) = match token.strip_suffix(',') {
                Some(body) => (body, ","),
                None => (token, ""),
            };
            let day = ["st", "nd", "rd", "th"]
                .iter()
                .find_map(|suffix| body.strip_suffix(suffix))
                .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
            format!("{}{}", day.unwrap_or(body), comma)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp("2024-06-09T10:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 6, 9, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_timestamp("Sun, 09 Jun 2024 08:00:00 +0000"),
            Some(Utc.with_ymd_and_hms(2024, 6, 9, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_naive_datetime_is_utc() {
        assert_eq!(
            parse_timestamp("2024-06-09T08:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 6, 9, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_date_only_formats() {
        let expected = Some(ymd(2024, 6, 9));
        assert_eq!(parse_timestamp("2024-06-09"), expected);
        assert_eq!(parse_timestamp("June 9, 2024"), expected);
        assert_eq!(parse_timestamp("Jun 9, 2024"), expected);
        assert_eq!(parse_timestamp("Jun. 9, 2024"), expected);
        assert_eq!(parse_timestamp("june 09 2024"), expected);
        assert_eq!(parse_timestamp("9 June 2024"), expected);
        assert_eq!(parse_timestamp("June 9th, 2024"), expected);
        assert_eq!(parse_timestamp("06/09/2024"), expected);
        assert_eq!(parse_timestamp("  June   9,  2024 "), expected);
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }
}
