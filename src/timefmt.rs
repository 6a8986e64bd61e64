//! Memorable date formats.
//!
//! Formatting patterns use spreadsheet-style placeholders instead of raw
//! strftime specifiers:
//!
//! ```text
//! M    - month (1)          D    - day (2)        YY   - year (06)
//! MM   - month (01)         DD   - day (02)       YYYY - year (2006)
//! MMM  - month (Jan)        DDD  - day (Mon)      hh   - hours (15)
//! MMMM - month (January)    DDDD - day (Monday)   mm   - minutes (04)
//! pm   - AM/PM marker       ZZ/ZZZ/ZZZZ - zone    ss   - seconds (05)
//! ```
//!
//! `translate` rewrites a pattern into strftime form in a single
//! left-to-right scan of the input; substituted text is never rescanned,
//! so `%`-codes cannot collide with later placeholders. Within each letter
//! family the table lists longer placeholders first (`hh` before `h`,
//! `MMMM` before `MM`) so the scan matches them before their prefixes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

pub const DEFAULT_TIME_FORMAT: &str = "hh:mm:ss";
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const DEFAULT_DATETIME_FORMAT: &str = "DDDD, DD MMM YYYY hh:mm:ss pm";

const PLACEHOLDERS: [(&str, &str); 18] = [
    ("hh", "%H"),
    ("h", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("pm", "%p"),
    ("ZZZZ", "%z"),
    ("ZZZ", "%Z"),
    ("ZZ", "%:z"),
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("DDDD", "%A"),
    ("DDD", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
];

/// Rewrite a placeholder pattern into strftime syntax.
pub fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while !rest.is_empty() {
        let matched = PLACEHOLDERS
            .iter()
            .find(|(find, _)| rest.starts_with(find));

        match matched {
            Some((find, subst)) => {
                out.push_str(subst);
                rest = &rest[find.len()..];
            }
            None => {
                let mut chars = rest.chars();
                let Some(ch) = chars.next() else { break };
                out.push(ch);
                rest = chars.as_str();
            }
        }
    }

    out
}

/// Format a date with a placeholder pattern; an empty pattern means the
/// default date-time format.
pub fn format<Tz: TimeZone>(pattern: &str, date: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let pattern = if pattern.is_empty() {
        DEFAULT_DATETIME_FORMAT
    } else {
        pattern
    };
    date.format(&translate(pattern)).to_string()
}

pub fn format_date<Tz: TimeZone>(date: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format(DEFAULT_DATE_FORMAT, date)
}

pub fn format_time<Tz: TimeZone>(date: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format(DEFAULT_TIME_FORMAT, date)
}

pub fn format_datetime<Tz: TimeZone>(date: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format(DEFAULT_DATETIME_FORMAT, date)
}

/// Parse a `YYYY-MM-DD` value.
pub fn parse_date(value: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(value, &translate(DEFAULT_DATE_FORMAT))
}

/// Parse an `hh:mm:ss` value.
pub fn parse_time(value: &str) -> chrono::ParseResult<NaiveTime> {
    NaiveTime::parse_from_str(value, &translate(DEFAULT_TIME_FORMAT))
}

/// Parse a value in the default date-time format.
pub fn parse_datetime(value: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, &translate(DEFAULT_DATETIME_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reference() -> DateTime<Utc> {
        // January 2, 2006 is a Monday.
        Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
    }

    #[test]
    fn translate_rewrites_known_patterns() {
        assert_eq!(translate("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(translate("hh:mm:ss"), "%H:%M:%S");
        assert_eq!(
            translate("DDDD, DD MMM YYYY hh:mm:ss pm"),
            "%A, %d %b %Y %H:%M:%S %p"
        );
    }

    #[test]
    fn substituted_text_is_never_rescanned() {
        // "%M" from `mm` contains a capital M; the later `M` placeholder
        // must not re-match it.
        assert_eq!(translate("mm"), "%M");
        assert_eq!(translate("M D"), "%-m %-d");
        assert_eq!(translate("M/D hh:mm"), "%-m/%-d %H:%M");
    }

    #[test]
    fn format_date_uses_iso_style_defaults() {
        assert_eq!(format_date(reference()), "2006-01-02");
    }

    #[test]
    fn format_time_is_24_hour() {
        assert_eq!(format_time(reference()), "15:04:05");
    }

    #[test]
    fn format_datetime_spells_out_the_day() {
        assert_eq!(format_datetime(reference()), "Monday, 02 Jan 2006 15:04:05 PM");
    }

    #[test]
    fn empty_pattern_falls_back_to_the_datetime_default() {
        assert_eq!(format("", reference()), format_datetime(reference()));
    }

    #[test]
    fn dates_round_trip_through_parse() {
        let formatted = format_date(reference());
        let parsed = parse_date(&formatted).unwrap();
        assert_eq!(parsed, reference().date_naive());
    }

    #[test]
    fn times_round_trip_through_parse() {
        let formatted = format_time(reference());
        let parsed = parse_time(&formatted).unwrap();
        assert_eq!(parsed, reference().time());
    }

    #[test]
    fn datetimes_round_trip_through_parse() {
        let formatted = format_datetime(reference());
        let parsed = parse_datetime(&formatted).unwrap();
        assert_eq!(parsed, reference().naive_utc());
    }
}
