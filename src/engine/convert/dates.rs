//! Accepted date/time formats for `DateTime` fields
//!
//! Formats are tried in order and the first match wins, so month-first forms
//! take precedence over day-first ones for ambiguous input like `03/04/2024`.
//! Formats without a year are resolved against the current year.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

pub const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M",
    "%m.%d.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%b %d %Y",
    "%b %d %Y %H:%M",
    "%b %d %H:%M",
    "%b %d %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
];

/// Parse `text` against [`DATE_FORMATS`]. Runs of whitespace count as one
/// space, so padded `ls` dates like `Mar  5 14:02` parse.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| parse_with_format(&text, format))
}

fn parse_with_format(text: &str, format: &str) -> Option<NaiveDateTime> {
    let has_time = format.contains("%H") || format.contains("%I");

    if !format.contains("%Y") {
        let year = Local::now().year();
        let with_year = format!("{} {}", year, text);
        let format = format!("%Y {}", format);
        return NaiveDateTime::parse_from_str(&with_year, &format).ok();
    }

    if has_time {
        NaiveDateTime::parse_from_str(text, format).ok()
    } else {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_numeric_date_forms() {
        assert_eq!(parse_datetime("2024-03-01"), Some(ymd_hm(2024, 3, 1, 0, 0)));
        assert_eq!(parse_datetime("3/1/2024"), Some(ymd_hm(2024, 3, 1, 0, 0)));
        assert_eq!(parse_datetime("2024.03.01 14:05"), Some(ymd_hm(2024, 3, 1, 14, 5)));
    }

    #[test]
    fn test_month_first_wins_when_ambiguous() {
        assert_eq!(parse_datetime("03/04/2024"), Some(ymd_hm(2024, 3, 4, 0, 0)));
        // day 13 cannot be a month, so the day-first form applies
        assert_eq!(parse_datetime("13/04/2024"), Some(ymd_hm(2024, 4, 13, 0, 0)));
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(parse_datetime("Mar 01, 2024"), Some(ymd_hm(2024, 3, 1, 0, 0)));
        assert_eq!(
            parse_datetime("March 1, 2024 02:30 PM"),
            Some(ymd_hm(2024, 3, 1, 14, 30))
        );
        assert_eq!(parse_datetime("Jul  4  2021"), Some(ymd_hm(2021, 7, 4, 0, 0)));
    }

    #[test]
    fn test_missing_year_uses_current_year() {
        let parsed = parse_datetime("Jul 10 14:26").unwrap();
        assert_eq!(parsed.year(), Local::now().year());
        assert_eq!(parsed.month(), 7);
        assert_eq!(parsed.day(), 10);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
