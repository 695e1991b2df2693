//! Command output → typed results

use regex::{Captures, Regex, RegexBuilder};

use super::{FieldInfo, Record};
use crate::engine::value::Value;
use crate::error::ConvertError;

/// How non-multiline list patterns treat lines that do not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListParsePolicy {
    /// Every non-blank line must match
    #[default]
    Strict,
    /// Non-matching lines are skipped
    Lenient,
}

/// A compiled result regex.
///
/// `^` and `$` always match at line boundaries. `multiline` selects the list
/// strategy: a global match over the whole text instead of one match per
/// line.
#[derive(Debug, Clone)]
pub struct ResultPattern {
    regex: Regex,
    multiline: bool,
}

impl ResultPattern {
    pub fn new(source: &str, multiline: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source).multi_line(true).build()?;
        Ok(Self { regex, multiline })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    fn group_for(&self, info: &FieldInfo) -> Option<&str> {
        self.regex
            .capture_names()
            .flatten()
            .find(|name| info.matches(name))
    }

    fn build<R: Record>(&self, captures: &Captures<'_>) -> Result<R, ConvertError> {
        let mut record = R::default();
        for info in R::fields() {
            let Some(group) = self.group_for(info) else {
                continue;
            };
            match captures.name(group) {
                Some(m) => record.assign_capture(info.name, m.as_str())?,
                None => {
                    tracing::debug!(group, "capture group did not participate, skipping field")
                }
            }
        }
        Ok(record)
    }

    /// The first participating group, or the whole match.
    fn first_group<'t>(&self, captures: &Captures<'t>) -> &'t str {
        captures
            .iter()
            .skip(1)
            .flatten()
            .next()
            .or_else(|| captures.get(0))
            .map_or("", |m| m.as_str())
    }
}

/// Match once against the full text.
pub fn parse_record<R: Record>(text: &str, pattern: &ResultPattern) -> Result<R, ConvertError> {
    let captures = pattern.regex.captures(text).ok_or(ConvertError::NoMatch)?;
    pattern.build(&captures)
}

/// Parse a list of records, per line or globally depending on the pattern.
pub fn parse_records<R: Record>(
    text: &str,
    pattern: &ResultPattern,
    policy: ListParsePolicy,
) -> Result<Vec<R>, ConvertError> {
    if pattern.multiline {
        return pattern
            .regex
            .captures_iter(text)
            .map(|captures| pattern.build(&captures))
            .collect();
    }

    let mut records = Vec::new();
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        match pattern.regex.captures(line) {
            Some(captures) => records.push(pattern.build(&captures)?),
            None if policy == ListParsePolicy::Lenient => {
                tracing::debug!(line, "skipping line that does not match the result pattern");
            }
            None => {
                return Err(ConvertError::LineMismatch {
                    line: line.to_string(),
                })
            }
        }
    }
    Ok(records)
}

/// The typed result of an action.
pub trait ActionOutput: Sized + Send {
    /// Field table of the record populated from captures, if any.
    fn capture_fields() -> Option<&'static [FieldInfo]> {
        None
    }

    fn from_pattern(
        text: &str,
        pattern: &ResultPattern,
        policy: ListParsePolicy,
    ) -> Result<Self, ConvertError>;

    fn into_value(self) -> Value;
}

impl ActionOutput for String {
    fn from_pattern(
        text: &str,
        pattern: &ResultPattern,
        _policy: ListParsePolicy,
    ) -> Result<Self, ConvertError> {
        let captures = pattern.regex.captures(text).ok_or(ConvertError::NoMatch)?;
        Ok(pattern.first_group(&captures).to_string())
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl ActionOutput for Vec<String> {
    fn from_pattern(
        text: &str,
        pattern: &ResultPattern,
        policy: ListParsePolicy,
    ) -> Result<Self, ConvertError> {
        if pattern.multiline {
            return Ok(pattern
                .regex
                .captures_iter(text)
                .map(|captures| pattern.first_group(&captures).to_string())
                .collect());
        }

        let mut items = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            match pattern.regex.captures(line) {
                Some(captures) => items.push(pattern.first_group(&captures).to_string()),
                None if policy == ListParsePolicy::Lenient => {}
                None => {
                    return Err(ConvertError::LineMismatch {
                        line: line.to_string(),
                    })
                }
            }
        }
        Ok(items)
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Value::Text).collect())
    }
}

impl ActionOutput for Value {
    fn from_pattern(
        text: &str,
        pattern: &ResultPattern,
        policy: ListParsePolicy,
    ) -> Result<Self, ConvertError> {
        String::from_pattern(text, pattern, policy).map(Value::Text)
    }

    fn into_value(self) -> Value {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    crate::record! {
        struct Row {
            name: String,
            size: u64,
            ratio: f64,
        }
    }

    crate::record! {
        struct Entry {
            permissions: String,
            link_count: u32,
            size: u64,
            date: NaiveDateTime,
            name: String,
        }
    }

    fn row_pattern(multiline: bool) -> ResultPattern {
        ResultPattern::new(
            r"^(?P<Name>[a-z]+)\s*(?P<size>\d*)\s*(?P<RATIO>[\d.]*)$",
            multiline,
        )
        .unwrap()
    }

    #[test]
    fn test_single_record() {
        let row: Row = parse_record("alpha 10 0.5", &row_pattern(false)).unwrap();
        assert_eq!(row.name, "alpha");
        assert_eq!(row.size, 10);
        assert_eq!(row.ratio, 0.5);
    }

    #[test]
    fn test_single_record_no_match() {
        let err = parse_record::<Row>("!!!", &row_pattern(false)).unwrap_err();
        assert_eq!(err, ConvertError::NoMatch);
        assert_eq!(err.to_string(), "The command results did not match the regex");
    }

    #[test]
    fn test_empty_numeric_groups_become_zero() {
        let row: Row = parse_record("alpha", &row_pattern(false)).unwrap();
        assert_eq!(row.size, 0);
        assert_eq!(row.ratio, 0.0);
    }

    #[test]
    fn test_missing_and_optional_groups_are_skipped() {
        let pattern = ResultPattern::new(r"^(?P<name>\w+)(?:\s+(?P<size>\d+))?$", false).unwrap();
        let row: Row = parse_record("beta", &pattern).unwrap();
        assert_eq!(row.name, "beta");
        assert_eq!(row.size, 0);
        assert_eq!(row.ratio, 0.0);
    }

    #[test]
    fn test_strict_lines_skip_blank_lines() {
        let text = "alpha 1 0.1\n\nbeta 2 0.2\n   \ngamma 3 0.3\n";
        let rows: Vec<Row> = parse_records(text, &row_pattern(false), ListParsePolicy::Strict).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_strict_lines_fail_on_mismatch() {
        let text = "alpha 1 0.1\n--- 2 0.2\ngamma 3 0.3";
        let err = parse_records::<Row>(text, &row_pattern(false), ListParsePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            ConvertError::LineMismatch {
                line: "--- 2 0.2".to_string()
            }
        );
    }

    #[test]
    fn test_lenient_lines_skip_mismatch() {
        let text = "HEADER LINE HERE\nalpha 1 0.1\ngamma 3 0.3";
        let rows: Vec<Row> =
            parse_records(text, &row_pattern(false), ListParsePolicy::Lenient).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_multiline_global_match_ignores_noise() {
        let text = "\
total 16
-rw-r--r--  1 root wheel  512 Jul 10 14:26 notes.txt
drwxr-xr-x  3 root wheel 4096 Jan  2  2023 src

./src:
total 8
-rw-r--r--  1 root wheel  100 Mar  5 09:00 main.rs
";
        let pattern = ResultPattern::new(
            r"^(?P<Permissions>[-dlcbps][rwxsStT-]{9}[@+.]?)\s+(?P<LinkCount>\d+)\s+\S+\s+\S+\s+(?P<Size>\d+)\s+(?P<Date>\w{3}\s+\d{1,2}\s+(?:\d{1,2}:\d{2}|\d{4}))\s+(?P<Name>.+)$",
            true,
        )
        .unwrap();
        let entries: Vec<Entry> = parse_records(text, &pattern, ListParsePolicy::Strict).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "notes.txt");
        assert_eq!(entries[1].size, 4096);
        assert_eq!(entries[1].date.format("%Y-%m-%d").to_string(), "2023-01-02");
        assert_eq!(entries[2].permissions, "-rw-r--r--");
    }

    #[test]
    fn test_string_output_takes_first_group() {
        let pattern = ResultPattern::new("(.*)", false).unwrap();
        let out = String::from_pattern("myhost\n", &pattern, ListParsePolicy::Strict).unwrap();
        assert_eq!(out, "myhost");
    }

    #[test]
    fn test_record_output_reports_capture_fields() {
        let fields = <Vec<Row> as ActionOutput>::capture_fields().unwrap();
        assert_eq!(fields.len(), 3);
        assert!(<String as ActionOutput>::capture_fields().is_none());
    }
}
