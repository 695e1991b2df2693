//! Command template substitution
//!
//! Two placeholder kinds are supported:
//!
//! - `{name}` is replaced by the argument's string form
//! - `?[name]` marks a boolean flag; the literal text glued to the marker is
//!   kept when the argument is true and removed with it when false
//!
//! Placeholders that do not correspond to an argument are left verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::convert::{snake_to_camel, TemplateValue};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Substitute `values` (Rust field names and their template values) into
/// `template` and normalize whitespace.
pub fn render(template: &str, values: &[(&str, TemplateValue)]) -> String {
    let mut command = template.to_string();

    for (field, value) in values {
        let name = snake_to_camel(field);
        match value {
            TemplateValue::Flag(true) => {
                command = command.replace(&format!("?[{}]", name), "");
            }
            TemplateValue::Flag(false) => {
                command = remove_flag(&command, &format!("?[{}]", name));
            }
            TemplateValue::Text(text) => {
                command = command.replace(&format!("{{{}}}", name), text);
            }
        }
    }

    normalize_whitespace(&command)
}

/// Collapse whitespace runs to a single space and trim.
pub fn normalize_whitespace(command: &str) -> String {
    WHITESPACE.replace_all(command, " ").trim().to_string()
}

/// Remove every `marker` together with the non-whitespace run that follows it.
fn remove_flag(command: &str, marker: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;
    while let Some(pos) = rest.find(marker) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + marker.len()..];
        let flag_len = after
            .find(char::is_whitespace)
            .unwrap_or(after.len());
        rest = &after[flag_len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TemplateValue {
        TemplateValue::Text(s.to_string())
    }

    #[test]
    fn test_flag_true_and_false_collapse_to_single_spaces() {
        let template = "ls -la ?[recursive]-R {path}";

        let on = render(
            template,
            &[("recursive", TemplateValue::Flag(true)), ("path", text("/tmp"))],
        );
        assert_eq!(on, "ls -la -R /tmp");

        let off = render(
            template,
            &[("recursive", TemplateValue::Flag(false)), ("path", text("/tmp"))],
        );
        assert_eq!(off, "ls -la /tmp");
    }

    #[test]
    fn test_flag_false_removes_exactly_one_token() {
        let out = render(
            "ls -l ?[recursive]-R ?[showHidden]-A {path}",
            &[
                ("recursive", TemplateValue::Flag(false)),
                ("show_hidden", TemplateValue::Flag(true)),
                ("path", text("/var/log")),
            ],
        );
        assert_eq!(out, "ls -l -A /var/log");
    }

    #[test]
    fn test_unknown_placeholders_are_left_verbatim() {
        let out = render(
            "docker ps --format '{{.ID}}' {limit} ?[verbose]-v",
            &[("path", text("/tmp"))],
        );
        assert_eq!(out, "docker ps --format '{{.ID}}' {limit} ?[verbose]-v");
    }

    #[test]
    fn test_camel_cased_placeholder_names() {
        let out = render("du -d {maxDepth} {path}", &[("max_depth", text("2")), ("path", text("~"))]);
        assert_eq!(out, "du -d 2 ~");
    }

    #[test]
    fn test_empty_values_normalize_away() {
        let out = render("journalctl   {lines}\n  --reverse ", &[("lines", text(""))]);
        assert_eq!(out, "journalctl --reverse");
    }
}
