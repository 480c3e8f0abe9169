//! Redaction rule building blocks.
//!
//! # Responsibilities
//! - Hold the built-in sensitive names that are always redacted
//! - Name sets for headers, query parameters and body fields
//! - Per-group compiled matchers for path-expression redaction
//!
//! # Design Decisions
//! - Configured names are added to the built-in ones, never replace them
//! - Regex alternations are compiled once when configuration loads
//! - A value equal to [`REPLACEMENT`] is never touched again, nor is a
//!   pattern match lying wholly inside a run of replacement characters

use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

use regex::{Captures, Regex, RegexBuilder};
use serde_json::Value;
use thiserror::Error;

use crate::redaction::json_path::JsonPath;

/// Literal written in place of every redacted value.
pub const REPLACEMENT: &str = "XXX";

/// The single character [`REPLACEMENT`] is made of.
const REPLACEMENT_BYTE: u8 = b'X';

/// Headers redacted regardless of configuration.
pub const BASELINE_HEADERS: &[&str] = &["authorization", "proxy-authorization"];

/// Query parameters redacted regardless of configuration.
pub const BASELINE_PARAMETERS: &[&str] = &["access_token"];

/// Body fields redacted regardless of configuration.
pub const BASELINE_BODY_FIELDS: &[&str] = &["access_token", "refresh_token", "id_token", "open_id"];

/// Errors raised while compiling redaction rules.
#[derive(Debug, Error)]
pub enum RedactionError {
    #[error("invalid path expression '{expression}': {reason}")]
    InvalidPath { expression: String, reason: String },

    #[error("group '{group}' has no patterns")]
    EmptyGroup { group: String },

    #[error("group '{group}': {source}")]
    InvalidPattern {
        group: String,
        #[source]
        source: regex::Error,
    },

    #[error("group '{group}': pattern {reason}")]
    UnstablePattern { group: String, reason: &'static str },
}

/// A set of names matched exactly, optionally ignoring ASCII case.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    names: HashSet<String>,
    fold_case: bool,
}

impl NameSet {
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            fold_case: false,
        }
    }

    pub fn case_insensitive<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.into().to_ascii_lowercase())
                .collect(),
            fold_case: true,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        if self.fold_case {
            self.names.contains(&name.to_ascii_lowercase())
        } else {
            self.names.contains(name)
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Replace the value of every property named in `fields`, at any depth.
///
/// Returns the number of values replaced.
pub fn redact_fields(value: &mut Value, fields: &NameSet) -> usize {
    match value {
        Value::Object(map) => {
            let mut replaced = 0;
            for (key, child) in map.iter_mut() {
                if fields.contains(key) {
                    if !child.is_null() && !is_replacement(child) {
                        *child = Value::String(REPLACEMENT.to_string());
                        replaced += 1;
                    }
                } else {
                    replaced += redact_fields(child, fields);
                }
            }
            replaced
        }
        Value::Array(items) => items.iter_mut().map(|item| redact_fields(item, fields)).sum(),
        _ => 0,
    }
}

fn is_replacement(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == REPLACEMENT)
}

/// A path expression paired with the alternation of its group's patterns.
#[derive(Debug, Clone)]
pub struct JsonPathRule {
    group: String,
    path: JsonPath,
    matcher: Regex,
}

impl JsonPathRule {
    /// Compile a configured group. The label is the path expression; the
    /// patterns become one multi-line alternation.
    pub fn compile(label: &str, patterns: &[String]) -> Result<Self, RedactionError> {
        let path = JsonPath::parse(label)?;
        if patterns.is_empty() {
            return Err(RedactionError::EmptyGroup {
                group: label.to_string(),
            });
        }

        let alternation = patterns
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = RegexBuilder::new(&alternation)
            .multi_line(true)
            .build()
            .map_err(|source| RedactionError::InvalidPattern {
                group: label.to_string(),
                source,
            })?;

        // Re-running the pipeline on its own output must not change it.
        if matcher.is_match("") {
            return Err(RedactionError::UnstablePattern {
                group: label.to_string(),
                reason: "matches the empty string",
            });
        }
        if let Some(m) = matcher.find(REPLACEMENT) {
            if m.as_str() != REPLACEMENT {
                return Err(RedactionError::UnstablePattern {
                    group: label.to_string(),
                    reason: "matches inside the replacement literal",
                });
            }
        }

        Ok(Self {
            group: label.to_string(),
            path,
            matcher,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Replace matches inside every value the path selects. Returns the
    /// number of values changed.
    pub fn apply(&self, document: &mut Value) -> usize {
        let mut replaced = 0;
        self.path
            .for_each_mut(document, &mut |value| replaced += self.replace_matches(value));
        replaced
    }

    fn replace_matches(&self, value: &mut Value) -> usize {
        match value {
            Value::String(s) => {
                if s == REPLACEMENT {
                    return 0;
                }
                match self.redact_text(s) {
                    Some(redacted) => {
                        *s = redacted;
                        1
                    }
                    None => 0,
                }
            }
            Value::Number(_) | Value::Bool(_) => match self.redact_text(&value.to_string()) {
                Some(redacted) => {
                    *value = Value::String(redacted);
                    1
                }
                None => 0,
            },
            Value::Object(map) => map.values_mut().map(|v| self.replace_matches(v)).sum(),
            Value::Array(items) => items.iter_mut().map(|v| self.replace_matches(v)).sum(),
            Value::Null => 0,
        }
    }

    /// `text` with every match replaced, or `None` when nothing changed.
    ///
    /// Adjacent replacements form longer runs of the replacement character,
    /// so a match that falls entirely inside such a run is kept as is.
    fn redact_text(&self, text: &str) -> Option<String> {
        let runs = replacement_runs(text);
        let redacted = self.matcher.replace_all(text, |caps: &Captures<'_>| match caps.get(0) {
            Some(m) if runs.iter().any(|r| r.start <= m.start() && m.end() <= r.end) => {
                m.as_str().to_string()
            }
            _ => REPLACEMENT.to_string(),
        });
        match redacted {
            Cow::Owned(redacted) if redacted != text => Some(redacted),
            _ => None,
        }
    }
}

/// Byte ranges of `text` made only of the replacement character and at least
/// as long as [`REPLACEMENT`].
fn replacement_runs(text: &str) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, byte) in text.bytes().chain(std::iter::once(0)).enumerate() {
        match (byte == REPLACEMENT_BYTE, start) {
            (true, None) => start = Some(i),
            (false, Some(from)) => {
                if i - from >= REPLACEMENT.len() {
                    runs.push(from..i);
                }
                start = None;
            }
            _ => {}
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_sets() {
        let headers = NameSet::case_insensitive(["Authorization"]);
        assert!(headers.contains("authorization"));
        assert!(headers.contains("AUTHORIZATION"));

        let params = NameSet::exact(["token"]);
        assert!(params.contains("token"));
        assert!(!params.contains("Token"));
    }

    #[test]
    fn test_fields_redacted_at_any_depth() {
        let fields = NameSet::exact(["password"]);
        let mut doc = json!({
            "password": "top",
            "user": {"password": "secret", "name": "ann"},
            "history": [{"password": 1234}, {"password": null}]
        });
        assert_eq!(redact_fields(&mut doc, &fields), 3);
        assert_eq!(
            doc,
            json!({
                "password": "XXX",
                "user": {"password": "XXX", "name": "ann"},
                "history": [{"password": "XXX"}, {"password": null}]
            })
        );
        assert_eq!(redact_fields(&mut doc, &fields), 0);
    }

    #[test]
    fn test_path_rule_replaces_matches_only() {
        let rule = JsonPathRule::compile(
            "user.notes",
            &[r"\d{4}-\d{4}".to_string(), "secret".to_string()],
        )
        .unwrap();
        let mut doc = json!({"user": {"notes": "card 1234-5678 is secret"}, "notes": "secret"});
        assert_eq!(rule.apply(&mut doc), 1);
        assert_eq!(doc["user"]["notes"], "card XXX is XXX");
        assert_eq!(doc["notes"], "secret");
        assert_eq!(rule.apply(&mut doc), 0);
    }

    #[test]
    fn test_path_rule_on_numbers_and_containers() {
        let rule = JsonPathRule::compile("$.accounts[*]", &[r"\d{6,}".to_string()]).unwrap();
        let mut doc = json!({"accounts": [12345678, {"iban": "DE0012345678"}, "n/a"]});
        assert_eq!(rule.apply(&mut doc), 2);
        assert_eq!(doc, json!({"accounts": ["XXX", {"iban": "DEXXX"}, "n/a"]}));
    }

    #[test]
    fn test_whole_value_pattern_is_stable() {
        let rule = JsonPathRule::compile("token", &[".+".to_string()]).unwrap();
        let mut doc = json!({"token": "abc"});
        rule.apply(&mut doc);
        assert_eq!(doc["token"], "XXX");
        assert_eq!(rule.apply(&mut doc), 0);
    }

    #[test]
    fn test_adjacent_replacements_stay_stable() {
        let rule = JsonPathRule::compile("note", &["a".to_string(), "X{4}".to_string()]).unwrap();
        let mut doc = json!({"note": "aa"});
        assert_eq!(rule.apply(&mut doc), 1);
        assert_eq!(doc["note"], "XXXXXX");
        assert_eq!(rule.apply(&mut doc), 0);
        assert_eq!(doc["note"], "XXXXXX");

        let mut doc = json!({"note": "XXXXa"});
        rule.apply(&mut doc);
        assert_eq!(doc["note"], "XXXXXXX");
        assert_eq!(rule.apply(&mut doc), 0);
    }

    #[test]
    fn test_replacement_runs() {
        assert_eq!(replacement_runs("aXXXbXXc"), vec![1..4]);
        assert_eq!(replacement_runs("XXXXXX"), vec![0..6]);
        assert!(replacement_runs("abc").is_empty());
    }

    #[test]
    fn test_compile_rejections() {
        assert!(matches!(
            JsonPathRule::compile("a", &[]),
            Err(RedactionError::EmptyGroup { .. })
        ));
        assert!(matches!(
            JsonPathRule::compile("a", &["(".to_string()]),
            Err(RedactionError::InvalidPattern { .. })
        ));
        assert!(matches!(
            JsonPathRule::compile("a", &["x*".to_string()]),
            Err(RedactionError::UnstablePattern { .. })
        ));
        assert!(matches!(
            JsonPathRule::compile("a", &["X".to_string()]),
            Err(RedactionError::UnstablePattern { .. })
        ));
        assert!(matches!(
            JsonPathRule::compile("a..b", &["x".to_string()]),
            Err(RedactionError::InvalidPath { .. })
        ));
    }
}
