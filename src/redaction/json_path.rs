//! Root-anchored path expressions over JSON documents.
//!
//! Supported forms: `$`, `$.a.b`, `$.a[0]`, `$.a[*]`, `$.*`, `$['a b']`.
//! A label without the leading `$` (e.g. `user.notes`) is read as `$.user.notes`.

use serde_json::Value;

use crate::redaction::rules::RedactionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self, RedactionError> {
        let trimmed = expression.trim();
        let anchored = match trimmed.strip_prefix('$') {
            Some(rest) => rest.to_string(),
            None if trimmed.starts_with('[') => trimmed.to_string(),
            None => format!(".{trimmed}"),
        };

        let segments = parse_segments(&anchored).map_err(|reason| RedactionError::InvalidPath {
            expression: expression.to_string(),
            reason,
        })?;

        Ok(Self {
            expression: format!("${anchored}"),
            segments,
        })
    }

    /// Normalized expression, always starting with `$`.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Call `f` on every value selected by this path.
    pub fn for_each_mut(&self, document: &mut Value, f: &mut dyn FnMut(&mut Value)) {
        visit(document, &self.segments, f);
    }
}

fn visit(value: &mut Value, segments: &[Segment], f: &mut dyn FnMut(&mut Value)) {
    let Some((head, rest)) = segments.split_first() else {
        f(value);
        return;
    };

    match (head, value) {
        (Segment::Field(name), Value::Object(map)) => {
            if let Some(child) = map.get_mut(name) {
                visit(child, rest, f);
            }
        }
        (Segment::Index(index), Value::Array(items)) => {
            if let Some(child) = items.get_mut(*index) {
                visit(child, rest, f);
            }
        }
        (Segment::Wildcard, Value::Object(map)) => {
            for child in map.values_mut() {
                visit(child, rest, f);
            }
        }
        (Segment::Wildcard, Value::Array(items)) => {
            for child in items.iter_mut() {
                visit(child, rest, f);
            }
        }
        _ => {}
    }
}

fn parse_segments(input: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    segments.push(Segment::Wildcard);
                    continue;
                }
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '.' || next == '[' {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    return Err("empty field name (recursive descent is not supported)".to_string());
                }
                segments.push(Segment::Field(name));
            }
            '[' => match chars.peek() {
                Some(&quote) if quote == '\'' || quote == '"' => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some(ch) if ch == quote => break,
                            Some(ch) => name.push(ch),
                            None => return Err("unterminated quoted field".to_string()),
                        }
                    }
                    if chars.next() != Some(']') {
                        return Err("expected ']' after quoted field".to_string());
                    }
                    segments.push(Segment::Field(name));
                }
                _ => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for ch in chars.by_ref() {
                        if ch == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(ch);
                    }
                    if !closed {
                        return Err("missing ']'".to_string());
                    }
                    let inner = inner.trim();
                    if inner == "*" {
                        segments.push(Segment::Wildcard);
                    } else {
                        let index = inner
                            .parse::<usize>()
                            .map_err(|_| format!("invalid index '{inner}'"))?;
                        segments.push(Segment::Index(index));
                    }
                }
            },
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(segments)
}
