//! Path exclusions for exchange logging.
//!
//! # Responsibilities
//! - Parse `logbook.exclude` patterns once at startup
//! - Decide, from the path alone, whether an exchange is logged
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/management/**` and `/actuator/**` are always excluded
//! - No regex: patterns are segment lists matched in O(segments)

use thiserror::Error;

/// Paths that are never logged.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["/management/**", "/actuator/**"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExclusionError {
    #[error("pattern '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("pattern '{0}': '**' is only allowed as the last segment")]
    MisplacedDoubleStar(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    /// `*`: exactly one segment.
    Any,
}

/// One parsed exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PatternSegment>,
    /// Trailing `/**`: the pattern also matches anything below it.
    subtree: bool,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, ExclusionError> {
        let trimmed = pattern.trim();
        if !trimmed.starts_with('/') {
            return Err(ExclusionError::NotAbsolute(pattern.to_string()));
        }

        let parts: Vec<&str> = split_segments(trimmed).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut subtree = false;
        for (i, part) in parts.iter().enumerate() {
            match *part {
                "**" if i + 1 == parts.len() => subtree = true,
                "**" => return Err(ExclusionError::MisplacedDoubleStar(pattern.to_string())),
                "*" => segments.push(PatternSegment::Any),
                literal => segments.push(PatternSegment::Literal(literal.to_string())),
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
            subtree,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() < self.segments.len() {
            return false;
        }
        if !self.subtree && parts.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                PatternSegment::Any => true,
                PatternSegment::Literal(literal) => literal == part,
            })
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// The full exclusion list: defaults plus configured patterns.
#[derive(Debug, Clone)]
pub struct PathExclusions {
    patterns: Vec<PathPattern>,
}

impl Default for PathExclusions {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUSIONS
                .iter()
                .filter_map(|p| PathPattern::parse(p).ok())
                .collect(),
        }
    }
}

impl PathExclusions {
    /// Defaults extended with `extra`.
    pub fn with_patterns<S: AsRef<str>>(extra: &[S]) -> Result<Self, ExclusionError> {
        let mut exclusions = Self::default();
        for pattern in extra {
            let parsed = PathPattern::parse(pattern.as_ref())?;
            if !exclusions.patterns.contains(&parsed) {
                exclusions.patterns.push(parsed);
            }
        }
        Ok(exclusions)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}
