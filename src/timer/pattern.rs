//! Display patterns for the remaining time.
//!
//! A pattern is a sequence of letter runs and literal text:
//! - `m` runs render minutes, `s` runs render seconds, `h`/`H` runs render hours
//! - the run length is the minimum zero-padded width (`mm` → `05`, `m` → `5`)
//! - text inside single quotes is copied verbatim, `''` is a single quote
//!
//! Without an hour token the minute field carries the total minutes, so
//! `mm:ss` renders 75 minutes as `75:00`. With one, minutes wrap at 60.

use std::fmt::{self, Write};

use crate::types::PatternStrictness;

/// Patterns accepted under [`PatternStrictness::Strict`], compared case-insensitively.
pub const STRICT_PATTERNS: [&str; 6] = ["mm:ss", "m:s", "mm", "ss", "m", "s"];

/// The pattern used until `set_timer_pattern` applies another one.
pub const DEFAULT_PATTERN: &str = "mm:ss";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Hours(usize),
    Minutes(usize),
    Seconds(usize),
    Literal(String),
}

// ============================================================================
// TimePattern
// ============================================================================

/// A validated display pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePattern {
    source: String,
    segments: Vec<Segment>,
}

impl TimePattern {
    /// Parses `pattern` under the given strictness.
    ///
    /// Returns `None` when the pattern is empty, blank, or not accepted.
    ///
    /// # Example
    ///
    /// ```
    /// use countdown::timer::TimePattern;
    /// use countdown::types::PatternStrictness;
    ///
    /// let pattern = TimePattern::parse("m:s", PatternStrictness::Strict).unwrap();
    /// assert_eq!(pattern.format(3, 7), "3:7");
    /// assert!(TimePattern::parse("hh:mm:ss", PatternStrictness::Strict).is_none());
    /// ```
    pub fn parse(pattern: &str, strictness: PatternStrictness) -> Option<Self> {
        match strictness {
            PatternStrictness::Strict => {
                let allowed = STRICT_PATTERNS
                    .iter()
                    .find(|allowed| allowed.eq_ignore_ascii_case(pattern))?;
                Self::tokenize(allowed)
            }
            PatternStrictness::Loose => {
                if pattern.trim().is_empty() {
                    return None;
                }
                Self::tokenize(pattern)
            }
        }
    }

    fn tokenize(pattern: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                'h' | 'H' | 'm' | 's' => {
                    let mut width = 1;
                    while chars.peek() == Some(&c) {
                        chars.next();
                        width += 1;
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(match c {
                        'm' => Segment::Minutes(width),
                        's' => Segment::Seconds(width),
                        _ => Segment::Hours(width),
                    });
                }
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                        continue;
                    }
                    loop {
                        match chars.next() {
                            // unterminated quote
                            None => return None,
                            Some('\'') if chars.peek() == Some(&'\'') => {
                                chars.next();
                                literal.push('\'');
                            }
                            Some('\'') => break,
                            Some(quoted) => literal.push(quoted),
                        }
                    }
                }
                c if c.is_ascii_alphabetic() => return None,
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Some(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Returns the pattern text as it was applied.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Renders the remaining time.
    ///
    /// The minutes field is a clock field and always wraps at 60; whole hours
    /// only appear through an hour token.
    pub fn format(&self, minutes: u32, seconds: u32) -> String {
        let (hours, minutes) = (minutes / 60, minutes % 60);

        let mut out = String::new();
        for segment in &self.segments {
            // Writing into a String cannot fail.
            let _ = match segment {
                Segment::Hours(width) => write!(out, "{:0width$}", hours, width = *width),
                Segment::Minutes(width) => write!(out, "{:0width$}", minutes, width = *width),
                Segment::Seconds(width) => write!(out, "{:0width$}", seconds, width = *width),
                Segment::Literal(text) => out.write_str(text),
            };
        }
        out
    }
}

impl Default for TimePattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_PATTERN.to_string(),
            segments: vec![
                Segment::Minutes(2),
                Segment::Literal(":".to_string()),
                Segment::Seconds(2),
            ],
        }
    }
}

impl fmt::Display for TimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ============================================================================
// Tests
// ============================================================================
