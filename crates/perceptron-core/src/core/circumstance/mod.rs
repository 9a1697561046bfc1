//! Circumstances: the elementary conditions a situation is made of.
//!
//! A circumstance declares which [`ChannelType`] it consumes and how the
//! information found there reduces to a satisfaction score in `[0, 1]`. The
//! score is turned into a boolean through [`Circumstance::score_to_decision`].
//!
//! Circumstances are plain values: two independently constructed but equal
//! circumstances are interchangeable, and their [`fmt::Display`] form is the
//! canonical definition line accepted by the parser in [`parser`].

pub mod parser;

use crate::core::channels::ChannelType;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

pub use parser::{CircumstanceParseError, CircumstanceParseErrorKind, parse_circumstance};

/// Constraint on the number of lines matching a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CountConstraint {
    Exact(usize),
    Min(usize),
    Max(usize),
    Range { min: usize, max: usize },
}

impl CountConstraint {
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        match *self {
            CountConstraint::Exact(n) => count == n,
            CountConstraint::Min(min) => count >= min,
            CountConstraint::Max(max) => count <= max,
            CountConstraint::Range { min, max } => (min..=max).contains(&count),
        }
    }
}

/// Discriminator of the circumstance variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircumstanceKind {
    MatchText,
    CountTextMatches,
    LoopCounter,
}

impl fmt::Display for CircumstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CircumstanceKind::MatchText => "MatchText",
                CircumstanceKind::CountTextMatches => "CountTextMatches",
                CircumstanceKind::LoopCounter => "LoopCounter",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Circumstance {
    /// Satisfied when a line of the channel matches `pattern` (or, when
    /// negated, when no line does).
    MatchText {
        channel: ChannelType,
        pattern: String,
        negation: bool,
    },
    /// Satisfied when the number of matching lines fulfils `constraint`.
    /// Negation inverts the verdict, not the count.
    CountTextMatches {
        channel: ChannelType,
        pattern: String,
        constraint: CountConstraint,
        negation: bool,
    },
    /// Satisfied when the value of the named counter lies in `[min, max]`.
    LoopCounter {
        channel: ChannelType,
        counter_id: String,
        min: i64,
        max: i64,
    },
}

impl Circumstance {
    pub fn matches(channel: ChannelType, pattern: impl Into<String>) -> Self {
        Self::match_text(channel, pattern, false)
    }

    pub fn no_match(channel: ChannelType, pattern: impl Into<String>) -> Self {
        Self::match_text(channel, pattern, true)
    }

    pub fn match_text(channel: ChannelType, pattern: impl Into<String>, negation: bool) -> Self {
        Circumstance::MatchText {
            channel,
            pattern: pattern.into(),
            negation,
        }
    }

    pub fn count_matches(
        channel: ChannelType,
        pattern: impl Into<String>,
        constraint: CountConstraint,
        negation: bool,
    ) -> Self {
        Circumstance::CountTextMatches {
            channel,
            pattern: pattern.into(),
            constraint,
            negation,
        }
    }

    pub fn loop_counter(
        channel: ChannelType,
        counter_id: impl Into<String>,
        min: i64,
        max: i64,
    ) -> Self {
        Circumstance::LoopCounter {
            channel,
            counter_id: counter_id.into(),
            min,
            max,
        }
    }

    pub fn kind(&self) -> CircumstanceKind {
        match self {
            Circumstance::MatchText { .. } => CircumstanceKind::MatchText,
            Circumstance::CountTextMatches { .. } => CircumstanceKind::CountTextMatches,
            Circumstance::LoopCounter { .. } => CircumstanceKind::LoopCounter,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            Circumstance::MatchText { channel, .. }
            | Circumstance::CountTextMatches { channel, .. }
            | Circumstance::LoopCounter { channel, .. } => *channel,
        }
    }

    pub fn requires_text_match(&self) -> bool {
        self.text_pattern().is_some()
    }

    /// The pattern to search for, if this circumstance is evaluated on text.
    pub fn text_pattern(&self) -> Option<&str> {
        match self {
            Circumstance::MatchText { pattern, .. }
            | Circumstance::CountTextMatches { pattern, .. } => Some(pattern),
            Circumstance::LoopCounter { .. } => None,
        }
    }

    /// Scores the lines of one channel that matched [`Self::text_pattern`].
    ///
    /// Returns `None` for circumstances that are not evaluated on text.
    pub fn score_text(&self, matches: &[String]) -> Option<f64> {
        match self {
            Circumstance::MatchText { negation, .. } => {
                Some(match_text_score(matches.len(), *negation))
            }
            Circumstance::CountTextMatches {
                constraint,
                negation,
                ..
            } => Some(count_matches_score(matches.len(), constraint, *negation)),
            Circumstance::LoopCounter { .. } => None,
        }
    }

    /// Scores the value of a counter. Returns `None` for text circumstances.
    pub fn score_counter(&self, value: i64) -> Option<f64> {
        match self {
            Circumstance::LoopCounter { min, max, .. } => Some(as_score((*min..=*max).contains(&value))),
            _ => None,
        }
    }

    pub fn counter_id(&self) -> Option<&str> {
        match self {
            Circumstance::LoopCounter { counter_id, .. } => Some(counter_id),
            _ => None,
        }
    }

    /// Threshold rule turning an accumulated score into a satisfaction flag.
    pub fn score_to_decision(&self, score: f64) -> bool {
        score > 0.0
    }
}

fn as_score(satisfied: bool) -> f64 {
    if satisfied { 1.0 } else { 0.0 }
}

fn match_text_score(num_matches: usize, negation: bool) -> f64 {
    as_score((num_matches > 0) != negation)
}

fn count_matches_score(num_matches: usize, constraint: &CountConstraint, negation: bool) -> f64 {
    as_score(constraint.is_satisfied_by(num_matches) != negation)
}

/// Rewrites whitespace in a regular expression as escapes, so that the
/// pattern stays a single word of a `MATCHESCOUNT` definition line while
/// matching the same lines.
fn escape_whitespace(pattern: &str) -> Cow<'_, str> {
    if !pattern.chars().any(char::is_whitespace) {
        return Cow::Borrowed(pattern);
    }
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut escaped = false;
    for c in pattern.chars() {
        if c.is_whitespace() {
            // An escaping backslash is already written and becomes the
            // backslash of the replacement.
            if !escaped {
                out.push('\\');
            }
            match c {
                ' ' => out.push_str("x20"),
                '\t' => out.push('t'),
                '\n' => out.push('n'),
                '\r' => out.push('r'),
                other => out.push_str(&format!("x{{{:X}}}", other as u32)),
            }
            escaped = false;
            continue;
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    Cow::Owned(out)
}

impl fmt::Display for Circumstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Circumstance::MatchText {
                channel,
                pattern,
                negation,
            } => {
                let keyword = if *negation {
                    parser::NOMATCH
                } else {
                    parser::MATCHES
                };
                write!(f, "{} {} {}", channel, keyword, pattern)
            }
            Circumstance::CountTextMatches {
                channel,
                pattern,
                constraint,
                negation,
            } => {
                write!(
                    f,
                    "{} {} {} ",
                    channel,
                    parser::MATCHESCOUNT,
                    escape_whitespace(pattern)
                )?;
                match constraint {
                    CountConstraint::Exact(n) => write!(f, "{}", n)?,
                    CountConstraint::Min(n) => write!(f, "{} MIN", n)?,
                    CountConstraint::Max(n) => write!(f, "{} MAX", n)?,
                    CountConstraint::Range { min, max } => write!(f, "{} {}", min, max)?,
                }
                if *negation {
                    write!(f, " NOT")?;
                }
                Ok(())
            }
            Circumstance::LoopCounter {
                channel,
                counter_id,
                min,
                max,
            } => {
                write!(f, "{} {} ", channel, parser::LOOPCOUNTER)?;
                match (*min == i64::MIN, *max == i64::MAX) {
                    (true, false) => write!(f, "{} < {}", counter_id, max),
                    (false, true) | (true, true) => write!(f, "{} > {}", counter_id, min),
                    (false, false) => write!(f, "{} > {} > {}", max, counter_id, min),
                }
            }
        }
    }
}
