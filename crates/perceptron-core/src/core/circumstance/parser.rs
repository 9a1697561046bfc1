use super::{Circumstance, CountConstraint};
use crate::core::channels::ChannelType;
use std::str::FromStr;
use thiserror::Error;

pub(crate) const MATCHES: &str = "MATCHES";
pub(crate) const NOMATCH: &str = "NOMATCH";
pub(crate) const MATCHESCOUNT: &str = "MATCHESCOUNT";
pub(crate) const LOOPCOUNTER: &str = "LOOPCOUNTER";

const MIN: &str = "MIN";
const MAX: &str = "MAX";
const NOT: &str = "NOT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot parse circumstance '{line}': {kind}")]
pub struct CircumstanceParseError {
    pub line: String,
    pub kind: CircumstanceParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircumstanceParseErrorKind {
    #[error("expected '<channel type> <kind> <arguments>'")]
    MissingTokens,
    #[error("unknown channel type '{0}'")]
    UnknownChannelType(String),
    #[error("unknown circumstance kind '{0}'")]
    UnknownKind(String),
    #[error("missing pattern")]
    MissingPattern,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid comparison operator '{0}' (expected '<' or '>')")]
    InvalidOperator(String),
    #[error("lower bound {lower} is greater than upper bound {upper}")]
    InconsistentRange { lower: i64, upper: i64 },
    #[error("malformed count specification (expected '<pattern> <n> [MIN|MAX]' or '<pattern> <min> <max> [NOT]')")]
    MalformedCount,
    #[error("malformed counter condition (expected e.g. 'id > n', 'n < id', or 'n > id > m')")]
    MalformedLoopCounter,
}

/// Parses one circumstance definition line.
///
/// The line is `<ChannelType> <Kind> <arguments>`. Channel type and kind are
/// case-insensitive. For `MATCHES` and `NOMATCH` the rest of the line is the
/// pattern and may contain whitespace; for the other kinds the arguments are
/// whitespace-separated words.
pub fn parse_circumstance(line: &str) -> Result<Circumstance, CircumstanceParseError> {
    parse_words(line.trim()).map_err(|kind| CircumstanceParseError {
        line: line.to_string(),
        kind,
    })
}

impl FromStr for Circumstance {
    type Err = CircumstanceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_circumstance(s)
    }
}

fn parse_words(line: &str) -> Result<Circumstance, CircumstanceParseErrorKind> {
    let mut words = line.split_whitespace();
    let (Some(type_word), Some(kind_word)) = (words.next(), words.next()) else {
        return Err(CircumstanceParseErrorKind::MissingTokens);
    };
    let channel = ChannelType::from_str(type_word)
        .map_err(|_| CircumstanceParseErrorKind::UnknownChannelType(type_word.to_string()))?;
    let args: Vec<&str> = words.collect();

    match kind_word.to_ascii_uppercase().as_str() {
        MATCHES | NOMATCH => {
            let rest = line[type_word.len()..].trim_start();
            let pattern = rest[kind_word.len()..].trim();
            if pattern.is_empty() {
                return Err(CircumstanceParseErrorKind::MissingPattern);
            }
            let negation = kind_word.eq_ignore_ascii_case(NOMATCH);
            Ok(Circumstance::match_text(channel, pattern, negation))
        }
        MATCHESCOUNT => parse_count(channel, &args),
        LOOPCOUNTER => parse_loop_counter(channel, &args),
        _ => Err(CircumstanceParseErrorKind::UnknownKind(kind_word.to_string())),
    }
}

fn parse_count(
    channel: ChannelType,
    args: &[&str],
) -> Result<Circumstance, CircumstanceParseErrorKind> {
    let Some((pattern, spec)) = args.split_first() else {
        return Err(CircumstanceParseErrorKind::MissingPattern);
    };

    let (spec, negation) = match spec.split_last() {
        Some((last, head)) if last.eq_ignore_ascii_case(NOT) => (head, true),
        _ => (spec, false),
    };

    let constraint = match spec {
        [n] => CountConstraint::Exact(parse_count_number(n)?),
        [n, bound] if bound.eq_ignore_ascii_case(MIN) => {
            CountConstraint::Min(parse_count_number(n)?)
        }
        [n, bound] if bound.eq_ignore_ascii_case(MAX) => {
            CountConstraint::Max(parse_count_number(n)?)
        }
        [min, max] => {
            let min = parse_count_number(min)?;
            let max = parse_count_number(max)?;
            if min > max {
                return Err(CircumstanceParseErrorKind::InconsistentRange {
                    lower: min as i64,
                    upper: max as i64,
                });
            }
            CountConstraint::Range { min, max }
        }
        _ => return Err(CircumstanceParseErrorKind::MalformedCount),
    };

    Ok(Circumstance::count_matches(
        channel, *pattern, constraint, negation,
    ))
}

fn parse_count_number(word: &str) -> Result<usize, CircumstanceParseErrorKind> {
    word.parse()
        .map_err(|_| CircumstanceParseErrorKind::InvalidNumber(word.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Less,
    Greater,
}

fn parse_operator(word: &str) -> Result<Comparison, CircumstanceParseErrorKind> {
    match word {
        "<" => Ok(Comparison::Less),
        ">" => Ok(Comparison::Greater),
        other => Err(CircumstanceParseErrorKind::InvalidOperator(other.to_string())),
    }
}

fn parse_bound(word: &str) -> Result<i64, CircumstanceParseErrorKind> {
    word.parse()
        .map_err(|_| CircumstanceParseErrorKind::InvalidNumber(word.to_string()))
}

fn parse_loop_counter(
    channel: ChannelType,
    args: &[&str],
) -> Result<Circumstance, CircumstanceParseErrorKind> {
    let counter = |id: &str, min: i64, max: i64| Circumstance::loop_counter(channel, id, min, max);

    let Some(first) = args.first() else {
        return Err(CircumstanceParseErrorKind::MalformedLoopCounter);
    };

    if first.parse::<i64>().is_err() {
        // <id> <op> <n>
        let [id, op, n] = args else {
            return Err(CircumstanceParseErrorKind::MalformedLoopCounter);
        };
        let n = parse_bound(n)?;
        return Ok(match parse_operator(op)? {
            Comparison::Greater => counter(*id, n, i64::MAX),
            Comparison::Less => counter(*id, i64::MIN, n),
        });
    }

    match args {
        [n, op, id] => {
            let n = parse_bound(n)?;
            Ok(match parse_operator(op)? {
                Comparison::Less => counter(*id, n, i64::MAX),
                Comparison::Greater => counter(*id, i64::MIN, n),
            })
        }
        [n, op1, id, op2, m] => {
            let n = parse_bound(n)?;
            let m = parse_bound(m)?;
            let (lower, upper) = match (parse_operator(op1)?, parse_operator(op2)?) {
                (Comparison::Greater, Comparison::Greater) => (m, n),
                (Comparison::Less, Comparison::Less) => (n, m),
                _ => return Err(CircumstanceParseErrorKind::MalformedLoopCounter),
            };
            if lower > upper {
                return Err(CircumstanceParseErrorKind::InconsistentRange { lower, upper });
            }
            Ok(counter(*id, lower, upper))
        }
        _ => Err(CircumstanceParseErrorKind::MalformedLoopCounter),
    }
}
