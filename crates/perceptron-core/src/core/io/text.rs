use regex::{Regex, RegexSet};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum LineMatchError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("I/O error while reading lines: {0}")]
    Io(#[from] io::Error),
}

/// A batch of whole-line patterns evaluated in a single pass over a reader.
///
/// A pattern matches a line only if it matches the entire line (the pattern is
/// anchored at both ends). Matching never spans lines.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    patterns: Vec<String>,
    set: RegexSet,
}

impl LineMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, LineMatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let set = RegexSet::new(patterns.iter().map(|p| anchored(p))).map_err(|e| {
            // Report the first offending pattern rather than the whole set.
            let pattern = patterns
                .iter()
                .find(|p| Regex::new(&anchored(p)).is_err())
                .cloned()
                .unwrap_or_default();
            LineMatchError::InvalidPattern { pattern, source: e }
        })?;
        Ok(Self { patterns, set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Reads `reader` to the end and returns, for each pattern, the lines it
    /// matched in reading order.
    pub fn scan(&self, mut reader: impl BufRead) -> io::Result<Vec<Vec<String>>> {
        let mut matches = vec![Vec::new(); self.patterns.len()];
        if self.patterns.is_empty() {
            return Ok(matches);
        }

        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(trim_line_ending(&buffer));
            let hits = self.set.matches(&line);
            if !hits.matched_any() {
                continue;
            }
            for index in hits.iter() {
                trace!(pattern = %self.patterns[index], line = %line, "Line matched.");
                matches[index].push(line.to_string());
            }
        }
        Ok(matches)
    }
}

/// Collects, per pattern, the lines of `reader` matched in full by that
/// pattern.
pub fn extract_line_matches<S: AsRef<str>>(
    reader: impl BufRead,
    patterns: &[S],
) -> Result<Vec<Vec<String>>, LineMatchError> {
    let matcher = LineMatcher::new(patterns.iter().map(|p| p.as_ref().to_string()))?;
    Ok(matcher.scan(reader)?)
}

fn anchored(pattern: &str) -> String {
    format!("^(?:{})$", pattern)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[test]
    fn patterns_match_whole_lines() {
        let found = extract_line_matches(reader("here asd\nasd asd here\nnothing\n"), &[".*here.*", "here"])
            .unwrap();
        assert_eq!(found[0], vec!["here asd", "asd asd here"]);
        assert!(found[1].is_empty());
    }

    #[test]
    fn each_pattern_gets_its_own_match_list() {
        let found = extract_line_matches(
            reader("PATH=/usr/bin\nHOME=/root\nI'm aware!"),
            &["PATH=.*", ".*aware.*", "HOME=.*", "absent"],
        )
        .unwrap();
        assert_eq!(found.len(), 4);
        assert_eq!(found[0], vec!["PATH=/usr/bin"]);
        assert_eq!(found[1], vec!["I'm aware!"]);
        assert_eq!(found[2], vec!["HOME=/root"]);
        assert!(found[3].is_empty());
    }

    #[test]
    fn windows_line_endings_are_stripped() {
        let found = extract_line_matches(reader("done\r\nalmost done\r\n"), &["done"]).unwrap();
        assert_eq!(found[0], vec!["done"]);
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let found = extract_line_matches(reader("xa\nb\n"), &["a|b"]).unwrap();
        assert_eq!(found[0], vec!["b"]);
    }

    #[test]
    fn empty_pattern_list_yields_no_groups() {
        let found = extract_line_matches::<&str>(reader("x\n"), &[]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn invalid_pattern_is_named_in_the_error() {
        let err = LineMatcher::new(["ok", "(broken"]).unwrap_err();
        match err {
            LineMatchError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(broken"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
