use crate::models::PatternMatch;
use log::warn;
use regex::Regex;
use serde::Serialize;

/// A compiled search pattern.
///
/// Backed by the `regex` crate, so a scan is linear in the length of the
/// sequence no matter what the pattern looks like.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

/// Why a pattern could not be used for searching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternDiagnostic {
    pub pattern: String,
    pub message: String,
}

impl std::fmt::Display for PatternDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "An error occurred with the regex pattern '{}': {}",
            self.pattern, self.message
        )
    }
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, PatternDiagnostic> {
        match Regex::new(pattern) {
            Ok(regex) => Ok(Self { regex }),
            Err(e) => Err(PatternDiagnostic {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Lazily scans `sequence` left to right for non-overlapping matches.
    ///
    /// Each attempt starts at the earliest unconsumed position, so an empty
    /// match right after a non-empty one is reported. After an empty match
    /// the scan moves forward by one character. Offsets count characters.
    pub fn find_iter<'r, 's>(&'r self, sequence: &'s str) -> MatchIter<'r, 's> {
        MatchIter {
            regex: &self.regex,
            sequence,
            pos: 0,
            char_pos: 0,
        }
    }
}

#[derive(Debug)]
pub struct MatchIter<'r, 's> {
    regex: &'r Regex,
    sequence: &'s str,
    // Byte offset of the next attempt, past the end once exhausted.
    pos: usize,
    // Character offset of `pos`.
    char_pos: usize,
}

impl MatchIter<'_, '_> {
    fn finish(&mut self) {
        self.pos = self.sequence.len() + 1;
    }
}

impl Iterator for MatchIter<'_, '_> {
    type Item = PatternMatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.sequence.len() {
            return None;
        }
        let Some(mat) = self.regex.find_at(self.sequence, self.pos) else {
            self.finish();
            return None;
        };

        let start = self.char_pos + self.sequence[self.pos..mat.start()].chars().count();
        let end = start + mat.as_str().chars().count();
        if mat.is_empty() {
            match self.sequence[mat.end()..].chars().next() {
                Some(next) => {
                    self.pos = mat.end() + next.len_utf8();
                    self.char_pos = end + 1;
                }
                None => self.finish(),
            }
        } else {
            self.pos = mat.end();
            self.char_pos = end;
        }

        Some(PatternMatch {
            start,
            end,
            matched_sequence: mat.as_str().to_string(),
        })
    }
}

/// Result of preparing a pattern for a search.
///
/// An invalid pattern never aborts the caller: it yields no matches and
/// carries the diagnostic instead.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Ready(PatternMatcher),
    Invalid(PatternDiagnostic),
}

impl SearchOutcome {
    pub fn compile(pattern: &str) -> Self {
        match PatternMatcher::new(pattern) {
            Ok(matcher) => SearchOutcome::Ready(matcher),
            Err(diagnostic) => {
                warn!("{}", diagnostic);
                SearchOutcome::Invalid(diagnostic)
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SearchOutcome::Ready(_))
    }

    pub fn diagnostic(&self) -> Option<&PatternDiagnostic> {
        match self {
            SearchOutcome::Ready(_) => None,
            SearchOutcome::Invalid(diagnostic) => Some(diagnostic),
        }
    }

    pub fn matches<'a>(&'a self, sequence: &'a str) -> impl Iterator<Item = PatternMatch> + 'a {
        let matcher = match self {
            SearchOutcome::Ready(matcher) => Some(matcher),
            SearchOutcome::Invalid(_) => None,
        };
        matcher
            .into_iter()
            .flat_map(move |matcher| matcher.find_iter(sequence))
    }
}

/// Collects every match of `pattern` in `sequence`.
///
/// Returns an empty list when the pattern is malformed.
pub fn find_patterns(sequence: &str, pattern: &str) -> Vec<PatternMatch> {
    SearchOutcome::compile(pattern).matches(sequence).collect()
}
