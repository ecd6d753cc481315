//! Pattern anchors: multiline regular expressions locating a step's line.
//!
//! Shared by the resolver (find the line), the recorder (derive a pattern
//! from a line) and the tracker (re-derive after an edit).

use regex::{Regex, RegexBuilder};

/// Prefix allowing any indentation before the anchored text.
const INDENT: &str = r"^[^\S\n]*";

/// Why a line cannot be anchored by a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("line {line} matches {matches} lines; anchor it by line number instead")]
    AmbiguousPattern { line: u32, matches: usize },

    #[error("line {line} is blank and cannot anchor a pattern")]
    BlankLine { line: u32 },

    #[error("line {line} is past the end of the document")]
    LineOutOfRange { line: u32 },
}

/// Compiles a step pattern the way tour files mean it: `^`/`$` match at
/// line boundaries.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).multi_line(true).build()
}

/// The 0-based line of the first match of `pattern` in `text`.
///
/// An invalid pattern is reported and treated as no match.
pub fn find_pattern_line(text: &str, pattern: &str) -> Option<u32> {
    let regex = match compile(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "ignoring invalid step pattern");
            return None;
        }
    };
    regex.find(text).map(|m| line_at_offset(text, m.start()))
}

/// Number of distinct lines `pattern` matches in `text`.
pub fn count_matching_lines(text: &str, pattern: &str) -> usize {
    let Ok(regex) = compile(pattern) else {
        return 0;
    };
    let mut lines: Vec<u32> = regex
        .find_iter(text)
        .map(|m| line_at_offset(text, m.start()))
        .collect();
    lines.dedup();
    lines.len()
}

/// 0-based line containing byte `offset`.
pub fn line_at_offset(text: &str, offset: usize) -> u32 {
    let end = offset.min(text.len());
    let newlines = text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count();
    u32::try_from(newlines).unwrap_or(u32::MAX)
}

/// Text of the 0-based `line`, without its line terminator.
pub fn line_text(text: &str, line: u32) -> Option<&str> {
    text.lines().nth(usize::try_from(line).ok()?)
}

/// Escapes a line's literal text into a pattern anchoring it.
///
/// Surrounding whitespace is dropped (indentation is matched loosely).
/// Returns `None` for a blank line.
pub fn escape_line(line: &str) -> Option<String> {
    let literal = line.trim();
    if literal.is_empty() {
        return None;
    }
    Some(format!("{INDENT}{}", regex::escape(literal)))
}

/// A pattern anchoring the 0-based `line` of `text`.
///
/// Fails when the line is blank or its pattern would match more than one
/// line: an ambiguous pattern could not find its way back later.
pub fn pattern_for_line(text: &str, line: u32) -> Result<String, RecordError> {
    let literal = line_text(text, line).ok_or(RecordError::LineOutOfRange { line })?;
    let pattern = escape_line(literal).ok_or(RecordError::BlankLine { line })?;
    match count_matching_lines(text, &pattern) {
        1 => Ok(pattern),
        matches => Err(RecordError::AmbiguousPattern { line, matches }),
    }
}
