//! Marker anchors: comments like `// CT1.3 - Parsing the header` that both
//! locate and title a step without storing a line number.

use regex::Regex;

use crate::model::Tour;

use super::{Context, pattern::line_at_offset, read_step_document};

/// A marker comment found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    /// 0-based line of the marker.
    pub line: u32,

    /// Text following the marker's delimiter.
    pub title: String,
}

/// Finds the marker `<prefix>.<step + 1>` followed by `-` or `:`.
pub fn find_marker(text: &str, prefix: &str, step: usize) -> Option<MarkerMatch> {
    let expr = format!(r"{}\.{}\s*[-:][ \t]*(.*)", regex::escape(prefix), step + 1);
    let regex = match Regex::new(&expr) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!(prefix, error = %e, "cannot build marker expression");
            return None;
        }
    };
    let captures = regex.captures(text)?;
    let whole = captures.get(0)?;
    let title = captures.get(1).map_or("", |m| m.as_str());
    Some(MarkerMatch {
        line: line_at_offset(text, whole.start()),
        title: title.trim_end().to_string(),
    })
}

/// Fills the `marker_title` cache of every marker step in `tour`.
///
/// Best effort: steps whose document cannot be read keep their old title.
pub fn refresh_marker_titles(tour: &mut Tour, ctx: &Context<'_>) {
    let Some(prefix) = tour.step_marker_prefix() else {
        return;
    };

    for index in 0..tour.steps.len() {
        if !tour.is_marker_step(index) {
            continue;
        }
        let text = match read_step_document(tour, index, ctx) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(tour = %tour.id, step = index, error = %e, "skipping marker title");
                continue;
            }
        };
        if let Some(found) = find_marker(&text, &prefix, index) {
            tour.steps[index].marker_title = Some(found.title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
fn main() {
    // CT1.1 - Entry point
    run();
}

// CT1.2: The runner
fn run() {}

// CT1.10 - Tenth
";

    #[test]
    fn finds_marker_line_and_title() {
        let found = find_marker(SOURCE, "CT1", 0).unwrap();
        assert_eq!(found.line, 1);
        assert_eq!(found.title, "Entry point");
    }

    #[test]
    fn colon_delimiter() {
        let found = find_marker(SOURCE, "CT1", 1).unwrap();
        assert_eq!(found.line, 5);
        assert_eq!(found.title, "The runner");
    }

    #[test]
    fn step_number_must_end_at_delimiter() {
        // Step 1 must not match the `CT1.10` marker.
        let text = "// CT1.10 - Tenth\n";
        assert_eq!(find_marker(text, "CT1", 0), None);
        assert_eq!(find_marker(SOURCE, "CT1", 9).map(|m| m.line), Some(8));
    }

    #[test]
    fn prefix_is_literal() {
        // The `.` in a custom prefix must not match any character.
        let text = "// AxB.1 - nope\n// A.B.1 - yes\n";
        assert_eq!(find_marker(text, "A.B", 0).map(|m| m.line), Some(1));
    }

    #[test]
    fn missing_marker_is_none() {
        assert_eq!(find_marker(SOURCE, "CT2", 0), None);
    }
}
