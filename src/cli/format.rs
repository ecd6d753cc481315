//! Output formatting for CLI display.

use url::Url;

use crate::{
    model::Tour,
    progress::Progress,
    resolve::{
        AnchorLine, CONTENT_SCHEME, Location, NOTE_SCHEME, Resolution, line_text,
        split_historical_uri,
    },
};

/// One line of `pilot list`: status, visited count, title.
pub(super) fn format_tour_summary(tour: &Tour, progress: &Progress) -> String {
    let total = tour.steps.len();
    let visited = progress.visited_count(&tour.id).min(total);
    let status = if total == 0 {
        "empty"
    } else if progress.is_complete(tour, None) {
        "done"
    } else if visited > 0 {
        "started"
    } else {
        "new"
    };
    let primary = if tour.is_primary { "  (primary)" } else { "" };
    format!("[{status:<7}] {visited:>3}/{total:<3} {}{primary}", tour.title)
}

/// A step as printed by `show` and `walk`.
///
/// `document` is the text the step resolved against; when given, the
/// anchored line is quoted under the location.
pub(super) fn format_step(
    tour: &Tour,
    index: usize,
    resolution: &Resolution,
    root: Option<&Url>,
    document: Option<&str>,
) -> String {
    let mut label = tour.step_label(index, false, false);
    if label.is_empty() {
        label = resolution
            .marker_title
            .clone()
            .unwrap_or_else(|| tour.step_label(index, false, true));
    }

    let mut out = format!("[{}/{}] {label}\n", index + 1, tour.steps.len());
    out.push_str("  ");
    out.push_str(&format_location(&resolution.location, root));
    out.push('\n');

    if let Location::Document {
        line: AnchorLine::Line(line),
        ..
    } = resolution.location
        && let Some(text) = document.and_then(|d| line_text(d, line))
        && !text.trim().is_empty()
    {
        out.push_str("  > ");
        out.push_str(text.trim_end());
        out.push('\n');
    }

    if let Some(step) = tour.steps.get(index)
        && !step.description.trim().is_empty()
    {
        out.push('\n');
        for line in step.description.lines() {
            if !line.is_empty() {
                out.push_str("  ");
                out.push_str(line);
            }
            out.push('\n');
        }
    }
    out
}

/// Where a step points, relative to the workspace where possible.
pub(super) fn format_location(location: &Location, root: Option<&Url>) -> String {
    match location {
        Location::Document { uri, .. } if uri.scheme() == NOTE_SCHEME => "note".to_string(),
        Location::Document { uri, line, .. } => {
            let name = display_uri(uri, root);
            match line {
                AnchorLine::Line(line) => format!("{name}:{}", line + 1),
                AnchorLine::EndOfDocument => format!("{name} (unanchored)"),
            }
        }
        Location::Directory { uri } => {
            format!("{}/", display_uri(uri, root).trim_end_matches('/'))
        }
        Location::View { name } => format!("view {name}"),
    }
}

fn display_uri(uri: &Url, root: Option<&Url>) -> String {
    if let Some((live, git_ref)) = split_historical_uri(uri) {
        return format!("{} @ {git_ref}", display_uri(&live, root));
    }
    match uri.scheme() {
        "file" => {
            let Ok(path) = uri.to_file_path() else {
                return uri.to_string();
            };
            let root = root.and_then(|r| r.to_file_path().ok());
            match root.as_deref().and_then(|r| path.strip_prefix(r).ok()) {
                Some(relative) => relative.display().to_string(),
                None => path.display().to_string(),
            }
        }
        CONTENT_SCHEME => {
            let name = uri
                .path_segments()
                .and_then(|mut s| s.next_back())
                .unwrap_or_default();
            format!("{name} (embedded)")
        }
        _ => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        model::{Step, Target, TourId},
        resolve::{Point, Range, content_uri, historical_uri, note_uri},
    };

    fn root() -> Url {
        Url::parse("file:///w/").unwrap()
    }

    fn test_tour(steps: usize) -> Tour {
        let mut tour = Tour::new(TourId::new("file:///w/.tours/intro.tour"), "Intro");
        for i in 0..steps {
            tour.steps.push(Step::new(
                Target::File {
                    path: "src/main.rs".into(),
                },
                format!("Step {i}"),
            ));
        }
        tour
    }

    fn document_at(path: &str, line: AnchorLine) -> Location {
        Location::Document {
            uri: Url::parse(path).unwrap(),
            line,
            selection: None,
        }
    }

    #[test]
    fn summary_reports_status_and_counts() {
        let tour = test_tour(3);
        let mut progress = Progress::new();
        assert_eq!(format_tour_summary(&tour, &progress), "[new    ]   0/3   Intro");

        progress.mark_visited(&tour.id, 1);
        assert_eq!(format_tour_summary(&tour, &progress), "[started]   1/3   Intro");

        progress.mark_visited(&tour.id, 0);
        progress.mark_visited(&tour.id, 2);
        assert_eq!(format_tour_summary(&tour, &progress), "[done   ]   3/3   Intro");
    }

    #[test]
    fn summary_marks_empty_and_primary_tours() {
        let mut tour = test_tour(0);
        tour.is_primary = true;
        let line = format_tour_summary(&tour, &Progress::new());
        assert!(line.starts_with("[empty  ]"));
        assert!(line.ends_with("Intro  (primary)"));
    }

    #[test]
    fn file_locations_are_workspace_relative_and_one_based() {
        let location = document_at("file:///w/src/main.rs", AnchorLine::Line(11));
        assert_eq!(format_location(&location, Some(&root())), "src/main.rs:12");

        let outside = document_at("file:///elsewhere/a.rs", AnchorLine::EndOfDocument);
        assert_eq!(
            format_location(&outside, Some(&root())),
            "/elsewhere/a.rs (unanchored)"
        );
    }

    #[test]
    fn historical_locations_show_the_ref() {
        let live = Url::parse("file:///w/src/lib.rs").unwrap();
        let location = Location::Document {
            uri: historical_uri(&live, "v1.0").unwrap(),
            line: AnchorLine::Line(0),
            selection: None,
        };
        assert_eq!(format_location(&location, Some(&root())), "src/lib.rs @ v1.0:1");
    }

    #[test]
    fn synthetic_and_panel_locations() {
        let embedded = Location::Document {
            uri: content_uri(Some("setup.sh")).unwrap(),
            line: AnchorLine::Line(2),
            selection: None,
        };
        assert_eq!(format_location(&embedded, None), "setup.sh (embedded):3");

        let note = Location::Document {
            uri: note_uri().unwrap(),
            line: AnchorLine::EndOfDocument,
            selection: None,
        };
        assert_eq!(format_location(&note, None), "note");

        let directory = Location::Directory {
            uri: Url::parse("file:///w/src/").unwrap(),
        };
        assert_eq!(format_location(&directory, Some(&root())), "src/");

        let view = Location::View {
            name: "terminal".into(),
        };
        assert_eq!(format_location(&view, None), "view terminal");
    }

    #[test]
    fn step_quotes_the_anchored_line_and_indents_the_description() {
        let mut tour = test_tour(2);
        tour.steps[1].description = "## Entry point\n\nWhere it starts.".into();
        let resolution = Resolution {
            location: Location::Document {
                uri: Url::parse("file:///w/src/main.rs").unwrap(),
                line: AnchorLine::Line(1),
                selection: Some(Range {
                    start: Point {
                        line: 1,
                        character: 0,
                    },
                    end: Point {
                        line: 1,
                        character: 4,
                    },
                }),
            },
            marker_title: None,
        };

        let out = format_step(
            &tour,
            1,
            &resolution,
            Some(&root()),
            Some("use std::io;\nfn main() {}  \n"),
        );

        assert_eq!(
            out,
            "[2/2] Entry point\n  src/main.rs:2\n  > fn main() {}\n\n  ## Entry point\n\n  Where it starts.\n"
        );
    }

    #[test]
    fn step_falls_back_to_marker_title_then_path() {
        let mut tour = test_tour(1);
        tour.steps[0].description = String::new();
        let mut resolution = Resolution {
            location: document_at("file:///w/src/main.rs", AnchorLine::EndOfDocument),
            marker_title: Some("Setup".into()),
        };
        assert!(format_step(&tour, 0, &resolution, Some(&root()), None).starts_with("[1/1] Setup\n"));

        resolution.marker_title = None;
        assert_eq!(
            format_step(&tour, 0, &resolution, Some(&root()), None),
            "[1/1] src/main.rs\n  src/main.rs (unanchored)\n"
        );
    }
}
