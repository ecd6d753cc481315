//! Tour commands: list, show, walk, new, record, export.

use std::{fs, path::PathBuf};

use crate::{
    config::Config,
    model::{Step, Target, Tour, next_tour},
    navigator::{Movement, NavigationError, Navigator, StartOptions},
    resolve::{Context, git::Git, read_step_document, refresh_marker_titles, resolve_step},
    storage::{ProgressStore, Workspace, export_tour, save_tour},
};

use super::{
    RecordArgs, discover, find_tour,
    format::{format_step, format_tour_summary},
    open_progress, step_index,
};

pub(super) fn cmd_list(config: &Config, workspace: &Workspace) -> Result<(), String> {
    let tours = discover(workspace);
    if tours.is_empty() {
        println!("No tours");
        return Ok(());
    }

    let progress = open_progress(config)?
        .load()
        .map_err(|e| format!("failed to load progress: {e}"))?;
    for tour in &tours {
        println!("{}", format_tour_summary(tour, &progress));
    }
    Ok(())
}

pub(super) fn cmd_show(
    config: &Config,
    workspace: &Workspace,
    reference: &str,
    step: Option<usize>,
) -> Result<(), String> {
    let tours = discover(workspace);
    let tour = find_tour(&tours, reference)?;
    let index = step_index(step.unwrap_or(1))?;
    if index >= tour.steps.len() {
        return Err(format!(
            "tour '{}' has {} step(s)",
            tour.title,
            tour.steps.len()
        ));
    }

    let root = workspace.root_url();
    let ctx = Context {
        workspace_root: root.as_ref(),
        reader: &Git,
        refs: &Git,
    };
    print!("{}", render_step(tour, index, &ctx)?);

    let store = open_progress(config)?;
    mark_visited(&store, tour, index)
}

pub(super) fn cmd_walk(
    config: &Config,
    workspace: &Workspace,
    reference: &str,
    from: Option<usize>,
) -> Result<(), String> {
    let tours = discover(workspace);
    let mut tour = find_tour(&tours, reference)?.clone();
    let store = open_progress(config)?;
    let root = workspace.root_url();
    let ctx = Context {
        workspace_root: root.as_ref(),
        reader: &Git,
        refs: &Git,
    };
    refresh_marker_titles(&mut tour, &ctx);

    let mut navigator = Navigator::new(config.record_mode);
    let options = StartOptions {
        step: from.map(step_index).transpose()?,
        workspace_root: root.clone(),
        recording: false,
        tours: tours.clone(),
    };
    navigator
        .start(tour, options)
        .map_err(|e| format!("failed to start tour: {e}"))?;

    walk_steps(&mut navigator, &ctx, &store)?;

    if let Some(tour) = navigator.active_tour()
        && let Some(next) = next_tour(tour, &tours)
    {
        println!("\nNext tour: {}", next.title);
    }
    navigator.end(true);
    Ok(())
}

/// Prints the active step and every one after it. A step whose anchor
/// cannot be read is reported and skipped.
fn walk_steps(
    navigator: &mut Navigator,
    ctx: &Context<'_>,
    store: &ProgressStore,
) -> Result<(), String> {
    loop {
        let (Some(tour), Some(index)) = (navigator.active_tour(), navigator.step()) else {
            if let Some(tour) = navigator.active_tour() {
                println!("Tour '{}' has no steps", tour.title);
            }
            return Ok(());
        };

        match render_step(tour, index, ctx) {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("warning: step {}: {e}", index + 1),
        }
        mark_visited(store, tour, index)?;

        match navigator.advance() {
            Ok(_) => println!(),
            Err(NavigationError::AtEnd) => return Ok(()),
            Err(e) => return Err(e.to_string()),
        }
    }
}

fn render_step(tour: &Tour, index: usize, ctx: &Context<'_>) -> Result<String, String> {
    let resolution = resolve_step(tour, index, ctx).map_err(|e| e.to_string())?;
    let document = match read_step_document(tour, index, ctx) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!(tour = %tour.id, index, error = %e, "no excerpt");
            None
        }
    };
    Ok(format_step(
        tour,
        index,
        &resolution,
        ctx.workspace_root,
        document.as_deref(),
    ))
}

fn mark_visited(store: &ProgressStore, tour: &Tour, index: usize) -> Result<(), String> {
    store
        .mark_visited(&tour.id, index)
        .map(|_| ())
        .map_err(|e| format!("failed to record progress: {e}"))
}

pub(super) fn cmd_new(
    workspace: &Workspace,
    title: &str,
    git_ref: Option<String>,
) -> Result<(), String> {
    let tour = workspace
        .create_tour(title, git_ref)
        .map_err(|e| format!("failed to create tour: {e}"))?;

    match tour.id.to_file_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", tour.id),
    }
    Ok(())
}

pub(super) fn cmd_record(
    config: &Config,
    workspace: &Workspace,
    args: &RecordArgs,
) -> Result<(), String> {
    let tours = discover(workspace);
    let tour = find_tour(&tours, &args.tour)?.clone();
    let len = tour.steps.len();
    let after = args.after.unwrap_or(len);
    if after > len {
        return Err(format!("tour '{}' has {len} step(s)", tour.title));
    }

    let mut navigator = Navigator::new(config.record_mode);
    let options = StartOptions {
        step: after.checked_sub(1),
        workspace_root: workspace.root_url(),
        recording: true,
        tours,
    };
    navigator
        .start(tour, options)
        .map_err(|e| format!("failed to start recording: {e}"))?;

    let mut index = record_step(&mut navigator, workspace, args)
        .map_err(|e| format!("failed to record step: {e}"))?;
    // Starting without a step opens at the first one; inserting first takes a move back.
    if after == 0 && len > 0 {
        index = navigator
            .move_step(index, Movement::Back)
            .map_err(|e| format!("failed to record step: {e}"))?;
    }

    let Some(mut tour) = navigator.end(true) else {
        return Err("recording session ended unexpectedly".to_string());
    };
    if let Some(step) = tour.steps.get_mut(index)
        && args.title.is_some()
    {
        step.title.clone_from(&args.title);
    }
    save_tour(&tour).map_err(|e| format!("failed to save tour: {e}"))?;

    eprintln!(
        "Recorded step {} of {} in '{}'",
        index + 1,
        tour.steps.len(),
        tour.title
    );
    Ok(())
}

fn record_step(
    navigator: &mut Navigator,
    workspace: &Workspace,
    args: &RecordArgs,
) -> Result<usize, String> {
    let description = args.description.clone();
    let recorded = match (&args.file, args.line, &args.directory) {
        (Some(file), Some(line), _) => {
            let line = line.checked_sub(1).ok_or("lines are numbered from 1")?;
            let path = workspace.root().join(file);
            let document = fs::read_to_string(&path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            navigator.add_step_at_cursor(file, line, &document, description)
        }
        (Some(file), None, _) => navigator.insert_step(Step::new(
            Target::File { path: file.clone() },
            description,
        )),
        (None, _, Some(directory)) => navigator.add_directory_step(directory, description),
        (None, _, None) => navigator.add_content_step(args.title.clone(), description),
    };
    recorded.map_err(|e| e.to_string())
}

pub(super) fn cmd_export(
    workspace: &Workspace,
    reference: &str,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let tours = discover(workspace);
    let tour = find_tour(&tours, reference)?;
    let root = workspace.root_url();
    let ctx = Context {
        workspace_root: root.as_ref(),
        reader: &Git,
        refs: &Git,
    };
    let json = export_tour(tour, &ctx).map_err(|e| format!("failed to export tour: {e}"))?;

    match out {
        Some(path) => {
            fs::write(&path, format!("{json}\n"))
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Exported '{}' to {}", tour.title, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
