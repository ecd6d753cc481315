//! Progress commands.

use crate::{config::Config, storage::Workspace};

use super::{discover, find_tour, open_progress};

pub(super) fn cmd_reset(
    config: &Config,
    workspace: &Workspace,
    reference: Option<&str>,
) -> Result<(), String> {
    let store = open_progress(config)?;

    let Some(reference) = reference else {
        let cleared = store
            .reset(None)
            .map_err(|e| format!("failed to reset progress: {e}"))?;
        eprintln!("Cleared {cleared} visited step(s)");
        return Ok(());
    };

    let tours = discover(workspace);
    let tour = find_tour(&tours, reference)?;
    let cleared = store
        .reset(Some(&tour.id))
        .map_err(|e| format!("failed to reset progress: {e}"))?;
    eprintln!("Cleared {cleared} visited step(s) of '{}'", tour.title);
    Ok(())
}
