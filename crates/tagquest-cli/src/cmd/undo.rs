//! `tq undo`: return an answered, hidden or uploaded OSM quest to `new`.
//!
//! Undoing an uploaded (closed) quest queues a record so the upload can be
//! reverted on the server.
//!
//! ```text
//! tq undo 42
//! ```

use crate::cmd::{open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::model::quest::QuestId;

#[derive(Args, Debug)]
pub struct UndoArgs {
    /// OSM quest id.
    pub id: QuestId,
}

/// Execute `tq undo`.
///
/// # Errors
///
/// Returns an error if the quest is `new` or `failed`, or a store fails.
pub fn run_undo(args: &UndoArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let applied = project
        .controller
        .undo(args.id)
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "undo", args.id, applied)
}
