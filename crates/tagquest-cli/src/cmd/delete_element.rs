//! `tq delete-element`: record that the quest's element no longer exists.
//!
//! ```text
//! tq delete-element 42
//! ```

use crate::cmd::{DEFAULT_SOURCE, open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::model::quest::QuestId;

#[derive(Args, Debug)]
pub struct DeleteElementArgs {
    /// OSM quest id.
    pub id: QuestId,

    /// Where the observation came from.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub source: String,
}

/// Execute `tq delete-element`.
///
/// # Errors
///
/// Returns an error if a store fails.
pub fn run_delete_element(
    args: &DeleteElementArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let applied = project
        .controller
        .delete_element(args.id, &args.source)
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "delete-element", args.id, applied)
}
