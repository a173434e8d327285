//! `tq hide`: dismiss a quest without answering it.
//!
//! ```text
//! tq hide osm 42
//! tq hide note 9
//! ```

use crate::cmd::{open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::model::quest::{QuestGroup, QuestId};

#[derive(Args, Debug)]
pub struct HideArgs {
    /// Quest group (osm, note).
    pub group: QuestGroup,

    /// Quest id.
    pub id: QuestId,
}

/// Execute `tq hide`.
///
/// # Errors
///
/// Returns an error if a store fails.
pub fn run_hide(args: &HideArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let applied = project
        .controller
        .hide(args.id, args.group)
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "hide", args.id, applied)
}
