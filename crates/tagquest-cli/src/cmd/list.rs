//! `tq list`: list quests, optionally filtered by status and group.
//!
//! ```text
//! tq list
//! tq list --status new --group osm
//! ```

use crate::cmd::open_project;
use crate::output::{OutputMode, render};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tagquest_core::model::quest::{QuestGroup, QuestId, QuestStatus};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only quests in this status (new, answered, hidden, closed, failed).
    #[arg(long, short = 's')]
    pub status: Option<QuestStatus>,

    /// Only quests of this group (osm, note).
    #[arg(long, short = 'g')]
    pub group: Option<QuestGroup>,
}

#[derive(Debug, Serialize)]
pub struct QuestRow {
    pub id: QuestId,
    pub group: QuestGroup,
    pub status: QuestStatus,
    /// Quest type for OSM quests, `note/<id>` for note quests.
    pub subject: String,
    /// Element key for OSM quests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub center: String,
}

/// Execute `tq list`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or a query fails.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let mut rows = Vec::new();

    if args.group.is_none_or(|g| g == QuestGroup::Osm) {
        for quest in project.store.list_osm_quests(args.status)? {
            rows.push(QuestRow {
                id: quest.id,
                group: QuestGroup::Osm,
                status: quest.status,
                subject: quest.quest_type,
                element: Some(quest.element.to_string()),
                center: quest.center.to_string(),
            });
        }
    }
    if args.group.is_none_or(|g| g == QuestGroup::OsmNote) {
        for quest in project.store.list_note_quests(args.status)? {
            rows.push(QuestRow {
                id: quest.id,
                group: QuestGroup::OsmNote,
                status: quest.status,
                subject: format!("note/{}", quest.note_id),
                element: None,
                center: quest.center.to_string(),
            });
        }
    }

    render(output, &rows, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "No quests.");
        }
        writeln!(
            w,
            "{:>6}  {:<8}  {:<9}  {:<22}  {:<14}  CENTER",
            "ID", "GROUP", "STATUS", "SUBJECT", "ELEMENT"
        )?;
        for row in rows {
            writeln!(
                w,
                "{:>6}  {:<8}  {:<9}  {:<22}  {:<14}  {}",
                row.id,
                row.group.as_str(),
                row.status.as_str(),
                row.subject,
                row.element.as_deref().unwrap_or("-"),
                row.center
            )?;
        }
        Ok(())
    })
}
