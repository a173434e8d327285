//! `tq records`: list queued side records and when a quest was last solved.
//!
//! ```text
//! tq records
//! tq records --kind create_note --json
//! ```

use crate::cmd::open_project;
use crate::output::{OutputMode, pretty_kv, pretty_rule, render};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tagquest_core::model::record::{RecordId, SideRecord};
use tagquest_core::store::{QuestPrefs, SideRecordLog};

#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// Only records of this kind (create_note, delete_element, split_way, undo_quest).
    #[arg(long)]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecordEntry {
    id: RecordId,
    #[serde(flatten)]
    record: SideRecord,
}

#[derive(Debug, Serialize)]
struct RecordsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    last_solved_at: Option<DateTime<Utc>>,
    records: Vec<RecordEntry>,
}

fn summary(record: &SideRecord) -> String {
    match record {
        SideRecord::CreateNote(note) => match (&note.quest_title, note.element) {
            (Some(title), Some(element)) => format!("note on {element} ({title}): {}", note.text),
            _ => format!("note at {}: {}", note.position, note.text),
        },
        SideRecord::DeleteElement(del) => {
            format!("delete {} (quest {}, {})", del.element, del.quest_id, del.source)
        }
        SideRecord::SplitWay(split) => format!(
            "split way/{} at {} position(s) (quest {})",
            split.way_id,
            split.splits.len(),
            split.quest_id
        ),
        SideRecord::UndoQuest(undo) => format!(
            "revert quest {} on {} ({})",
            undo.quest.id, undo.quest.element, undo.quest.quest_type
        ),
    }
}

/// Execute `tq records`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or a query fails.
pub fn run_records(args: &RecordsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let records = project
        .store
        .list_records()?
        .into_iter()
        .filter(|(_, record)| {
            args.kind
                .as_deref()
                .is_none_or(|kind| record.kind().as_str() == kind)
        })
        .map(|(id, record)| RecordEntry { id, record })
        .collect();
    let out = RecordsOutput {
        last_solved_at: project.store.last_solved_at()?,
        records,
    };

    render(output, &out, |out, w| {
        if let Some(at) = out.last_solved_at {
            pretty_kv(w, "last solved", at.format("%Y-%m-%d %H:%M:%S UTC").to_string())?;
            pretty_rule(w)?;
        }
        if out.records.is_empty() {
            return writeln!(w, "No queued records.");
        }
        for entry in &out.records {
            writeln!(w, "#{:<5} {:<15} {}", entry.id, entry.record.kind().as_str(), summary(&entry.record))?;
        }
        Ok(())
    })
}
