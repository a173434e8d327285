//! `tq show`: show one quest with its element and pending changes.
//!
//! ```text
//! tq show osm 42
//! tq show note 9 --json
//! ```

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_rule, render, render_error};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tagquest_core::error::ErrorCode;
use tagquest_core::model::element::Element;
use tagquest_core::model::quest::{Quest, QuestGroup, QuestId};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Quest group (osm, note).
    pub group: QuestGroup,

    /// Quest id.
    pub id: QuestId,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    quest: Quest,
    /// Cached element, for OSM quests whose element is still cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    element: Option<Element>,
}

/// Execute `tq show`.
///
/// # Errors
///
/// Returns an error if the quest does not exist or a query fails.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let controller = &project.controller;

    let Some(quest) = controller.get(args.id, args.group).map_err(|e| fail(output, e))? else {
        let code = ErrorCode::QuestNotFound;
        render_error(
            output,
            &CliError {
                message: format!("{} quest {} not found", args.group, args.id),
                code: Some(code.code().to_string()),
                hint: Some("Run `tq list` to see available quests.".to_string()),
            },
        )?;
        anyhow::bail!("{} quest {} not found", args.group, args.id);
    };

    let element = match &quest {
        Quest::Osm(osm) => controller.osm_element(osm).map_err(|e| fail(output, e))?,
        Quest::OsmNote(_) => None,
    };

    render(output, &ShowOutput { quest, element }, |out, w| {
        match &out.quest {
            Quest::Osm(q) => {
                pretty_kv(w, "quest", format!("osm {}", q.id))?;
                pretty_kv(w, "type", &q.quest_type)?;
                pretty_kv(w, "status", q.status.as_str())?;
                pretty_kv(w, "element", q.element.to_string())?;
                pretty_kv(w, "center", q.center.to_string())?;
                if let Some(changes) = &q.changes {
                    pretty_kv(w, "changes", changes.to_string())?;
                }
                if let Some(source) = &q.changes_source {
                    pretty_kv(w, "source", source)?;
                }
            }
            Quest::OsmNote(q) => {
                pretty_kv(w, "quest", format!("note {}", q.id))?;
                pretty_kv(w, "note", q.note_id.to_string())?;
                pretty_kv(w, "status", q.status.as_str())?;
                pretty_kv(w, "center", q.center.to_string())?;
                if let Some(comment) = &q.comment {
                    pretty_kv(w, "comment", comment)?;
                }
                if !q.image_paths.is_empty() {
                    pretty_kv(w, "images", q.image_paths.join(", "))?;
                }
            }
        }
        pretty_kv(w, "updated", out.quest_last_update())?;
        if let Some(element) = &out.element {
            pretty_rule(w)?;
            for (key, value) in &element.tags {
                writeln!(w, "  {key}={value}")?;
            }
        }
        Ok(())
    })
}

impl ShowOutput {
    fn quest_last_update(&self) -> String {
        let at = match &self.quest {
            Quest::Osm(q) => q.last_update,
            Quest::OsmNote(q) => q.last_update,
        };
        at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}
