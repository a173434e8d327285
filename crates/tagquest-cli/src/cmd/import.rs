//! `tq import`: load cached elements and quests from a JSON document.
//!
//! ```text
//! {
//!   "elements":    [{"key": {"kind": "way", "id": 7}, "tags": {"amenity": "parking"}}],
//!   "osm_quests":  [{"id": 42, "quest_type": "AddParkingType",
//!                    "element": {"kind": "way", "id": 7},
//!                    "center": {"lat": 52.5, "lon": 13.4}}],
//!   "note_quests": [{"id": 9, "note_id": 1234, "center": {"lat": 52.5, "lon": 13.4}}]
//! }
//! ```
//!
//! Imported quests start out `new`. Existing rows with the same id are
//! overwritten, which is how a data refresh replaces stale quests.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, pretty_kv, render, render_error};
use anyhow::Context as _;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tagquest_core::model::element::{Element, ElementKey, LatLon};
use tagquest_core::model::quest::{OsmNoteQuest, OsmQuest, QuestId};
use tagquest_core::store::{ElementStore, NoteQuestStore, OsmQuestStore};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file with `elements`, `osm_quests` and `note_quests` arrays.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct ImportFile {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    osm_quests: Vec<ImportedOsmQuest>,
    #[serde(default)]
    note_quests: Vec<ImportedNoteQuest>,
}

#[derive(Debug, Deserialize)]
struct ImportedOsmQuest {
    id: QuestId,
    quest_type: String,
    element: ElementKey,
    center: LatLon,
}

#[derive(Debug, Deserialize)]
struct ImportedNoteQuest {
    id: QuestId,
    note_id: i64,
    center: LatLon,
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    elements: usize,
    osm_quests: usize,
    note_quests: usize,
    unknown_quest_types: Vec<String>,
}

/// Execute `tq import`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a store
/// write fails.
pub fn run_import(args: &ImportArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file: ImportFile = match serde_json::from_str(&content) {
        Ok(file) => file,
        Err(err) => {
            render_error(
                output,
                &CliError::new(format!("{}: {err}", args.file.display())),
            )?;
            anyhow::bail!("invalid import file {}: {err}", args.file.display());
        }
    };

    let store = &project.store;
    for element in &file.elements {
        store.put_element(element)?;
    }

    let registry = project.controller.registry();
    let mut unknown_quest_types = Vec::new();
    for quest in &file.osm_quests {
        if registry.get(&quest.quest_type).is_none()
            && !unknown_quest_types.contains(&quest.quest_type)
        {
            unknown_quest_types.push(quest.quest_type.clone());
        }
        store.put_osm_quest(&OsmQuest::new(
            quest.id,
            quest.quest_type.clone(),
            quest.element,
            quest.center,
        ))?;
    }
    for quest in &file.note_quests {
        store.put_note_quest(&OsmNoteQuest::new(quest.id, quest.note_id, quest.center))?;
    }

    for quest_type in &unknown_quest_types {
        tracing::warn!(quest_type, "imported quests of an unregistered type");
    }

    let summary = ImportSummary {
        elements: file.elements.len(),
        osm_quests: file.osm_quests.len(),
        note_quests: file.note_quests.len(),
        unknown_quest_types,
    };
    render(output, &summary, |s, w| {
        pretty_kv(w, "elements", s.elements.to_string())?;
        pretty_kv(w, "osm quests", s.osm_quests.to_string())?;
        pretty_kv(w, "note quests", s.note_quests.to_string())?;
        if !s.unknown_quest_types.is_empty() {
            pretty_kv(w, "unknown", s.unknown_quest_types.join(", "))?;
        }
        Ok(())
    })
}
