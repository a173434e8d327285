//! `tq note`: leave a note for other mappers.
//!
//! A note tied to a quest leaves that quest as it is and removes every other
//! unsolved quest on its element. A free note only needs a position.
//!
//! ```text
//! tq note --text "Entrance moved to the back" --at 52.52,13.40
//! tq note --text "Cannot tell the parking type" --quest 42 --title "Parking type"
//! ```

use crate::cmd::{open_project, report_outcome};
use crate::output::{OutputMode, fail, pretty_kv, render};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tagquest_core::model::element::LatLon;
use tagquest_core::model::quest::QuestId;
use tagquest_core::model::record::RecordId;

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// Note text.
    #[arg(long, short = 't')]
    pub text: String,

    /// Position of a free note, as `LAT,LON`.
    #[arg(long, value_name = "LAT,LON", conflicts_with = "quest", required_unless_present = "quest")]
    pub at: Option<LatLon>,

    /// OSM quest the note is about.
    #[arg(long, requires = "title")]
    pub quest: Option<QuestId>,

    /// Title of the quest, shown with the note.
    #[arg(long, requires = "quest")]
    pub title: Option<String>,

    /// Image to attach (repeatable).
    #[arg(long = "image")]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NoteCreated {
    record_id: RecordId,
    position: LatLon,
}

/// Execute `tq note`.
///
/// # Errors
///
/// Returns an error if a store fails.
pub fn run_note(args: &NoteArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let controller = &project.controller;

    match (args.quest, args.title.as_deref(), args.at) {
        (Some(quest_id), Some(title), _) => {
            let applied = controller
                .create_note_for_quest(quest_id, title, &args.text, &args.images)
                .map_err(|e| fail(output, e))?;
            report_outcome(output, "note", quest_id, applied)
        }
        (_, _, Some(position)) => {
            let record_id = controller
                .create_note(&args.text, &args.images, position)
                .map_err(|e| fail(output, e))?;
            render(output, &NoteCreated { record_id, position }, |n, w| {
                pretty_kv(w, "note", format!("record {}", n.record_id))?;
                pretty_kv(w, "position", n.position.to_string())
            })
        }
        _ => anyhow::bail!("either --at or --quest with --title is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: NoteArgs,
    }

    #[test]
    fn parses_free_note() {
        let w = Wrapper::parse_from(["test", "--text", "hi", "--at", "52.5,13.4"]);
        assert_eq!(w.args.at, Some(LatLon::new(52.5, 13.4)));
        assert!(w.args.quest.is_none());
    }

    #[test]
    fn parses_quest_note() {
        let w = Wrapper::parse_from([
            "test", "-t", "hi", "--quest", "5", "--title", "Opening hours", "--image", "a.jpg",
        ]);
        assert_eq!(w.args.quest, Some(5));
        assert_eq!(w.args.title.as_deref(), Some("Opening hours"));
        assert_eq!(w.args.images, vec!["a.jpg"]);
    }

    #[test]
    fn needs_a_position_or_quest() {
        assert!(Wrapper::try_parse_from(["test", "--text", "hi"]).is_err());
    }

    #[test]
    fn quest_needs_title() {
        assert!(Wrapper::try_parse_from(["test", "--text", "hi", "--quest", "5"]).is_err());
    }

    #[test]
    fn position_and_quest_conflict() {
        assert!(
            Wrapper::try_parse_from([
                "test", "--text", "hi", "--at", "1,2", "--quest", "5", "--title", "x"
            ])
            .is_err()
        );
    }
}
