//! `tq comment`: answer a note quest with a comment.
//!
//! ```text
//! tq comment 9 --text "The shop closed last year"
//! tq comment 9 --text "See photo" --image /tmp/shop.jpg
//! ```

use crate::cmd::{open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::Answer;
use tagquest_core::model::quest::{NoteAnswer, QuestGroup, QuestId};

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Note quest id.
    pub id: QuestId,

    /// Comment to add to the note.
    #[arg(long, short = 't')]
    pub text: String,

    /// Image to attach (repeatable).
    #[arg(long = "image")]
    pub images: Vec<String>,
}

/// Execute `tq comment`.
///
/// # Errors
///
/// Returns an error if the comment is empty or a store fails.
pub fn run_comment(args: &CommentArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let answer = NoteAnswer {
        text: args.text.clone(),
        image_paths: args.images.clone(),
    };
    let applied = project
        .controller
        .solve(args.id, QuestGroup::OsmNote, &Answer::Note(answer), "")
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "comment", args.id, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CommentArgs,
    }

    #[test]
    fn parses_text_and_images() {
        let w = Wrapper::parse_from([
            "test", "9", "-t", "closed", "--image", "a.jpg", "--image", "b.jpg",
        ]);
        assert_eq!(w.args.id, 9);
        assert_eq!(w.args.text, "closed");
        assert_eq!(w.args.images, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn text_is_required() {
        assert!(Wrapper::try_parse_from(["test", "9"]).is_err());
    }
}
