//! `tq answer`: answer an OSM quest.
//!
//! The value is JSON in the shape the quest's type expects; a bare word is
//! taken as a JSON string.
//!
//! ```text
//! tq answer 42 --value surface
//! tq answer 42 --value '"multi-storey"' --source survey
//! ```

use crate::cmd::{DEFAULT_SOURCE, open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::Answer;
use tagquest_core::model::quest::{QuestGroup, QuestId};

#[derive(Args, Debug)]
pub struct AnswerArgs {
    /// OSM quest id.
    pub id: QuestId,

    /// Answer value as JSON; anything that is not valid JSON is used as a string.
    #[arg(long)]
    pub value: String,

    /// Where the answer came from, stored with the changes.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub source: String,
}

/// Parse `--value`, falling back to a plain string.
fn answer_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Execute `tq answer`.
///
/// # Errors
///
/// Returns an error if the answer does not fit the quest type or a store
/// fails. A quest that is gone or no longer new is reported, not an error.
pub fn run_answer(args: &AnswerArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let applied = project
        .controller
        .solve(
            args.id,
            QuestGroup::Osm,
            &Answer::Tags(answer_value(&args.value)),
            &args.source,
        )
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "answer", args.id, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: AnswerArgs,
    }

    #[test]
    fn parses_with_default_source() {
        let w = Wrapper::parse_from(["test", "42", "--value", "surface"]);
        assert_eq!(w.args.id, 42);
        assert_eq!(w.args.value, "surface");
        assert_eq!(w.args.source, "survey");
    }

    #[test]
    fn value_is_required() {
        assert!(Wrapper::try_parse_from(["test", "42"]).is_err());
    }

    #[test]
    fn bare_word_becomes_string() {
        assert_eq!(answer_value("surface"), json!("surface"));
        assert_eq!(answer_value("\"multi-storey\""), json!("multi-storey"));
        assert_eq!(answer_value("{\"a\": 1}"), json!({"a": 1}));
    }
}
