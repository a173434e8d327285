//! `tq replace`: replace the tags of a quest's element, e.g. when a shop
//! changed hands. Keys describing the building or address are kept.
//!
//! ```text
//! tq replace 42 --tag shop=butcher --tag name="Müller"
//! ```

use crate::cmd::{DEFAULT_SOURCE, open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::model::element::Tags;
use tagquest_core::model::quest::QuestId;

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// OSM quest id.
    pub id: QuestId,

    /// New tag as `KEY=VALUE` (repeatable).
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Where the observation came from.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub source: String,
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Execute `tq replace`.
///
/// # Errors
///
/// Returns an error if a store fails.
pub fn run_replace(args: &ReplaceArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let tags: Tags = args.tags.iter().cloned().collect();
    let applied = project
        .controller
        .replace_element(args.id, &tags, &args.source)
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "replace", args.id, applied)
}
