//! `tq split`: record that the quest's way must be split first.
//!
//! ```text
//! tq split 42 --at 52.5201,13.4049
//! tq split 42 --at 52.52,13.40:52.53,13.41@0.25 --at 52.5310,13.4120
//! ```

use crate::cmd::{DEFAULT_SOURCE, open_project, report_outcome};
use crate::output::{OutputMode, fail};
use clap::Args;
use std::path::Path;
use tagquest_core::model::element::LatLon;
use tagquest_core::model::quest::QuestId;
use tagquest_core::model::record::SplitPosition;

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// OSM quest id; its element must be a way.
    pub id: QuestId,

    /// Split position, in order along the way (repeatable). `LAT,LON` is an
    /// existing vertex; `LAT,LON:LAT,LON@DELTA` lies between two vertices.
    #[arg(long = "at", value_name = "POSITION", value_parser = parse_split)]
    pub splits: Vec<SplitPosition>,

    /// Where the observation came from.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub source: String,
}

fn parse_split(raw: &str) -> Result<SplitPosition, String> {
    let Some((segment, delta)) = raw.rsplit_once('@') else {
        let position: LatLon = raw.parse().map_err(|e| format!("{e}"))?;
        return Ok(SplitPosition::Point { position });
    };
    let (before, after) = segment
        .split_once(':')
        .ok_or_else(|| format!("expected two positions separated by ':', got '{segment}'"))?;
    Ok(SplitPosition::Line {
        before: before.parse().map_err(|e| format!("{e}"))?,
        after: after.parse().map_err(|e| format!("{e}"))?,
        delta: delta
            .trim()
            .parse()
            .map_err(|_| format!("delta must be a number, got '{delta}'"))?,
    })
}

/// Execute `tq split`.
///
/// # Errors
///
/// Returns an error if no valid split position was given, the element is
/// not a way, or a store fails.
pub fn run_split(args: &SplitArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = open_project(project_root, output)?;
    let applied = project
        .controller
        .split_way(args.id, &args.splits, &args.source)
        .map_err(|e| fail(output, e))?;
    report_outcome(output, "split", args.id, applied)
}
