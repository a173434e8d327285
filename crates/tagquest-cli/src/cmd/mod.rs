pub mod answer;
pub mod comment;
pub mod completions;
pub mod delete_element;
pub mod hide;
pub mod import;
pub mod init;
pub mod list;
pub mod note;
pub mod records;
pub mod replace;
pub mod show;
pub mod split;
pub mod undo;

use crate::output::{CliError, OutputMode, pretty_kv, render, render_error};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tagquest_core::config::{self, PROJECT_DIR};
use tagquest_core::db::SqliteStore;
use tagquest_core::error::ErrorCode;
use tagquest_core::model::quest::QuestId;
use tagquest_core::quest_type::QuestTypeRegistry;
use tagquest_core::store::Stores;
use tagquest_core::QuestController;

/// Default `source` recorded with changes made from the command line.
pub const DEFAULT_SOURCE: &str = "survey";

/// An opened project: the database plus a controller wired to it.
pub struct Project {
    pub store: Arc<SqliteStore>,
    pub controller: QuestController,
}

/// Open the project rooted at `project_root`.
///
/// # Errors
///
/// Renders `E1001` and fails if `tq init` was never run, or fails if the
/// config or database cannot be opened.
pub fn open_project(project_root: &Path, output: OutputMode) -> anyhow::Result<Project> {
    if !project_root.join(PROJECT_DIR).is_dir() {
        let code = ErrorCode::NotInitialized;
        render_error(
            output,
            &CliError::with_details(
                format!("{}: no {PROJECT_DIR} directory here", code.message()),
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        anyhow::bail!("not a tagquest project: {}", project_root.display());
    }

    let cfg = config::load_project_config(project_root)?;
    let protected = cfg.replace.protected_keys()?;
    let db_path = cfg.storage.database_path(project_root);
    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?,
    );
    let controller = QuestController::new(
        Stores::shared(Arc::clone(&store)),
        QuestTypeRegistry::with_builtin(),
        protected,
    );
    Ok(Project { store, controller })
}

/// Result of a mutating quest command.
#[derive(Debug, Serialize)]
pub struct ActionOutcome {
    pub action: &'static str,
    pub quest_id: QuestId,
    pub applied: bool,
}

/// Print whether an action took effect. A quest that moved on is not an
/// error, so this never fails the command.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn report_outcome(
    output: OutputMode,
    action: &'static str,
    quest_id: QuestId,
    applied: bool,
) -> anyhow::Result<()> {
    let outcome = ActionOutcome {
        action,
        quest_id,
        applied,
    };
    render(output, &outcome, |o, w| {
        pretty_kv(w, o.action, format!("quest {}", o.quest_id))?;
        if o.applied {
            pretty_kv(w, "applied", "true")
        } else {
            pretty_kv(w, "applied", "false (quest is gone or no longer new)")
        }
    })
}
