use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;
use tagquest_core::config::{self, PROJECT_DIR};
use tagquest_core::db::SqliteStore;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.tagquest/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[storage]\n\
    database = \".tagquest/quests.sqlite3\"\n\
    \n\
    [replace]\n\
    # Extra full-match key regexes kept when an element's tags are replaced.\n\
    extra_protected_keys = []\n";

const GITIGNORE: &str = "quests.sqlite3\nquests.sqlite3-wal\nquests.sqlite3-shm\n";

/// Execute `tq init`. Creates the project skeleton:
///
/// ```text
/// .tagquest/
///   config.toml      (default project config template)
///   .gitignore       (database files)
///   quests.sqlite3   (migrated quest database)
/// ```
///
/// # Errors
///
/// Returns an error if `.tagquest/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path) -> Result<()> {
    let project_dir = project_root.join(PROJECT_DIR);

    if project_dir.exists() && !args.force {
        anyhow::bail!(".tagquest/ already exists. Use `tq init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;

    let config_path = config::config_path(project_root);
    if !config_path.exists() || args.force {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }
    std::fs::write(project_dir.join(".gitignore"), GITIGNORE)
        .context("Failed to write .tagquest/.gitignore")?;

    let cfg = config::load_project_config(project_root)?;
    let db_path = cfg.storage.database_path(project_root);
    SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "initialized quest database");

    println!("Initialized .tagquest/ project structure.");
    println!();
    println!("  Config:   .tagquest/config.toml");
    println!("  Database: {}", cfg.storage.database.display());
    println!();
    println!("Next steps:");
    println!("  Load quests and cached elements:");
    println!("    tq import --file quests.json");
    println!();
    println!("  See what is open:");
    println!("    tq list --status new");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::{fs, path::PathBuf};

    fn make_temp_dir(label: &str) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("tagquest-init-test-{label}-{id}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn fresh_init_creates_structure() {
        let root = make_temp_dir("fresh");
        run_init(&InitArgs { force: false }, &root).expect("init should succeed");

        assert!(root.join(".tagquest").is_dir());
        assert!(root.join(".tagquest/config.toml").is_file());
        assert!(root.join(".tagquest/.gitignore").is_file());
        assert!(root.join(".tagquest/quests.sqlite3").is_file());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn reinit_without_force_fails() {
        let root = make_temp_dir("no-force");
        let args = InitArgs { force: false };
        run_init(&args, &root).expect("first init should succeed");

        let result = run_init(&args, &root);
        assert!(result.is_err(), "reinit without --force must fail");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn reinit_with_force_keeps_database() {
        let root = make_temp_dir("with-force");
        run_init(&InitArgs { force: false }, &root).expect("first init should succeed");
        run_init(&InitArgs { force: true }, &root).expect("reinit --force should succeed");

        assert!(root.join(".tagquest/quests.sqlite3").is_file());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn config_template_parses_to_defaults() {
        let parsed: config::ProjectConfig = toml::from_str(CONFIG_TOML).expect("template parses");
        assert_eq!(parsed, config::ProjectConfig::default());
    }

    #[test]
    fn gitignore_covers_database_files() {
        for needle in ["quests.sqlite3", "quests.sqlite3-wal"] {
            assert!(GITIGNORE.lines().any(|l| l == needle), "missing {needle}");
        }
    }
}
