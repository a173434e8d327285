use crate::tags::ProtectedKeys;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding per-project state.
pub const PROJECT_DIR: &str = ".tagquest";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub replace: ReplaceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path, relative to the project root unless absolute.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.database)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceConfig {
    /// Full-match regexes kept on replacement in addition to the built-ins.
    #[serde(default)]
    pub extra_protected_keys: Vec<String>,
}

impl ReplaceConfig {
    /// # Errors
    ///
    /// Returns an error naming the first pattern that is not a valid regex.
    pub fn protected_keys(&self) -> Result<ProtectedKeys> {
        ProtectedKeys::with_extra(&self.extra_protected_keys)
            .context("Invalid pattern in replace.extra_protected_keys")
    }
}

#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("config.toml")
}

/// Load `.tagquest/config.toml`, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_database() -> PathBuf {
    Path::new(PROJECT_DIR).join("quests.sqlite3")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("tagquest-config-test-{label}-{id}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join(PROJECT_DIR)).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = make_temp_dir("project-default");
        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg, ProjectConfig::default());
        assert_eq!(
            cfg.storage.database_path(&root),
            root.join(".tagquest/quests.sqlite3")
        );
        assert!(cfg.replace.extra_protected_keys.is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = make_temp_dir("partial");
        std::fs::write(
            config_path(&root),
            "[replace]\nextra_protected_keys = [\"check_date(:.*)?\", \"wheelchair\"]\n",
        )
        .expect("write config");

        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg.storage, StorageConfig::default());
        let protected = cfg.replace.protected_keys().expect("valid patterns");
        assert!(protected.is_protected("wheelchair"));
        assert!(protected.is_protected("check_date:opening_hours"));
        assert!(protected.is_protected("addr:housenumber"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn absolute_database_path_is_kept() {
        let cfg: ProjectConfig =
            toml::from_str("[storage]\ndatabase = \"/var/lib/tq/quests.db\"\n").expect("parse");
        assert_eq!(
            cfg.storage.database_path(Path::new("/home/me/project")),
            PathBuf::from("/var/lib/tq/quests.db")
        );
    }

    #[test]
    fn malformed_config_reports_path() {
        let root = make_temp_dir("malformed");
        std::fs::write(config_path(&root), "[storage\n").expect("write config");
        let err = load_project_config(&root).expect_err("parse must fail");
        assert!(format!("{err:#}").contains("config.toml"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn invalid_extra_pattern_is_rejected() {
        let cfg = ReplaceConfig {
            extra_protected_keys: vec!["(".to_string()],
        };
        assert!(cfg.protected_keys().is_err());
    }
}
