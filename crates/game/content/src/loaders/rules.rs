//! Rule row loader.

use std::path::{Path, PathBuf};

use smart_script::SmartScriptRow;
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Loads positional rule rows from RON files.
///
/// File format: a list of rows; columns left out take the row defaults.
///
/// Example:
/// ```ron
/// [
///     // wolf: cast 5000 at the victim on aggro
///     (entry_or_guid: 100, event_type: 4, action_type: 11,
///      action_params: (5000, 0, 0, 0, 0, 0, 0), target_type: 2),
/// ]
/// ```
pub struct RuleLoader;

impl RuleLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<SmartScriptRow>> {
        let content = read_file(path)?;
        let rows: Vec<SmartScriptRow> = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules RON at {}: {}", path.display(), e))?;
        debug!(path = %path.display(), rows = rows.len(), "rule file loaded");
        Ok(rows)
    }

    /// Loads every `.ron` file in `dir`, in file name order.
    pub fn load_dir(dir: &Path) -> LoadResult<Vec<SmartScriptRow>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read rules directory {}: {}", dir.display(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();

        let mut rows = Vec::new();
        for file in files {
            rows.extend(Self::load(&file)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_script::{ActionKind, EventKind, ScriptType, TargetKind};
    use tempfile::TempDir;

    const WOLF: &str = r#"[
        (entry_or_guid: 100, event_type: 4, action_type: 11,
         action_params: (5000, 0, 0, 0, 0, 0, 0), target_type: 2,
         comment: "wolf - on aggro - cast bite on victim"),
    ]"#;

    #[test]
    fn omitted_columns_are_zero() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wolf.ron");
        std::fs::write(&path, WOLF).unwrap();

        let rows = RuleLoader::load(&path).unwrap();

        let expected = SmartScriptRow::new(100, ScriptType::Creature, 0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Cast, &[5000])
            .target(TargetKind::Victim, &[])
            .comment("wolf - on aggro - cast bite on victim");
        assert_eq!(rows, vec![expected]);
    }

    #[test]
    fn directory_files_load_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("b.ron"), "[(entry_or_guid: 2)]").unwrap();
        std::fs::write(temp_dir.path().join("a.ron"), "[(entry_or_guid: 1)]").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "not rules").unwrap();

        let rows = RuleLoader::load_dir(temp_dir.path()).unwrap();

        let entries: Vec<i64> = rows.iter().map(|r| r.entry_or_guid).collect();
        assert_eq!(entries, vec![1, 2]);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.ron");
        std::fs::write(&path, "[(entry_or_guid: \"wolf\")]").unwrap();

        let err = RuleLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
