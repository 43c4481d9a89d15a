//! Content factory for building the rule catalog from data files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use game_core::EngineConfig;
use smart_script::{LoadReport, PathTable, RuleTable, ScriptCatalog, TableError};
use tracing::{info, warn};

use crate::loaders::{ConfigLoader, LoadResult, PathLoader, RuleLoader};

/// What validation left out of a catalog load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogReport {
    pub rules: LoadReport,
    pub paths: Vec<TableError>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.rules.is_clean() && self.paths.is_empty()
    }
}

/// Content factory that loads all rule content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── paths.ron        (optional)
/// └── rules/
///     ├── creatures.ron
///     └── timed_lists.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`, or defaults without one.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(EngineConfig::new());
        }
        ConfigLoader::load(&path)
    }

    /// Load and validate every rule file under `rules/`.
    pub fn load_rules(&self) -> LoadResult<(RuleTable, LoadReport)> {
        let rows = RuleLoader::load_dir(&self.data_dir.join("rules"))?;
        Ok(RuleTable::from_rows(rows))
    }

    /// Load and validate `paths.ron`; no file means no paths.
    pub fn load_paths(&self) -> LoadResult<(PathTable, Vec<TableError>)> {
        let path = self.data_dir.join("paths.ron");
        if !path.exists() {
            return Ok((PathTable::new(), Vec::new()));
        }
        Ok(PathTable::from_rows(PathLoader::load(&path)?))
    }

    /// Loads everything into a shareable catalog.
    ///
    /// Only unreadable files fail the load; rejected rows are reported.
    pub fn load_catalog(&self) -> LoadResult<(Arc<ScriptCatalog>, CatalogReport)> {
        let config = self.load_config()?;
        let (rules, rule_report) = self.load_rules()?;
        let (paths, path_errors) = self.load_paths()?;

        for warning in &rule_report.warnings {
            warn!(%warning, "rule content warning");
        }
        info!(
            rules = rule_report.accepted,
            rejected = rule_report.rejected.len(),
            paths = paths.len(),
            "rule catalog loaded"
        );

        let report = CatalogReport {
            rules: rule_report,
            paths: path_errors,
        };
        Ok((ScriptCatalog::new(rules, paths, config), report))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_script::ScriptType;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn catalog_loads_from_a_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "config.toml", "escort_check_interval_ms = 2500\n");
        write(
            temp_dir.path(),
            "rules/creatures.ron",
            r#"[
                (entry_or_guid: 100, event_type: 4, action_type: 11,
                 action_params: (5000, 0, 0, 0, 0, 0, 0), target_type: 2),
                (entry_or_guid: 100, id: 1, event_type: 4, event_phase_mask: 8192),
            ]"#,
        );
        write(
            temp_dir.path(),
            "paths.ron",
            r#"[
                (path_id: 1, point_id: 1, x: 10.0),
                (path_id: 1, point_id: 2, x: 20.0, delay_ms: 3000),
                (path_id: 1, point_id: 2, x: 30.0),
            ]"#,
        );

        let (catalog, report) = ContentFactory::new(temp_dir.path()).load_catalog().unwrap();

        assert_eq!(catalog.config.escort_check_interval_ms, 2500);
        assert_eq!(catalog.rules.rules_for(100, ScriptType::Creature).len(), 1);
        assert_eq!(catalog.paths.get(1).map(|p| p.len()), Some(2));
        assert_eq!(report.rules.rejected.len(), 1);
        assert_eq!(report.paths.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn optional_files_fall_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "rules/empty.ron", "[]");

        let factory = ContentFactory::new(temp_dir.path());
        let (catalog, report) = factory.load_catalog().unwrap();

        assert_eq!(catalog.config, EngineConfig::new());
        assert!(catalog.paths.is_empty());
        assert!(report.is_clean());
        assert_eq!(factory.data_dir(), temp_dir.path());
    }

    #[test]
    fn missing_rules_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ContentFactory::new(temp_dir.path()).load_catalog().is_err());
    }
}
