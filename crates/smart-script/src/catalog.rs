//! Shared, read-only script content for one map.
use std::sync::Arc;

use game_core::EngineConfig;

use crate::table::RuleTable;
use crate::waypoint::PathTable;

/// Rules, paths and tunables every agent on a map reads from.
#[derive(Clone, Debug, Default)]
pub struct ScriptCatalog {
    pub rules: RuleTable,
    pub paths: PathTable,
    pub config: EngineConfig,
}

impl ScriptCatalog {
    pub fn new(rules: RuleTable, paths: PathTable, config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            rules,
            paths,
            config,
        })
    }
}
