//! Waypoint path loader.

use std::path::Path;

use smart_script::WaypointRow;

use crate::loaders::{LoadResult, read_file};

/// Loads waypoint nodes from a RON file.
///
/// Example:
/// ```ron
/// [
///     (path_id: 1, point_id: 1, x: 10.0, y: 0.0, z: 0.0),
///     (path_id: 1, point_id: 2, x: 20.0, y: 0.0, z: 0.0, orientation: Some(1.57), delay_ms: 3000),
/// ]
/// ```
pub struct PathLoader;

impl PathLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<WaypointRow>> {
        let content = read_file(path)?;
        let rows: Vec<WaypointRow> = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse paths RON at {}: {}", path.display(), e))?;
        Ok(rows)
    }
}
