//! Waypoint paths used by escort and patrol actions.
use std::collections::BTreeMap;

use game_core::Position;
use tracing::error;

use crate::error::TableError;

/// One authored waypoint node.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WaypointRow {
    pub path_id: u32,
    pub point_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: Option<f32>,
    pub delay_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathNode {
    pub point_id: u32,
    pub position: Position,
    /// Whether the authored node fixes the facing on arrival.
    pub has_orientation: bool,
    pub delay_ms: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub id: u32,
    pub nodes: Vec<PathNode>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&PathNode> {
        self.nodes.get(index)
    }

    pub fn index_of(&self, point_id: u32) -> Option<usize> {
        self.nodes.iter().position(|n| n.point_id == point_id)
    }

    /// Node nearest to `from`, with its distance.
    pub fn closest_node(&self, from: &Position) -> Option<(usize, f32)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.position.distance(from)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// All loaded paths by id.
#[derive(Clone, Debug, Default)]
pub struct PathTable {
    paths: BTreeMap<u32, Path>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds paths from rows in file order.
    ///
    /// Point ids must increase strictly within a path; a node that breaks
    /// the order is skipped and reported.
    pub fn from_rows<I>(rows: I) -> (Self, Vec<TableError>)
    where
        I: IntoIterator<Item = WaypointRow>,
    {
        let mut table = Self::new();
        let mut rejected = Vec::new();
        for row in rows {
            if let Err(err) = table.push(row) {
                error!(%err, "waypoint rejected");
                rejected.push(err);
            }
        }
        (table, rejected)
    }

    pub fn push(&mut self, row: WaypointRow) -> Result<(), TableError> {
        let path = self.paths.entry(row.path_id).or_insert_with(|| Path {
            id: row.path_id,
            nodes: Vec::new(),
        });
        if let Some(last) = path.nodes.last() {
            if row.point_id <= last.point_id {
                return Err(TableError::PathOrder {
                    path: row.path_id,
                    point: row.point_id,
                    previous: last.point_id,
                });
            }
        }
        path.nodes.push(PathNode {
            point_id: row.point_id,
            position: Position::new(row.x, row.y, row.z, row.orientation.unwrap_or(0.0)),
            has_orientation: row.orientation.is_some(),
            delay_ms: row.delay_ms,
        });
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&Path> {
        self.paths.get(&id).filter(|p| !p.is_empty())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path_id: u32, point_id: u32, x: f32) -> WaypointRow {
        WaypointRow {
            path_id,
            point_id,
            x,
            ..WaypointRow::default()
        }
    }

    #[test]
    fn out_of_order_points_are_skipped() {
        let (table, rejected) =
            PathTable::from_rows([node(7, 1, 0.0), node(7, 2, 5.0), node(7, 2, 9.0), node(8, 1, 1.0)]);
        assert_eq!(
            rejected,
            vec![TableError::PathOrder {
                path: 7,
                point: 2,
                previous: 2
            }]
        );
        assert_eq!(table.get(7).map(Path::len), Some(2));
        assert_eq!(table.get(8).map(Path::len), Some(1));
    }

    #[test]
    fn closest_node_by_distance() {
        let (table, _) = PathTable::from_rows([node(1, 1, 0.0), node(1, 2, 10.0), node(1, 3, 20.0)]);
        let path = table.get(1);
        let closest = path.and_then(|p| p.closest_node(&Position::new(12.0, 0.0, 0.0, 0.0)));
        assert_eq!(closest.map(|(i, _)| i), Some(1));
    }
}
