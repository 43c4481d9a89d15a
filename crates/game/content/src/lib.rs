//! Data-driven content for the rule engine.
//!
//! Rules, waypoint paths and engine tuning live in data files next to the
//! host:
//! - Rule rows (RON, one or more files under `rules/`)
//! - Waypoint paths (RON, `paths.ron`)
//! - Engine configuration (TOML, `config.toml`)
//!
//! Loaders only parse; validation is the job of [`smart_script::RuleTable`]
//! and [`smart_script::PathTable`], and a bad row never fails a load.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogReport, ConfigLoader, ContentFactory, LoadResult, PathLoader, RuleLoader};
