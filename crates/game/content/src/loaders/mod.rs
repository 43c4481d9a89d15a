//! Content loaders for reading rule data from files.
//!
//! This module converts RON/TOML files into the row and config types the
//! engine validates.

pub mod config;
pub mod factory;
pub mod paths;
pub mod rules;

pub use config::ConfigLoader;
pub use factory::{CatalogReport, ContentFactory};
pub use paths::PathLoader;
pub use rules::RuleLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
