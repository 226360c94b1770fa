//! Ability template loader.

use std::path::Path;

use ability_core::AbilityTemplate;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Ability template structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityCatalogFile {
    pub templates: Vec<AbilityTemplate>,
}

/// Loader for ability templates from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    /// Load ability templates from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing the template list
    pub fn load(path: &Path) -> LoadResult<Vec<AbilityTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilityTemplate>> {
        let catalog: AbilityCatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability RON: {}", e))?;
        Ok(catalog.templates)
    }
}
