//! Attribute schema loader.

use std::path::Path;

use ability_core::AttributeTemplate;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Attribute schema structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeCatalog {
    pub attributes: Vec<AttributeTemplate>,
}

/// Loader for attribute templates from RON files.
pub struct AttributeLoader;

impl AttributeLoader {
    /// Load attribute templates from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<AttributeTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AttributeTemplate>> {
        let catalog: AttributeCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse attribute RON: {}", e))?;
        Ok(catalog.attributes)
    }
}
