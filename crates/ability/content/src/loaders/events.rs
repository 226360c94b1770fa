//! Ability event loader.

use std::path::Path;

use ability_core::AbilityEvent;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCatalog {
    pub events: Vec<AbilityEvent>,
}

/// Loader for ability events from RON files.
pub struct EventLoader;

impl EventLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilityEvent>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilityEvent>> {
        let catalog: EventCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse event RON: {}", e))?;
        Ok(catalog.events)
    }
}
