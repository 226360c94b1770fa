//! Content factory for building a registry from data files.

use std::path::{Path, PathBuf};

use ability_core::{ContentRegistry, SimConfig};

use crate::loaders::{
    AbilityLoader, AttributeLoader, ConfigLoader, ContentBundle, EventLoader, LoadResult,
    LoadoutLoader, LoadoutSpec,
};

/// Content factory that loads all ability content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── attributes.ron
/// ├── abilities.ron
/// ├── events.ron
/// └── loadout.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load simulation configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<SimConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load `attributes.ron`, `abilities.ron`, and `events.ron` without validating them.
    pub fn load_bundle(&self) -> LoadResult<ContentBundle> {
        Ok(ContentBundle {
            attributes: AttributeLoader::load(&self.data_dir.join("attributes.ron"))?,
            templates: AbilityLoader::load(&self.data_dir.join("abilities.ron"))?,
            events: EventLoader::load(&self.data_dir.join("events.ron"))?,
        })
    }

    pub fn load_registry(&self) -> LoadResult<ContentRegistry> {
        self.load_bundle()?.into_registry()
    }

    /// Load the starting loadout from `loadout.ron`; an absent file means an empty loadout.
    pub fn load_loadout(&self) -> LoadResult<LoadoutSpec> {
        let path = self.data_dir.join("loadout.ron");
        if !path.exists() {
            return Ok(LoadoutSpec::default());
        }
        LoadoutLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
