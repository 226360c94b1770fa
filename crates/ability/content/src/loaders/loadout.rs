//! Starting loadout loader.

use std::path::Path;

use ability_core::{
    AbilityId, ActivationObserver, CatalogError, CharacterSim, EventId, TemplateId,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One ability crafted when the loadout is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftSpec {
    pub id: AbilityId,
    pub template: TemplateId,
    #[serde(default)]
    pub events: Vec<EventId>,
}

/// Known base content plus crafted abilities a new character starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutSpec {
    #[serde(default)]
    pub templates: Vec<TemplateId>,
    #[serde(default)]
    pub events: Vec<EventId>,
    #[serde(default)]
    pub abilities: Vec<CraftSpec>,
}

impl LoadoutSpec {
    /// Teaches the base content and crafts every listed ability.
    ///
    /// Returns the number of abilities crafted. Stops at the first craft that fails.
    pub fn apply(
        &self,
        sim: &mut CharacterSim,
        observer: &mut dyn ActivationObserver,
    ) -> Result<usize, CatalogError> {
        sim.learn_base_abilities(self.templates.iter().copied(), self.events.iter().copied());
        for craft in &self.abilities {
            sim.craft_ability(craft.id, craft.template, &craft.events, observer)?;
        }
        Ok(self.abilities.len())
    }
}

/// Loader for loadouts from RON files.
pub struct LoadoutLoader;

impl LoadoutLoader {
    pub fn load(path: &Path) -> LoadResult<LoadoutSpec> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<LoadoutSpec> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse loadout RON: {}", e))
    }
}
