//! Default content compiled into the binary.

use ability_core::{ContentRegistry, SimConfig};

use crate::loaders::{
    AbilityLoader, AttributeLoader, ConfigLoader, ContentBundle, EventLoader, LoadResult,
    LoadoutLoader, LoadoutSpec,
};

const ATTRIBUTES: &str = include_str!("../data/attributes.ron");
const ABILITIES: &str = include_str!("../data/abilities.ron");
const EVENTS: &str = include_str!("../data/events.ron");
const LOADOUT: &str = include_str!("../data/loadout.ron");
const CONFIG: &str = include_str!("../data/config.toml");

pub fn embedded_bundle() -> LoadResult<ContentBundle> {
    Ok(ContentBundle {
        attributes: AttributeLoader::parse(ATTRIBUTES)?,
        templates: AbilityLoader::parse(ABILITIES)?,
        events: EventLoader::parse(EVENTS)?,
    })
}

pub fn embedded_registry() -> LoadResult<ContentRegistry> {
    embedded_bundle()?.into_registry()
}

pub fn embedded_loadout() -> LoadResult<LoadoutSpec> {
    LoadoutLoader::parse(LOADOUT)
}

pub fn embedded_config() -> LoadResult<SimConfig> {
    ConfigLoader::parse(CONFIG)
}
