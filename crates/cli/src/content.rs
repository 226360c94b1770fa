//! Content selection: a data directory when configured, the embedded set otherwise.
use std::sync::Arc;

use ability_content::{
    ContentFactory, LoadoutSpec, embedded_config, embedded_loadout, embedded_registry,
};
use ability_core::{AttributeId, ContentRegistry, SimConfig};
use anyhow::Result;

use crate::config::CliConfig;

/// Resource whose depletion ends the duel.
const VITAL_ATTRIBUTE: &str = "health";

pub struct DuelContent {
    pub registry: Arc<ContentRegistry>,
    pub sim: SimConfig,
    pub loadout: LoadoutSpec,
    pub vital: Option<AttributeId>,
}

impl DuelContent {
    pub fn load(config: &CliConfig) -> Result<Self> {
        let (registry, sim, loadout) = match &config.data_dir {
            Some(dir) => {
                let factory = ContentFactory::new(dir);
                tracing::info!("Loading content from {}", factory.data_dir().display());
                (
                    factory.load_registry()?,
                    factory.load_config()?,
                    factory.load_loadout()?,
                )
            }
            None => (embedded_registry()?, embedded_config()?, embedded_loadout()?),
        };

        let vital = registry
            .attributes()
            .nodes()
            .find(|node| node.template.name == VITAL_ATTRIBUTE && node.template.is_resource())
            .map(|node| node.template.id);
        if vital.is_none() {
            tracing::warn!("No '{}' resource in content; nobody can die", VITAL_ATTRIBUTE);
        }

        Ok(Self {
            registry: Arc::new(registry),
            sim,
            loadout,
            vital,
        })
    }
}
