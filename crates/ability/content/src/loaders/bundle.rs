//! Compiles loaded content into a registry.

use ability_core::{AbilityEvent, AbilityTemplate, AttributeTemplate, ContentRegistry};

use crate::loaders::LoadResult;

/// Raw content as loaded from files, before validation.
#[derive(Debug, Clone, Default)]
pub struct ContentBundle {
    pub attributes: Vec<AttributeTemplate>,
    pub templates: Vec<AbilityTemplate>,
    pub events: Vec<AbilityEvent>,
}

impl ContentBundle {
    /// Validates and compiles the bundle.
    ///
    /// Fails on attribute cycles and duplicate ids. Dangling attribute
    /// references are dropped with a warning.
    pub fn into_registry(self) -> LoadResult<ContentRegistry> {
        let counts = (self.attributes.len(), self.templates.len(), self.events.len());
        let registry = ContentRegistry::new(self.attributes, self.templates, self.events)
            .map_err(|e| anyhow::anyhow!("Invalid ability content: {}", e))?;
        tracing::info!(
            target: "ability::content",
            attributes = counts.0,
            templates = counts.1,
            events = counts.2,
            "content registry built"
        );
        Ok(registry)
    }
}
