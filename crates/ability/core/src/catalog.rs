//! Per-character ability knowledge.
//!
//! A character knows *base* content (templates and events it has learned) and
//! owns *abilities* (instances crafted from that content). Crafting is only
//! allowed from known base content and within the template's event slots.

use std::collections::{BTreeMap, BTreeSet};

use crate::ability::{Ability, EventPhase};
use crate::error::{ErrorSeverity, SimError};
use crate::ids::{AbilityId, EventId, TemplateId};
use crate::registry::ContentRegistry;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("ability template {0} does not exist")]
    UnknownTemplate(TemplateId),

    #[error("ability event {0} does not exist")]
    UnknownEvent(EventId),

    #[error("template {0} has not been learned")]
    TemplateNotKnown(TemplateId),

    #[error("event {0} has not been learned")]
    EventNotKnown(EventId),

    #[error("template allows {slots} events, {requested} requested")]
    TooManyEvents { slots: u8, requested: usize },

    #[error("ability {0} already exists")]
    AbilityExists(AbilityId),
}

impl SimError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownTemplate(_) | Self::UnknownEvent(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTemplate(_) => "CATALOG_UNKNOWN_TEMPLATE",
            Self::UnknownEvent(_) => "CATALOG_UNKNOWN_EVENT",
            Self::TemplateNotKnown(_) => "CATALOG_TEMPLATE_NOT_KNOWN",
            Self::EventNotKnown(_) => "CATALOG_EVENT_NOT_KNOWN",
            Self::TooManyEvents { .. } => "CATALOG_TOO_MANY_EVENTS",
            Self::AbilityExists(_) => "CATALOG_ABILITY_EXISTS",
        }
    }
}

/// What a single `learn_base_abilities` call added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Learned {
    pub templates: Vec<TemplateId>,
    pub events: Vec<EventId>,
}

impl Learned {
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() && self.events.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AbilityCatalog {
    known_templates: BTreeSet<TemplateId>,
    known_events: BTreeSet<EventId>,
    events_by_phase: BTreeMap<EventPhase, BTreeSet<EventId>>,
    abilities: BTreeMap<AbilityId, Ability>,
}

impl AbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records templates and events as known. Ids missing from the registry are skipped.
    pub fn learn_base_abilities(
        &mut self,
        registry: &ContentRegistry,
        templates: impl IntoIterator<Item = TemplateId>,
        events: impl IntoIterator<Item = EventId>,
    ) -> Learned {
        let mut learned = Learned::default();
        for id in templates {
            if registry.template(id).is_none() {
                tracing::warn!(template = %id, "cannot learn unknown template");
                continue;
            }
            if self.known_templates.insert(id) {
                learned.templates.push(id);
            }
        }
        for id in events {
            let Some(event) = registry.event(id) else {
                tracing::warn!(event = %id, "cannot learn unknown event");
                continue;
            };
            if self.known_events.insert(id) {
                if let Some(phase) = event.phase() {
                    self.events_by_phase.entry(phase).or_default().insert(id);
                }
                learned.events.push(id);
            }
        }
        learned
    }

    pub fn knows_template(&self, id: TemplateId) -> bool {
        self.known_templates.contains(&id)
    }

    pub fn knows_event(&self, id: EventId) -> bool {
        self.known_events.contains(&id)
    }

    pub fn knows_ability(&self, id: AbilityId) -> bool {
        self.abilities.contains_key(&id)
    }

    pub fn known_templates(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.known_templates.iter().copied()
    }

    pub fn known_events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.known_events.iter().copied()
    }

    /// Known events that hook into `phase`.
    pub fn events_in_phase(&self, phase: EventPhase) -> impl Iterator<Item = EventId> + '_ {
        self.events_by_phase
            .get(&phase)
            .into_iter()
            .flat_map(|events| events.iter().copied())
    }

    /// Adds or replaces an ability instance. Returns the instance it replaced.
    pub fn learn_ability(&mut self, ability: Ability) -> Option<Ability> {
        self.abilities.insert(ability.id(), ability)
    }

    pub fn remove_ability(&mut self, id: AbilityId) -> Option<Ability> {
        self.abilities.remove(&id)
    }

    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(&id)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Crafts a new ability from learned content.
    pub fn craft_ability(
        &mut self,
        registry: &ContentRegistry,
        id: AbilityId,
        template: TemplateId,
        events: &[EventId],
    ) -> Result<&Ability, CatalogError> {
        if self.abilities.contains_key(&id) {
            return Err(CatalogError::AbilityExists(id));
        }
        let authored = registry
            .template(template)
            .ok_or(CatalogError::UnknownTemplate(template))?;
        if !self.knows_template(template) {
            return Err(CatalogError::TemplateNotKnown(template));
        }
        let distinct: BTreeSet<EventId> = events.iter().copied().collect();
        if distinct.len() > usize::from(authored.additional_event_slots) {
            return Err(CatalogError::TooManyEvents {
                slots: authored.additional_event_slots,
                requested: distinct.len(),
            });
        }
        if let Some(&unknown) = events.iter().find(|event| !self.knows_event(**event)) {
            return Err(CatalogError::EventNotKnown(unknown));
        }

        let ability = registry.instantiate(id, template, events)?;
        Ok(self.abilities.entry(id).or_insert(ability))
    }

    /// Forgets everything. Used before applying a full-state sync.
    pub fn clear(&mut self) {
        self.known_templates.clear();
        self.known_events.clear();
        self.events_by_phase.clear();
        self.abilities.clear();
    }
}
