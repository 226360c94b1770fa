//! Immutable authored content shared by every character.
//!
//! The registry is built once from loaded templates and handed out behind an
//! `Arc`. Construction validates ids, compiles the attribute schema (rejecting
//! dependency cycles), and strips references to attributes that do not exist.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::{Ability, AbilityEvent, AbilityTemplate, EventBehavior, HitAction, ResourceMap};
use crate::attribute::{AttributeSchema, AttributeTemplate, SchemaError};
use crate::catalog::CatalogError;
use crate::error::{ErrorSeverity, SimError};
use crate::ids::{AbilityId, AttributeId, EventId, TemplateId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("ability template {0} is defined more than once")]
    DuplicateTemplate(TemplateId),

    #[error("ability event {0} is defined more than once")]
    DuplicateEvent(EventId),
}

impl SimError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(inner) => inner.error_code(),
            Self::DuplicateTemplate(_) => "REGISTRY_DUPLICATE_TEMPLATE",
            Self::DuplicateEvent(_) => "REGISTRY_DUPLICATE_EVENT",
        }
    }
}

#[derive(Debug)]
pub struct ContentRegistry {
    attributes: Arc<AttributeSchema>,
    templates: BTreeMap<TemplateId, Arc<AbilityTemplate>>,
    events: BTreeMap<EventId, Arc<AbilityEvent>>,
    #[cfg(feature = "serde")]
    digest: [u8; 32],
}

impl ContentRegistry {
    pub fn new(
        attributes: Vec<AttributeTemplate>,
        templates: Vec<AbilityTemplate>,
        events: Vec<AbilityEvent>,
    ) -> Result<Self, RegistryError> {
        #[cfg(feature = "serde")]
        let attribute_bytes = bincode::serialize(&attributes).unwrap_or_default();

        let schema = AttributeSchema::build(attributes)?;

        let mut template_map = BTreeMap::new();
        for mut template in templates {
            let id = template.id;
            strip_template(&schema, &mut template);
            if template_map.insert(id, template).is_some() {
                return Err(RegistryError::DuplicateTemplate(id));
            }
        }

        let mut event_map = BTreeMap::new();
        for mut event in events {
            let id = event.id;
            strip_event(&schema, &mut event);
            if event_map.insert(id, event).is_some() {
                return Err(RegistryError::DuplicateEvent(id));
            }
        }

        #[cfg(feature = "serde")]
        let digest = compute_digest(&attribute_bytes, &template_map, &event_map);

        Ok(Self {
            attributes: Arc::new(schema),
            templates: template_map
                .into_iter()
                .map(|(id, template)| (id, Arc::new(template)))
                .collect(),
            events: event_map
                .into_iter()
                .map(|(id, event)| (id, Arc::new(event)))
                .collect(),
            #[cfg(feature = "serde")]
            digest,
        })
    }

    pub fn attributes(&self) -> &Arc<AttributeSchema> {
        &self.attributes
    }

    pub fn template(&self, id: TemplateId) -> Option<&Arc<AbilityTemplate>> {
        self.templates.get(&id)
    }

    pub fn event(&self, id: EventId) -> Option<&Arc<AbilityEvent>> {
        self.events.get(&id)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Arc<AbilityTemplate>> {
        self.templates.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &Arc<AbilityEvent>> {
        self.events.values()
    }

    /// SHA-256 over the canonical bincode encoding of all content.
    ///
    /// Peers compare digests before accepting a full-state sync.
    #[cfg(feature = "serde")]
    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    /// Builds an ability instance from registry ids.
    pub fn instantiate(
        &self,
        id: AbilityId,
        template: TemplateId,
        events: &[EventId],
    ) -> Result<Ability, CatalogError> {
        let template = self
            .template(template)
            .ok_or(CatalogError::UnknownTemplate(template))?;
        let events = events
            .iter()
            .map(|&event| {
                self.event(event)
                    .cloned()
                    .ok_or(CatalogError::UnknownEvent(event))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ability::new(id, Arc::clone(template), events))
    }
}

fn strip_costs(schema: &AttributeSchema, owner: &str, map: &mut ResourceMap) {
    for dropped in map.retain_keys(|attribute| schema.contains(attribute)) {
        tracing::warn!(owner, attribute = %dropped, "unknown attribute in cost table; dropped");
    }
}

fn strip_optional(schema: &AttributeSchema, owner: &str, slot: &mut Option<AttributeId>) {
    if let Some(attribute) = *slot {
        if !schema.contains(attribute) {
            tracing::warn!(owner, attribute = %attribute, "unknown scaling attribute; ignored");
            *slot = None;
        }
    }
}

fn strip_template(schema: &AttributeSchema, template: &mut AbilityTemplate) {
    let owner = template.name.clone();
    strip_costs(schema, &owner, &mut template.stats.resources);
    strip_costs(schema, &owner, &mut template.stats.requirements);
    strip_optional(schema, &owner, &mut template.activation_speed_attribute);
    strip_optional(schema, &owner, &mut template.cooldown_reduction_attribute);
    for action in &template.hooks.hit {
        warn_unknown_hit(schema, &owner, action);
    }
}

fn strip_event(schema: &AttributeSchema, event: &mut AbilityEvent) {
    let owner = event.name.clone();
    strip_costs(schema, &owner, &mut event.modifiers.resources);
    strip_costs(schema, &owner, &mut event.modifiers.requirements);
    match &event.behavior {
        EventBehavior::ResourceConversion { pool } if !schema.contains(*pool) => {
            tracing::warn!(owner, pool = %pool, "conversion pool is not a known attribute");
        }
        EventBehavior::Hit(action) => warn_unknown_hit(schema, &owner, action),
        _ => {}
    }
}

fn warn_unknown_hit(schema: &AttributeSchema, owner: &str, action: &HitAction) {
    let (attribute, _) = action.delta();
    if !schema.contains(attribute) {
        tracing::warn!(owner, attribute = %attribute, "hit hook targets an unknown attribute");
    }
}

#[cfg(feature = "serde")]
fn compute_digest(
    attributes: &[u8],
    templates: &BTreeMap<TemplateId, AbilityTemplate>,
    events: &BTreeMap<EventId, AbilityEvent>,
) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(attributes);
    for template in templates.values() {
        if let Ok(bytes) = bincode::serialize(template) {
            hasher.update(&bytes);
        }
    }
    for event in events.values() {
        if let Ok(bytes) = bincode::serialize(event) {
            hasher.update(&bytes);
        }
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::StatModifiers;
    use crate::attribute::{Formula, ResourceSpec};

    const MANA: AttributeId = AttributeId(1);

    fn attributes() -> Vec<AttributeTemplate> {
        vec![AttributeTemplate::new(MANA, "mana", 50).resource(ResourceSpec::FULL)]
    }

    fn bolt() -> AbilityTemplate {
        AbilityTemplate::new(TemplateId(1), "bolt").with_stats(StatModifiers {
            resources: ResourceMap::new().with(MANA, 10).with(AttributeId(77), 4),
            ..StatModifiers::default()
        })
    }

    #[test]
    fn strips_unknown_cost_attributes() {
        let registry = ContentRegistry::new(attributes(), vec![bolt()], vec![]).unwrap();
        let template = registry.template(TemplateId(1)).unwrap();
        assert_eq!(template.stats.resources.len(), 1);
        assert_eq!(template.stats.resources.get(MANA), 10);
    }

    #[test]
    fn rejects_cycles_and_duplicates() {
        let cyclic = vec![
            AttributeTemplate::new(AttributeId(1), "a", 0).child(AttributeId(2), Formula::IDENTITY),
            AttributeTemplate::new(AttributeId(2), "b", 0).child(AttributeId(1), Formula::IDENTITY),
        ];
        let err = ContentRegistry::new(cyclic, vec![], vec![]).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_CYCLE");

        let err = ContentRegistry::new(attributes(), vec![bolt(), bolt()], vec![]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTemplate(TemplateId(1)));
    }

    #[test]
    fn instantiate_reports_unknown_ids() {
        let registry = ContentRegistry::new(attributes(), vec![bolt()], vec![]).unwrap();
        assert!(registry.instantiate(AbilityId(1), TemplateId(1), &[]).is_ok());
        assert_eq!(
            registry.instantiate(AbilityId(1), TemplateId(9), &[]).unwrap_err(),
            CatalogError::UnknownTemplate(TemplateId(9))
        );
        assert_eq!(
            registry.instantiate(AbilityId(1), TemplateId(1), &[EventId(3)]).unwrap_err(),
            CatalogError::UnknownEvent(EventId(3))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn digest_tracks_content() {
        let a = ContentRegistry::new(attributes(), vec![bolt()], vec![]).unwrap();
        let b = ContentRegistry::new(attributes(), vec![bolt()], vec![]).unwrap();
        let c = ContentRegistry::new(attributes(), vec![], vec![]).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(hex::encode(a.digest()).len(), 64);
    }
}
