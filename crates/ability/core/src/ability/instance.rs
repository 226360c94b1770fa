//! Runtime ability instances.
//!
//! An [`Ability`] is a template plus an ordered set of events. Every stat the
//! activation protocol reads is pre-summed here, and every mutation re-sums
//! from the template, so adding and then removing events returns exactly to
//! the template baseline.

use std::sync::Arc;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use super::event::{AbilityEvent, EventBehavior, StatModifiers};
use super::kind::{AbilityKind, SpawnTarget};
use super::resources::ResourceMap;
use super::template::{AbilityHooks, AbilityTemplate};
use crate::attribute::AttributeGraph;
use crate::config::SimConfig;
use crate::ids::{AbilityId, AttributeId, EventId, TemplateId};

bitflags! {
    /// Activation behaviours contributed by special events.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct AbilityFlags: u8 {
        const CHARGED   = 1 << 0;
        const CHANNELED = 1 << 1;
        const CONVERTS  = 1 << 2;
    }
}

type EventSlots = ArrayVec<Arc<AbilityEvent>, { SimConfig::MAX_EVENT_SLOTS }>;

#[derive(Clone, Debug, PartialEq)]
pub struct Ability {
    id: AbilityId,
    template: Arc<AbilityTemplate>,
    events: EventSlots,
    stats: StatModifiers,
    flags: AbilityFlags,
    kind: AbilityKind,
    conversion_pool: Option<AttributeId>,
    hooks: Arc<AbilityHooks>,
}

impl Ability {
    /// Builds an instance; duplicate event ids are ignored and overflow events are dropped.
    pub fn new(
        id: AbilityId,
        template: Arc<AbilityTemplate>,
        events: impl IntoIterator<Item = Arc<AbilityEvent>>,
    ) -> Self {
        let mut ability = Self {
            id,
            stats: template.stats.clone(),
            kind: template.kind,
            hooks: Arc::new(template.hooks.clone()),
            template,
            events: EventSlots::new(),
            flags: AbilityFlags::empty(),
            conversion_pool: None,
        };
        for event in events {
            if ability.has_event(event.id) {
                continue;
            }
            if ability.events.try_push(event).is_err() {
                tracing::warn!(ability = %id, "event slots exhausted; dropping remaining events");
                break;
            }
        }
        ability.rebuild();
        ability
    }

    pub fn id(&self) -> AbilityId {
        self.id
    }

    pub fn template(&self) -> &Arc<AbilityTemplate> {
        &self.template
    }

    pub fn template_id(&self) -> TemplateId {
        self.template.id
    }

    pub fn events(&self) -> impl Iterator<Item = &Arc<AbilityEvent>> {
        self.events.iter()
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|event| event.id).collect()
    }

    pub fn has_event(&self, id: EventId) -> bool {
        self.events.iter().any(|event| event.id == id)
    }

    /// Appends an event. Returns `false` for duplicates or when every slot is taken.
    pub fn add_event(&mut self, event: Arc<AbilityEvent>) -> bool {
        if self.has_event(event.id) || self.events.try_push(event).is_err() {
            return false;
        }
        self.rebuild();
        true
    }

    /// Removes an event. Returns `false` if the event was never attached.
    pub fn remove_event(&mut self, id: EventId) -> bool {
        let Some(position) = self.events.iter().position(|event| event.id == id) else {
            return false;
        };
        self.events.remove(position);
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        let mut stats = self.template.stats.clone();
        let mut hooks = self.template.hooks.clone();
        let mut flags = AbilityFlags::empty();
        let mut kind = self.template.kind;
        let mut pool = None;

        for event in &self.events {
            stats.accumulate(&event.modifiers);
            hooks.push(&event.behavior);
            match event.behavior {
                EventBehavior::Charged => flags |= AbilityFlags::CHARGED,
                EventBehavior::Channeled => flags |= AbilityFlags::CHANNELED,
                EventBehavior::TypeOverride(overridden) => kind = overridden,
                EventBehavior::ResourceConversion { pool: converted } => {
                    flags |= AbilityFlags::CONVERTS;
                    pool = Some(converted);
                }
                _ => {}
            }
        }

        self.stats = stats;
        self.hooks = Arc::new(hooks);
        self.flags = flags;
        self.kind = kind;
        self.conversion_pool = pool;
    }

    // ===== summed stats =====

    pub fn activation_time_ms(&self) -> i32 {
        self.stats.activation_time_ms.max(0)
    }

    pub fn lifetime_ms(&self) -> i32 {
        self.stats.lifetime_ms.max(0)
    }

    pub fn cooldown_ms(&self) -> i32 {
        self.stats.cooldown_ms.max(0)
    }

    pub fn range(&self) -> i32 {
        self.stats.range.max(0)
    }

    pub fn speed(&self) -> i32 {
        self.stats.speed.max(0)
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.stats.resources
    }

    pub fn requirements(&self) -> &ResourceMap {
        &self.stats.requirements
    }

    pub fn kind(&self) -> AbilityKind {
        self.kind
    }

    pub fn flags(&self) -> AbilityFlags {
        self.flags
    }

    pub fn is_charged(&self) -> bool {
        self.flags.contains(AbilityFlags::CHARGED)
    }

    pub fn is_channeled(&self) -> bool {
        self.flags.contains(AbilityFlags::CHANNELED)
    }

    /// Charged and channeled abilities track the held input.
    pub fn tracks_hold(&self) -> bool {
        self.flags
            .intersects(AbilityFlags::CHARGED | AbilityFlags::CHANNELED)
    }

    /// Completion needs a resolved target: explicitly required, or spawned on it.
    pub fn needs_target(&self) -> bool {
        self.template.requires_target || self.template.spawn_target == SpawnTarget::Target
    }

    pub fn conversion_pool(&self) -> Option<AttributeId> {
        self.conversion_pool
    }

    pub fn hooks(&self) -> &Arc<AbilityHooks> {
        &self.hooks
    }

    /// Activation time after the template's speed attribute is applied.
    pub fn scaled_activation_time(&self, attributes: &AttributeGraph) -> i32 {
        reduce_by_percent(
            self.activation_time_ms(),
            self.template.activation_speed_attribute,
            attributes,
        )
    }

    /// Cooldown after the template's cooldown-reduction attribute is applied.
    pub fn scaled_cooldown(&self, attributes: &AttributeGraph) -> i32 {
        reduce_by_percent(
            self.cooldown_ms(),
            self.template.cooldown_reduction_attribute,
            attributes,
        )
    }

    // ===== resource checks =====

    /// Every requirement threshold is met by the attribute's current level.
    pub fn meets_requirements(&self, attributes: &AttributeGraph) -> bool {
        self.stats.requirements.iter().all(|(attribute, threshold)| {
            attributes
                .level(attribute)
                .is_some_and(|level| level >= threshold as f32)
        })
    }

    pub fn has_resources(&self, attributes: &AttributeGraph) -> bool {
        match self.conversion_pool {
            Some(pool) => {
                let total = self.stats.resources.total() as f32;
                attributes.current(pool).is_some_and(|current| current >= total)
            }
            None => self.stats.resources.iter().all(|(attribute, cost)| {
                cost <= 0
                    || attributes
                        .current(attribute)
                        .is_some_and(|current| current >= cost as f32)
            }),
        }
    }

    /// Checks and pays the full cost in one step. Nothing is deducted on failure.
    pub fn try_consume_resources(&self, attributes: &mut AttributeGraph) -> bool {
        if !self.has_resources(attributes) {
            return false;
        }
        match self.conversion_pool {
            Some(pool) => {
                let total = self.stats.resources.total();
                if total > 0 {
                    attributes.consume(pool, total as f32);
                }
            }
            None => {
                for (attribute, cost) in self.stats.resources.iter() {
                    if cost > 0 {
                        attributes.consume(attribute, cost as f32);
                    }
                }
            }
        }
        true
    }
}

fn reduce_by_percent(ms: i32, attribute: Option<AttributeId>, attributes: &AttributeGraph) -> i32 {
    let percent = attribute
        .and_then(|id| attributes.final_value(id))
        .unwrap_or(0)
        .clamp(0, 100);
    (i64::from(ms) * i64::from(100 - percent) / 100) as i32
}
