use super::event::{
    DestroyAction, EventBehavior, HitAction, PreSpawnAction, SpawnAction, StatModifiers,
    TickAction,
};
use super::kind::{AbilityKind, SpawnTarget};
use crate::ids::{AttributeId, TemplateId};

/// Per-phase hook lists, in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityHooks {
    pub pre_spawn: Vec<PreSpawnAction>,
    pub spawn: Vec<SpawnAction>,
    pub tick: Vec<TickAction>,
    pub hit: Vec<HitAction>,
    pub destroy: Vec<DestroyAction>,
}

impl AbilityHooks {
    /// Appends the hook carried by `behavior`; non-phase behaviours are ignored.
    pub fn push(&mut self, behavior: &EventBehavior) {
        match behavior {
            EventBehavior::PreSpawn(action) => self.pre_spawn.push(*action),
            EventBehavior::Spawn(action) => self.spawn.push(*action),
            EventBehavior::Tick(action) => self.tick.push(*action),
            EventBehavior::Hit(action) => self.hit.push(*action),
            EventBehavior::Destroy(action) => self.destroy.push(*action),
            EventBehavior::Modifier
            | EventBehavior::Charged
            | EventBehavior::Channeled
            | EventBehavior::TypeOverride(_)
            | EventBehavior::ResourceConversion { .. } => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pre_spawn.is_empty()
            && self.spawn.is_empty()
            && self.tick.is_empty()
            && self.hit.is_empty()
            && self.destroy.is_empty()
    }
}

/// Authored, immutable ability definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityTemplate {
    pub id: TemplateId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: StatModifiers,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: AbilityKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_target: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spawn_target: SpawnTarget,
    /// Characters an effect object may hit before it is destroyed.
    #[cfg_attr(feature = "serde", serde(default = "default_hit_count"))]
    pub hit_count: i32,
    /// Events a crafted instance of this template may carry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub additional_event_slots: u8,
    /// Percentage attribute shortening activation time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_speed_attribute: Option<AttributeId>,
    /// Percentage attribute shortening cooldowns.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_reduction_attribute: Option<AttributeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hooks: AbilityHooks,
}

#[cfg(feature = "serde")]
fn default_hit_count() -> i32 {
    1
}

impl AbilityTemplate {
    pub fn new(id: TemplateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stats: StatModifiers::default(),
            kind: AbilityKind::General,
            requires_target: false,
            spawn_target: SpawnTarget::Forward,
            hit_count: 1,
            additional_event_slots: 0,
            activation_speed_attribute: None,
            cooldown_reduction_attribute: None,
            hooks: AbilityHooks::default(),
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: StatModifiers) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: AbilityKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_spawn_target(mut self, spawn_target: SpawnTarget) -> Self {
        self.spawn_target = spawn_target;
        self
    }

    #[must_use]
    pub fn with_event_slots(mut self, slots: u8) -> Self {
        self.additional_event_slots = slots;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: AbilityHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Every attribute id the template reads or pays from.
    pub fn referenced_attributes(&self) -> impl Iterator<Item = AttributeId> + '_ {
        self.stats
            .resources
            .keys()
            .chain(self.stats.requirements.keys())
            .chain(self.activation_speed_attribute)
            .chain(self.cooldown_reduction_attribute)
    }
}
