//! Ability events: learnable modifiers that extend an ability template.
//!
//! Each event carries stat deltas plus exactly one [`EventBehavior`]. The set of
//! behaviours is closed; new kinds are added here and matched exhaustively
//! wherever hooks are dispatched.

use super::kind::AbilityKind;
use super::resources::ResourceMap;
use crate::ids::{AttributeId, EventId};

/// Stat deltas shared by templates and events. Times are milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatModifiers {
    pub activation_time_ms: i32,
    pub lifetime_ms: i32,
    pub cooldown_ms: i32,
    pub range: i32,
    pub speed: i32,
    pub resources: ResourceMap,
    pub requirements: ResourceMap,
}

impl StatModifiers {
    pub fn accumulate(&mut self, other: &StatModifiers) {
        self.activation_time_ms = self.activation_time_ms.saturating_add(other.activation_time_ms);
        self.lifetime_ms = self.lifetime_ms.saturating_add(other.lifetime_ms);
        self.cooldown_ms = self.cooldown_ms.saturating_add(other.cooldown_ms);
        self.range = self.range.saturating_add(other.range);
        self.speed = self.speed.saturating_add(other.speed);
        self.resources.merge(&other.resources);
        self.requirements.merge(&other.requirements);
    }
}

/// Lifecycle phase a hook runs in.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventPhase {
    PreSpawn,
    Spawn,
    Tick,
    Hit,
    Destroy,
}

/// Runs every effect tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickAction {
    /// Moves along the heading at the object's speed.
    Advance,
    /// Changes speed by `per_second` units per second.
    Accelerate { per_second: i32 },
}

/// Runs when an effect object collides with a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitAction {
    Damage {
        attribute: AttributeId,
        amount: i32,
        hits_consumed: i32,
    },
    Restore {
        attribute: AttributeId,
        amount: i32,
        hits_consumed: i32,
    },
}

impl HitAction {
    pub fn hits_consumed(&self) -> i32 {
        match *self {
            HitAction::Damage { hits_consumed, .. } | HitAction::Restore { hits_consumed, .. } => {
                hits_consumed
            }
        }
    }

    /// Signed delta applied to the hit target's resource.
    pub fn delta(&self) -> (AttributeId, i32) {
        match *self {
            HitAction::Damage {
                attribute, amount, ..
            } => (attribute, amount.saturating_neg()),
            HitAction::Restore {
                attribute, amount, ..
            } => (attribute, amount),
        }
    }
}

/// Runs before the primary object is activated; may add siblings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PreSpawnAction {
    /// Adds `count` siblings with headings jittered within `spread_degrees`.
    Multiply { count: u32, spread_degrees: f32 },
}

/// Runs once the full member set is known, before activation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpawnAction {
    /// Offsets every member's position by up to `radius`.
    Scatter { radius: f32 },
    /// Spreads member headings evenly across `spread_degrees`.
    Fan { spread_degrees: f32 },
}

/// Runs when an effect object expires or is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DestroyAction {
    Burst {
        attribute: AttributeId,
        amount: i32,
        radius: i32,
    },
}

/// The one thing an event does besides adjusting stats.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventBehavior {
    /// Stat deltas only.
    #[default]
    Modifier,
    PreSpawn(PreSpawnAction),
    Spawn(SpawnAction),
    Tick(TickAction),
    Hit(HitAction),
    Destroy(DestroyAction),
    /// Activation completes only after the input is released.
    Charged,
    /// Spawns and pays every tick while held.
    Channeled,
    /// Replaces the template's classification.
    TypeOverride(AbilityKind),
    /// Pays the total cost from a single pool.
    ResourceConversion { pool: AttributeId },
}

impl EventBehavior {
    pub fn phase(&self) -> Option<EventPhase> {
        match self {
            EventBehavior::PreSpawn(_) => Some(EventPhase::PreSpawn),
            EventBehavior::Spawn(_) => Some(EventPhase::Spawn),
            EventBehavior::Tick(_) => Some(EventPhase::Tick),
            EventBehavior::Hit(_) => Some(EventPhase::Hit),
            EventBehavior::Destroy(_) => Some(EventPhase::Destroy),
            EventBehavior::Modifier
            | EventBehavior::Charged
            | EventBehavior::Channeled
            | EventBehavior::TypeOverride(_)
            | EventBehavior::ResourceConversion { .. } => None,
        }
    }
}

/// Authored ability event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityEvent {
    pub id: EventId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: StatModifiers,
    #[cfg_attr(feature = "serde", serde(default))]
    pub behavior: EventBehavior,
}

impl AbilityEvent {
    pub fn new(id: EventId, name: impl Into<String>, behavior: EventBehavior) -> Self {
        Self {
            id,
            name: name.into(),
            modifiers: StatModifiers::default(),
            behavior,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: StatModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn phase(&self) -> Option<EventPhase> {
        self.behavior.phase()
    }
}
